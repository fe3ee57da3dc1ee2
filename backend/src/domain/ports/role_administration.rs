//! Driving port for role and capability administration.

use async_trait::async_trait;

use crate::domain::{CapabilitySet, Error, Principal, RoleEntry, RoleId};

/// All operations act on behalf of `actor`, who must hold `ManageUsers`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleAdministration: Send + Sync {
    async fn list_roles(&self, actor: &Principal) -> Result<Vec<RoleEntry>, Error>;

    /// Create a role with no capability row (deny-all).
    async fn create_role(&self, actor: &Principal, name: String) -> Result<RoleEntry, Error>;

    /// Create or replace the role's capability row.
    async fn update_capabilities(
        &self,
        actor: &Principal,
        role_id: RoleId,
        capabilities: CapabilitySet,
    ) -> Result<RoleEntry, Error>;

    /// Fails with `conflict` while any account holds the role.
    async fn delete_role(&self, actor: &Principal, role_id: RoleId) -> Result<(), Error>;
}
