//! Port abstraction for roles and their capability rows.
use async_trait::async_trait;

use crate::domain::{CapabilitySet, Role, RoleEntry, RoleId, RoleName};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by role repository adapters.
    pub enum RolePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "role repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "role repository query failed: {message}",
        /// Another role already uses the name.
        DuplicateName { name: String } => "role already exists: {name}",
        /// The role is still assigned to at least one account.
        InUse { role_id: u32 } => "role {role_id} is assigned to users",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Every role with its capability row, ordered by id.
    async fn list(&self) -> Result<Vec<RoleEntry>, RolePersistenceError>;

    async fn find_by_id(&self, id: RoleId) -> Result<Option<RoleEntry>, RolePersistenceError>;

    async fn find_by_name(&self, name: &RoleName)
    -> Result<Option<RoleEntry>, RolePersistenceError>;

    /// Create a role, optionally with an initial capability row.
    async fn create(
        &self,
        name: &RoleName,
        capabilities: Option<CapabilitySet>,
    ) -> Result<Role, RolePersistenceError>;

    /// Create or replace the role's capability row; `false` when the role is missing.
    async fn set_capabilities(
        &self,
        id: RoleId,
        capabilities: CapabilitySet,
    ) -> Result<bool, RolePersistenceError>;

    /// Remove a role; `false` when it did not exist, `InUse` while referenced.
    async fn delete(&self, id: RoleId) -> Result<bool, RolePersistenceError>;
}
