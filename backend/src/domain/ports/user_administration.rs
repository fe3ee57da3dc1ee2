//! Driving port for account administration.

use async_trait::async_trait;

use crate::domain::{Error, Principal, RoleId, RoleName, UserId};

/// Account as listed to administrators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub principal: Principal,
    /// `None` when the role row is gone.
    pub role_name: Option<RoleName>,
}

/// Raw account creation input; validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccountRequest {
    pub username: String,
    pub password: String,
    pub role_id: RoleId,
}

/// All operations act on behalf of `actor`, who must hold `ManageUsers`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAdministration: Send + Sync {
    async fn list_accounts(&self, actor: &Principal) -> Result<Vec<AccountSummary>, Error>;

    async fn create_account(
        &self,
        actor: &Principal,
        request: NewAccountRequest,
    ) -> Result<AccountSummary, Error>;

    /// Fails with `invalid_self_operation` when `target` is the actor.
    async fn delete_account(&self, actor: &Principal, target: &UserId) -> Result<(), Error>;

    async fn reset_password(
        &self,
        actor: &Principal,
        target: &UserId,
        new_password: String,
    ) -> Result<(), Error>;

    async fn assign_role(
        &self,
        actor: &Principal,
        target: &UserId,
        role_id: RoleId,
    ) -> Result<AccountSummary, Error>;
}
