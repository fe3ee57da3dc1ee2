//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{PasswordHash, RoleId, UserAccount, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the username.
        DuplicateUsername { username: String } => "username already exists: {username}",
        /// The referenced role does not exist.
        UnknownRole { role_id: u32 } => "role {role_id} does not exist",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails on duplicate username or unknown role.
    async fn create(&self, account: &UserAccount) -> Result<(), UserPersistenceError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Fetch an account by exact username.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Every account, ordered by username.
    async fn list(&self) -> Result<Vec<UserAccount>, UserPersistenceError>;

    /// Remove an account; `false` when it did not exist.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;

    /// Replace the stored credential; `false` when the account does not exist.
    async fn update_password(
        &self,
        id: &UserId,
        password: &PasswordHash,
    ) -> Result<bool, UserPersistenceError>;

    /// Reassign the account's role; `false` when the account does not exist.
    async fn update_role(&self, id: &UserId, role_id: RoleId)
    -> Result<bool, UserPersistenceError>;
}
