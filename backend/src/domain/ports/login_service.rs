//! Driving port for login and session-resolution use-cases.
//!
//! Inbound adapters call it to authenticate credentials and to turn a
//! session's stored user id back into a principal, without importing the
//! backing repositories.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, Principal, UserId};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated principal.
    ///
    /// Every failure is the same `unauthorized` error.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Principal, Error>;

    /// Resolve a session's user id. `None` when the account no longer exists.
    async fn resolve(&self, user_id: &UserId) -> Result<Option<Principal>, Error>;
}
