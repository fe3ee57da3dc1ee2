//! Login and session resolution backed by the user repository.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{LoginService, PasswordHasher, UserPersistenceError, UserRepository};
use crate::domain::{
    Error, INVALID_CREDENTIALS_MESSAGE, LoginCredentials, PasswordHash, Principal, UserId,
    Username, run_blocking,
};

const DUMMY_PASSWORD: &str = "timing-equaliser";

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateUsername { username } => {
            Error::conflict(format!("Username '{username}' already exists"))
        }
        UserPersistenceError::UnknownRole { role_id } => {
            Error::not_found(format!("Role {role_id} not found"))
        }
    }
}

/// [`LoginService`] implementation.
///
/// Unknown usernames still pay for one verification against a dummy digest,
/// so response timing does not reveal whether an account exists.
#[derive(Clone)]
pub struct IdentityService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    dummy: Option<PasswordHash>,
}

impl<U, H> IdentityService<U, H>
where
    H: PasswordHasher,
{
    pub fn new(users: Arc<U>, hasher: Arc<H>) -> Self {
        let dummy = hasher.hash(DUMMY_PASSWORD).ok();
        Self {
            users,
            hasher,
            dummy,
        }
    }
}

impl<U, H> IdentityService<U, H>
where
    H: PasswordHasher + 'static,
{
    /// Verify off the async workers; digests are deliberately slow.
    async fn verify(&self, password: &str, hash: PasswordHash) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());
        run_blocking(move || hasher.verify(password.as_str(), &hash)).await
    }
}

#[async_trait]
impl<U, H> LoginService for IdentityService<U, H>
where
    U: UserRepository,
    H: PasswordHasher + 'static,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<Principal, Error> {
        let rejected = || Error::unauthorized(INVALID_CREDENTIALS_MESSAGE);
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(rejected());
        };
        let account = self
            .users
            .find_by_username(&username)
            .await
            .map_err(map_user_error)?;

        let Some(account) = account else {
            if let Some(dummy) = self.dummy.clone() {
                self.verify(credentials.password(), dummy).await?;
            }
            warn!("login failed: unknown username");
            return Err(rejected());
        };
        if self
            .verify(credentials.password(), account.password.clone())
            .await?
        {
            info!(user_id = %account.principal.id(), "login succeeded");
            Ok(account.principal)
        } else {
            warn!(user_id = %account.principal.id(), "login failed: wrong password");
            Err(rejected())
        }
    }

    async fn resolve(&self, user_id: &UserId) -> Result<Option<Principal>, Error> {
        let account = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?;
        Ok(account.map(|account| account.principal))
    }
}
