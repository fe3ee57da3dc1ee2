//! Account administration use-cases, gated by `ManageUsers`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use zeroize::Zeroizing;

use crate::domain::authorization::map_role_error;
use crate::domain::identity_service::map_user_error;
use crate::domain::ports::{
    AccountSummary, NewAccountRequest, PasswordHasher, RoleRepository, UserAdministration,
    UserRepository,
};
use crate::domain::{
    AuthorizationGuard, Error, Operation, PasswordHash, Principal, RoleId, RoleName, UserAccount,
    UserId, Username, ensure_not_self, run_blocking,
};

const USER_NOT_FOUND: &str = "User not found";

/// User administration service implementing [`UserAdministration`].
#[derive(Clone)]
pub struct UserAdminService<U, R, H> {
    users: Arc<U>,
    roles: Arc<R>,
    hasher: Arc<H>,
    guard: AuthorizationGuard<R>,
}

impl<U, R, H> UserAdminService<U, R, H> {
    pub fn new(users: Arc<U>, roles: Arc<R>, hasher: Arc<H>) -> Self {
        let guard = AuthorizationGuard::new(Arc::clone(&roles));
        Self {
            users,
            roles,
            hasher,
            guard,
        }
    }
}

impl<U, R, H> UserAdminService<U, R, H>
where
    U: UserRepository,
    R: RoleRepository,
    H: PasswordHasher + 'static,
{
    async fn hash_password(&self, password: &str) -> Result<PasswordHash, Error> {
        if password.is_empty() {
            return Err(Error::invalid_request("Password is required"));
        }
        let hasher = Arc::clone(&self.hasher);
        let password = Zeroizing::new(password.to_owned());
        run_blocking(move || hasher.hash(password.as_str()))
            .await?
            .map_err(|err| Error::internal(err.to_string()))
    }

    async fn role_name(&self, role_id: RoleId) -> Result<RoleName, Error> {
        self.roles
            .find_by_id(role_id)
            .await
            .map_err(map_role_error)?
            .map(|entry| entry.role.name)
            .ok_or_else(|| Error::not_found(format!("Role {role_id} not found")))
    }
}

#[async_trait]
impl<U, R, H> UserAdministration for UserAdminService<U, R, H>
where
    U: UserRepository,
    R: RoleRepository,
    H: PasswordHasher + 'static,
{
    async fn list_accounts(&self, actor: &Principal) -> Result<Vec<AccountSummary>, Error> {
        self.guard.require(actor, Operation::ManageUsers).await?;
        let names: HashMap<RoleId, RoleName> = self
            .roles
            .list()
            .await
            .map_err(map_role_error)?
            .into_iter()
            .map(|entry| (entry.role.id, entry.role.name))
            .collect();
        let accounts = self.users.list().await.map_err(map_user_error)?;
        Ok(accounts
            .into_iter()
            .map(|account| AccountSummary {
                role_name: names.get(&account.principal.role_id()).cloned(),
                principal: account.principal,
            })
            .collect())
    }

    async fn create_account(
        &self,
        actor: &Principal,
        request: NewAccountRequest,
    ) -> Result<AccountSummary, Error> {
        self.guard.require(actor, Operation::ManageUsers).await?;
        let username = Username::new(&request.username)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let password = self.hash_password(&request.password).await?;
        let role_name = self.role_name(request.role_id).await?;

        let principal = Principal::new(UserId::random(), username, request.role_id);
        let account = UserAccount {
            principal: principal.clone(),
            password,
        };
        self.users.create(&account).await.map_err(map_user_error)?;
        info!(
            actor = %actor.id(),
            user_id = %principal.id(),
            role_id = %request.role_id,
            "account created"
        );
        Ok(AccountSummary {
            principal,
            role_name: Some(role_name),
        })
    }

    async fn delete_account(&self, actor: &Principal, target: &UserId) -> Result<(), Error> {
        ensure_not_self(actor, target)?;
        self.guard.require(actor, Operation::ManageUsers).await?;
        if !self.users.delete(target).await.map_err(map_user_error)? {
            return Err(Error::not_found(USER_NOT_FOUND));
        }
        info!(actor = %actor.id(), user_id = %target, "account deleted");
        Ok(())
    }

    async fn reset_password(
        &self,
        actor: &Principal,
        target: &UserId,
        new_password: String,
    ) -> Result<(), Error> {
        self.guard.require(actor, Operation::ManageUsers).await?;
        let password = self.hash_password(&new_password).await?;
        if !self
            .users
            .update_password(target, &password)
            .await
            .map_err(map_user_error)?
        {
            return Err(Error::not_found(USER_NOT_FOUND));
        }
        info!(actor = %actor.id(), user_id = %target, "password reset");
        Ok(())
    }

    async fn assign_role(
        &self,
        actor: &Principal,
        target: &UserId,
        role_id: RoleId,
    ) -> Result<AccountSummary, Error> {
        self.guard.require(actor, Operation::ManageUsers).await?;
        let role_name = self.role_name(role_id).await?;
        if !self
            .users
            .update_role(target, role_id)
            .await
            .map_err(map_user_error)?
        {
            return Err(Error::not_found(USER_NOT_FOUND));
        }
        let account = self
            .users
            .find_by_id(target)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))?;
        info!(actor = %actor.id(), user_id = %target, %role_id, "role assigned");
        Ok(AccountSummary {
            principal: account.principal,
            role_name: Some(role_name),
        })
    }
}

#[cfg(test)]
#[path = "user_admin_service_tests.rs"]
mod tests;
