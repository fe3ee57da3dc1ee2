//! In-process account and role directory.
//!
//! Users and roles share one lock so referential checks (unknown role on
//! create, role still in use on delete) see a single consistent state.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{
    RolePersistenceError, RoleRepository, UserPersistenceError, UserRepository,
};
use crate::domain::{
    CapabilitySet, PasswordHash, Role, RoleCapabilities, RoleEntry, RoleId, RoleName,
    UserAccount, UserId, Username,
};

#[derive(Default)]
struct State {
    users: HashMap<UserId, UserAccount>,
    roles: BTreeMap<RoleId, RoleEntry>,
    next_role_id: u32,
}

impl State {
    fn role_exists(&self, id: RoleId) -> bool {
        self.roles.contains_key(&id)
    }
}

/// Account and role store backed by process memory.
#[derive(Default)]
pub struct InMemoryDirectory {
    state: RwLock<State>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryDirectory {
    async fn create(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut state = self.state.write().await;
        let role_id = account.principal.role_id();
        if !state.role_exists(role_id) {
            return Err(UserPersistenceError::unknown_role(role_id.get()));
        }
        let username = account.principal.username();
        if state
            .users
            .values()
            .any(|existing| existing.principal.username() == username)
        {
            return Err(UserPersistenceError::duplicate_username(username.to_string()));
        }
        state
            .users
            .insert(account.principal.id().clone(), account.clone());
        debug!(user_id = %account.principal.id(), "account stored");
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|account| account.principal.username() == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserAccount>, UserPersistenceError> {
        let mut accounts: Vec<_> = self.state.read().await.users.values().cloned().collect();
        accounts.sort_by_key(|account| account.principal.username().to_string());
        Ok(accounts)
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        Ok(self.state.write().await.users.remove(id).is_some())
    }

    async fn update_password(
        &self,
        id: &UserId,
        password: &PasswordHash,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(id).is_some_and(|account| {
            account.password = password.clone();
            true
        }))
    }

    async fn update_role(
        &self,
        id: &UserId,
        role_id: RoleId,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.state.write().await;
        if !state.role_exists(role_id) {
            return Err(UserPersistenceError::unknown_role(role_id.get()));
        }
        let Some(account) = state.users.get_mut(id) else {
            return Ok(false);
        };
        account.principal = account.principal.clone().with_role(role_id);
        Ok(true)
    }
}

#[async_trait]
impl RoleRepository for InMemoryDirectory {
    async fn list(&self) -> Result<Vec<RoleEntry>, RolePersistenceError> {
        Ok(self.state.read().await.roles.values().cloned().collect())
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Option<RoleEntry>, RolePersistenceError> {
        Ok(self.state.read().await.roles.get(&id).cloned())
    }

    async fn find_by_name(
        &self,
        name: &RoleName,
    ) -> Result<Option<RoleEntry>, RolePersistenceError> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .values()
            .find(|entry| &entry.role.name == name)
            .cloned())
    }

    async fn create(
        &self,
        name: &RoleName,
        capabilities: Option<CapabilitySet>,
    ) -> Result<Role, RolePersistenceError> {
        let mut state = self.state.write().await;
        if state.roles.values().any(|entry| &entry.role.name == name) {
            return Err(RolePersistenceError::duplicate_name(name.to_string()));
        }
        state.next_role_id += 1;
        let role = Role {
            id: RoleId::new(state.next_role_id),
            name: name.clone(),
        };
        state.roles.insert(
            role.id,
            RoleEntry {
                role: role.clone(),
                capabilities: RoleCapabilities::from(capabilities),
            },
        );
        debug!(role_id = %role.id, role = %role.name, "role stored");
        Ok(role)
    }

    async fn set_capabilities(
        &self,
        id: RoleId,
        capabilities: CapabilitySet,
    ) -> Result<bool, RolePersistenceError> {
        let mut state = self.state.write().await;
        Ok(state.roles.get_mut(&id).is_some_and(|entry| {
            entry.capabilities = RoleCapabilities::Defined(capabilities);
            true
        }))
    }

    async fn delete(&self, id: RoleId) -> Result<bool, RolePersistenceError> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|account| account.principal.role_id() == id)
        {
            return Err(RolePersistenceError::in_use(id.get()));
        }
        Ok(state.roles.remove(&id).is_some())
    }
}
