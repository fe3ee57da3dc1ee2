//! Role and capability administration, gated by `ManageUsers`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::authorization::map_role_error;
use crate::domain::ports::{RoleAdministration, RoleRepository};
use crate::domain::{
    AuthorizationGuard, CapabilitySet, Error, Operation, Principal, RoleCapabilities, RoleEntry,
    RoleId, RoleName,
};

fn role_not_found(role_id: RoleId) -> Error {
    Error::not_found(format!("Role {role_id} not found"))
}

#[derive(Clone)]
pub struct RoleAdminService<R> {
    roles: Arc<R>,
    guard: AuthorizationGuard<R>,
}

impl<R> RoleAdminService<R> {
    pub fn new(roles: Arc<R>) -> Self {
        let guard = AuthorizationGuard::new(Arc::clone(&roles));
        Self { roles, guard }
    }
}

#[async_trait]
impl<R> RoleAdministration for RoleAdminService<R>
where
    R: RoleRepository,
{
    async fn list_roles(&self, actor: &Principal) -> Result<Vec<RoleEntry>, Error> {
        self.guard.require(actor, Operation::ManageUsers).await?;
        self.roles.list().await.map_err(map_role_error)
    }

    async fn create_role(&self, actor: &Principal, name: String) -> Result<RoleEntry, Error> {
        self.guard.require(actor, Operation::ManageUsers).await?;
        let name = RoleName::new(&name).map_err(|err| Error::invalid_request(err.to_string()))?;
        let role = self
            .roles
            .create(&name, None)
            .await
            .map_err(map_role_error)?;
        info!(actor = %actor.id(), role_id = %role.id, role = %role.name, "role created");
        Ok(RoleEntry {
            role,
            capabilities: RoleCapabilities::Undefined,
        })
    }

    async fn update_capabilities(
        &self,
        actor: &Principal,
        role_id: RoleId,
        capabilities: CapabilitySet,
    ) -> Result<RoleEntry, Error> {
        self.guard.require(actor, Operation::ManageUsers).await?;
        if !self
            .roles
            .set_capabilities(role_id, capabilities)
            .await
            .map_err(map_role_error)?
        {
            return Err(role_not_found(role_id));
        }
        info!(actor = %actor.id(), %role_id, ?capabilities, "capabilities updated");
        self.roles
            .find_by_id(role_id)
            .await
            .map_err(map_role_error)?
            .ok_or_else(|| role_not_found(role_id))
    }

    async fn delete_role(&self, actor: &Principal, role_id: RoleId) -> Result<(), Error> {
        self.guard.require(actor, Operation::ManageUsers).await?;
        if !self.roles.delete(role_id).await.map_err(map_role_error)? {
            return Err(role_not_found(role_id));
        }
        info!(actor = %actor.id(), %role_id, "role deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockRoleRepository, RolePersistenceError};
    use crate::domain::{CANONICAL_ROLES, ErrorCode, Role, UserId, Username};
    use rstest::rstest;

    fn manager_repo() -> MockRoleRepository {
        let mut repo = MockRoleRepository::new();
        repo.expect_find_by_id().returning(|id| {
            Ok(Some(RoleEntry {
                role: Role {
                    id,
                    name: RoleName::new("Manager").expect("role name"),
                },
                capabilities: RoleCapabilities::Defined(CANONICAL_ROLES[4].1),
            }))
        });
        repo
    }

    fn manager() -> Principal {
        Principal::new(
            UserId::random(),
            Username::new("boss").expect("username"),
            RoleId::new(5),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn created_roles_start_without_capabilities() {
        let mut repo = manager_repo();
        repo.expect_create()
            .withf(|name, caps| name.as_ref() == "Contractor" && caps.is_none())
            .returning(|name, _| {
                Ok(Role {
                    id: RoleId::new(6),
                    name: name.clone(),
                })
            });
        let service = RoleAdminService::new(Arc::new(repo));

        let entry = service
            .create_role(&manager(), "Contractor".into())
            .await
            .expect("created");
        assert_eq!(entry.capabilities, RoleCapabilities::Undefined);
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_role_in_use_is_conflict() {
        let mut repo = manager_repo();
        repo.expect_delete()
            .returning(|id| Err(RolePersistenceError::in_use(id.get())));
        let service = RoleAdminService::new(Arc::new(repo));

        let err = service
            .delete_role(&manager(), RoleId::new(1))
            .await
            .expect_err("in use");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn updating_missing_role_is_not_found() {
        let mut repo = manager_repo();
        repo.expect_set_capabilities().returning(|_, _| Ok(false));
        let service = RoleAdminService::new(Arc::new(repo));

        let err = service
            .update_capabilities(&manager(), RoleId::new(40), CapabilitySet::deny_all())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn blank_role_name_is_invalid() {
        let service = RoleAdminService::new(Arc::new(manager_repo()));
        let err = service
            .create_role(&manager(), "   ".into())
            .await
            .expect_err("blank");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
