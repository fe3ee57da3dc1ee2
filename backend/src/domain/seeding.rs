//! Idempotent start-up seeding of canonical roles and the bootstrap admin.

use tracing::info;

use crate::domain::authorization::map_role_error;
use crate::domain::identity_service::map_user_error;
use crate::domain::ports::{PasswordHasher, RoleRepository, UserRepository};
use crate::domain::{
    CANONICAL_ROLES, Error, MANAGER_ROLE, Principal, RoleCapabilities, RoleName, UserAccount,
    UserId, Username,
};

/// Username of the bootstrap administrator.
pub const ADMIN_USERNAME: &str = "admin";

/// What a seeding pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles_created: usize,
    pub capability_rows_created: usize,
}

/// Insert the canonical roles and fill in missing capability rows.
///
/// Existing rows are left untouched so administrator edits survive restarts.
pub async fn seed_canonical_roles<R>(roles: &R) -> Result<SeedReport, Error>
where
    R: RoleRepository + ?Sized,
{
    let mut report = SeedReport::default();
    for (raw_name, defaults) in CANONICAL_ROLES {
        let name = RoleName::new(raw_name).map_err(|err| Error::internal(err.to_string()))?;
        match roles.find_by_name(&name).await.map_err(map_role_error)? {
            None => {
                roles
                    .create(&name, Some(defaults))
                    .await
                    .map_err(map_role_error)?;
                report.roles_created += 1;
                report.capability_rows_created += 1;
            }
            Some(entry) if entry.capabilities == RoleCapabilities::Undefined => {
                roles
                    .set_capabilities(entry.role.id, defaults)
                    .await
                    .map_err(map_role_error)?;
                report.capability_rows_created += 1;
            }
            Some(_) => {}
        }
    }
    info!(
        roles_created = report.roles_created,
        capability_rows_created = report.capability_rows_created,
        "canonical roles seeded"
    );
    Ok(report)
}

/// Create the `admin` account with the Manager role when it does not exist.
///
/// Returns `true` when an account was created.
pub async fn seed_admin<U, R, H>(
    users: &U,
    roles: &R,
    hasher: &H,
    password: &str,
) -> Result<bool, Error>
where
    U: UserRepository + ?Sized,
    R: RoleRepository + ?Sized,
    H: PasswordHasher + ?Sized,
{
    let username = Username::new(ADMIN_USERNAME).map_err(|err| Error::internal(err.to_string()))?;
    if users
        .find_by_username(&username)
        .await
        .map_err(map_user_error)?
        .is_some()
    {
        return Ok(false);
    }
    if password.is_empty() {
        return Err(Error::invalid_request("admin password must not be empty"));
    }
    let manager = RoleName::new(MANAGER_ROLE).map_err(|err| Error::internal(err.to_string()))?;
    let role = roles
        .find_by_name(&manager)
        .await
        .map_err(map_role_error)?
        .ok_or_else(|| Error::internal("Manager role missing; seed roles first"))?;
    let password = hasher
        .hash(password)
        .map_err(|err| Error::internal(err.to_string()))?;
    let principal = Principal::new(UserId::random(), username, role.role.id);
    users
        .create(&UserAccount {
            principal: principal.clone(),
            password,
        })
        .await
        .map_err(map_user_error)?;
    info!(user_id = %principal.id(), "bootstrap admin created");
    Ok(true)
}
