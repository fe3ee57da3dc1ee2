//! Authorization guard: composes the principal's role with its capability row.
//!
//! The guard is stateless. The same principal and operation always produce
//! the same decision until the role assignment or capability row changes.
//! Absent roles and absent capability rows deny; they never error.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{AccessControl, AccessProfile, RolePersistenceError, RoleRepository};
use crate::domain::{CapabilitySet, Error, PanelNumber, Principal, RoleCapabilities, UserId};

/// Message returned when a capability check denies.
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action";
/// Message returned when an administrator targets their own account.
pub const SELF_DELETE_MESSAGE: &str = "You cannot delete yourself.";

/// A guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ViewPanel(PanelNumber),
    ExportData,
    EditData,
    ManageUsers,
    ViewAccessLogs,
}

impl Operation {
    /// The capability bit this operation reads.
    #[must_use]
    pub const fn permitted_by(self, set: &CapabilitySet) -> bool {
        match self {
            Self::ViewPanel(panel) => set.can_view_panel(panel),
            Self::ExportData => set.export_data,
            Self::EditData => set.edit_data,
            Self::ManageUsers => set.manage_users,
            Self::ViewAccessLogs => set.view_access_logs,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ViewPanel(panel) => write!(f, "view_panel_{panel}"),
            Self::ExportData => f.write_str("export_data"),
            Self::EditData => f.write_str("edit_data"),
            Self::ManageUsers => f.write_str("manage_users"),
            Self::ViewAccessLogs => f.write_str("view_access_logs"),
        }
    }
}

/// Why a check denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The principal's role no longer exists.
    UnknownRole,
    /// The role exists but has no capability row.
    UndefinedCapabilities,
    /// The capability row has the bit cleared.
    MissingCapability,
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    /// Evaluate an operation against resolved capabilities.
    ///
    /// # Examples
    /// ```
    /// use telemetry_backend::domain::{
    ///     CANONICAL_ROLES, Decision, DenyReason, Operation, RoleCapabilities,
    /// };
    ///
    /// let investor = RoleCapabilities::Defined(CANONICAL_ROLES[0].1);
    /// assert_eq!(
    ///     Decision::evaluate(investor, Operation::ExportData),
    ///     Decision::Deny(DenyReason::MissingCapability)
    /// );
    /// assert_eq!(
    ///     Decision::evaluate(RoleCapabilities::Undefined, Operation::ExportData),
    ///     Decision::Deny(DenyReason::UndefinedCapabilities)
    /// );
    /// ```
    #[must_use]
    pub const fn evaluate(capabilities: RoleCapabilities, operation: Operation) -> Self {
        match capabilities {
            RoleCapabilities::Undefined => Self::Deny(DenyReason::UndefinedCapabilities),
            RoleCapabilities::Defined(set) => {
                if operation.permitted_by(&set) {
                    Self::Allow
                } else {
                    Self::Deny(DenyReason::MissingCapability)
                }
            }
        }
    }

    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Turn a deny into the `forbidden` domain error.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(_) => Err(Error::forbidden(FORBIDDEN_MESSAGE)),
        }
    }
}

/// Self-protection: administrators may not delete their own account.
///
/// This is an identity comparison, independent of capabilities.
pub fn ensure_not_self(actor: &Principal, target: &UserId) -> Result<(), Error> {
    if actor.is_same_account(target) {
        Err(Error::invalid_self_operation(SELF_DELETE_MESSAGE))
    } else {
        Ok(())
    }
}

pub(crate) fn map_role_error(error: RolePersistenceError) -> Error {
    match error {
        RolePersistenceError::Connection { message } => {
            Error::service_unavailable(format!("role repository unavailable: {message}"))
        }
        RolePersistenceError::Query { message } => {
            Error::internal(format!("role repository error: {message}"))
        }
        RolePersistenceError::DuplicateName { name } => {
            Error::conflict(format!("Role '{name}' already exists"))
        }
        RolePersistenceError::InUse { role_id } => {
            Error::conflict(format!("Role {role_id} is still assigned to users"))
        }
    }
}

/// Capability guard backed by the role repository.
#[derive(Clone)]
pub struct AuthorizationGuard<R> {
    roles: Arc<R>,
}

impl<R> AuthorizationGuard<R> {
    pub fn new(roles: Arc<R>) -> Self {
        Self { roles }
    }
}

impl<R> AuthorizationGuard<R>
where
    R: RoleRepository,
{
    /// Authorize and fail with `forbidden` on deny.
    pub async fn require(&self, principal: &Principal, operation: Operation) -> Result<(), Error> {
        self.authorize(principal, operation).await?.into_result()
    }
}

#[async_trait]
impl<R> AccessControl for AuthorizationGuard<R>
where
    R: RoleRepository,
{
    async fn authorize(
        &self,
        principal: &Principal,
        operation: Operation,
    ) -> Result<Decision, Error> {
        let entry = self
            .roles
            .find_by_id(principal.role_id())
            .await
            .map_err(map_role_error)?;
        let decision = match entry {
            None => Decision::Deny(DenyReason::UnknownRole),
            Some(entry) => Decision::evaluate(entry.capabilities, operation),
        };
        if let Decision::Deny(reason) = decision {
            debug!(
                user_id = %principal.id(),
                role_id = %principal.role_id(),
                %operation,
                ?reason,
                "authorization denied"
            );
        }
        Ok(decision)
    }

    async fn profile(&self, principal: &Principal) -> Result<AccessProfile, Error> {
        let entry = self
            .roles
            .find_by_id(principal.role_id())
            .await
            .map_err(map_role_error)?;
        Ok(match entry {
            Some(entry) => AccessProfile {
                role: Some(entry.role),
                capabilities: entry.capabilities,
            },
            None => AccessProfile {
                role: None,
                capabilities: RoleCapabilities::Undefined,
            },
        })
    }
}

#[cfg(test)]
#[path = "authorization_tests.rs"]
mod tests;
