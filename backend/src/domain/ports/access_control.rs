//! Driving port for capability checks.

use async_trait::async_trait;

use crate::domain::{Decision, Error, Operation, Principal, Role, RoleCapabilities};

/// What a principal may do, as shown on the dashboard and `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessProfile {
    /// `None` when the principal's role has been removed.
    pub role: Option<Role>,
    pub capabilities: RoleCapabilities,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Decide whether `principal` may perform `operation`.
    async fn authorize(&self, principal: &Principal, operation: Operation)
    -> Result<Decision, Error>;

    /// Resolve the principal's role and capability row.
    async fn profile(&self, principal: &Principal) -> Result<AccessProfile, Error>;
}
