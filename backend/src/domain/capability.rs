//! Roles and the role-to-capability matrix.
//!
//! A role owns at most one [`CapabilitySet`]. A missing set is not an error:
//! it is the explicit [`RoleCapabilities::Undefined`] variant, and every check
//! against it denies. Nothing outside this module branches on role names; new
//! roles are new rows of data.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum stored length of a role name.
pub const ROLE_NAME_MAX: usize = 50;

/// Validation errors for role and panel primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleValidationError {
    #[error("role name must not be empty")]
    EmptyName,
    #[error("role name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("panel number must be between 1 and 4, got {value}")]
    PanelOutOfRange { value: u8 },
}

/// Numeric role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(u32);

impl RoleId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique role name, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, RoleValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RoleValidationError::EmptyName);
        }
        if trimmed.chars().count() > ROLE_NAME_MAX {
            return Err(RoleValidationError::NameTooLong {
                max: ROLE_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoleName {
    type Error = RoleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

/// A named role that principals are assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
}

/// A role together with its (possibly absent) capability row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEntry {
    pub role: Role,
    pub capabilities: RoleCapabilities,
}

/// Dashboard panel number, 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelNumber(u8);

impl PanelNumber {
    pub const ALL: [PanelNumber; 4] = [Self(1), Self(2), Self(3), Self(4)];

    pub fn new(value: u8) -> Result<Self, RoleValidationError> {
        if (1..=4).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RoleValidationError::PanelOutOfRange { value })
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PanelNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Independent permission bits owned by one role.
///
/// Serialises with the `can_*` field names used by the admin API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitySet {
    #[serde(rename = "can_view_panel_1")]
    pub view_panel_1: bool,
    #[serde(rename = "can_view_panel_2")]
    pub view_panel_2: bool,
    #[serde(rename = "can_view_panel_3")]
    pub view_panel_3: bool,
    #[serde(rename = "can_view_panel_4")]
    pub view_panel_4: bool,
    #[serde(rename = "can_export_data")]
    pub export_data: bool,
    #[serde(rename = "can_edit_data")]
    pub edit_data: bool,
    #[serde(rename = "can_manage_users")]
    pub manage_users: bool,
    #[serde(rename = "can_view_access_logs")]
    pub view_access_logs: bool,
}

impl CapabilitySet {
    /// Every bit cleared.
    #[must_use]
    pub const fn deny_all() -> Self {
        Self {
            view_panel_1: false,
            view_panel_2: false,
            view_panel_3: false,
            view_panel_4: false,
            export_data: false,
            edit_data: false,
            manage_users: false,
            view_access_logs: false,
        }
    }

    #[must_use]
    pub const fn can_view_panel(&self, panel: PanelNumber) -> bool {
        match panel.0 {
            1 => self.view_panel_1,
            2 => self.view_panel_2,
            3 => self.view_panel_3,
            4 => self.view_panel_4,
            _ => false,
        }
    }
}

/// Capabilities resolved for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleCapabilities {
    /// The role has a capability row.
    Defined(CapabilitySet),
    /// No row exists; every check denies.
    Undefined,
}

impl RoleCapabilities {
    /// The effective set, deny-all when undefined.
    #[must_use]
    pub const fn effective(&self) -> CapabilitySet {
        match self {
            Self::Defined(set) => *set,
            Self::Undefined => CapabilitySet::deny_all(),
        }
    }

    #[must_use]
    pub const fn as_defined(&self) -> Option<&CapabilitySet> {
        match self {
            Self::Defined(set) => Some(set),
            Self::Undefined => None,
        }
    }
}

impl From<Option<CapabilitySet>> for RoleCapabilities {
    fn from(value: Option<CapabilitySet>) -> Self {
        value.map_or(Self::Undefined, Self::Defined)
    }
}

const fn row(
    panels: [bool; 4],
    export_data: bool,
    edit_data: bool,
    manage_users: bool,
    view_access_logs: bool,
) -> CapabilitySet {
    CapabilitySet {
        view_panel_1: panels[0],
        view_panel_2: panels[1],
        view_panel_3: panels[2],
        view_panel_4: panels[3],
        export_data,
        edit_data,
        manage_users,
        view_access_logs,
    }
}

/// Canonical roles shipped with the dashboard, most restrictive first.
pub const CANONICAL_ROLES: [(&str, CapabilitySet); 5] = [
    ("Investor", row([true, true, false, false], false, false, false, false)),
    ("Audit", row([true, true, true, false], true, false, false, true)),
    ("Operator", row([true, true, true, true], false, false, false, false)),
    ("Engineer", row([true, true, true, true], true, true, false, false)),
    ("Manager", row([true, true, true, true], true, true, true, true)),
];

/// Name of the canonical role with user-management rights.
pub const MANAGER_ROLE: &str = "Manager";

/// Role name to capability lookup table.
///
/// # Examples
/// ```
/// use telemetry_backend::domain::{CapabilityMatrix, PanelNumber, RoleName};
///
/// let matrix = CapabilityMatrix::canonical();
/// let investor = RoleName::new("Investor").expect("valid name");
/// let caps = matrix.lookup(&investor).effective();
/// assert!(caps.can_view_panel(PanelNumber::new(2).expect("panel")));
/// assert!(!caps.export_data);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CapabilityMatrix {
    rows: HashMap<RoleName, CapabilitySet>,
}

impl CapabilityMatrix {
    /// Matrix holding the five canonical roles.
    #[must_use]
    pub fn canonical() -> Self {
        let rows = CANONICAL_ROLES
            .iter()
            .filter_map(|(name, set)| RoleName::new(name).ok().map(|name| (name, *set)))
            .collect();
        Self { rows }
    }

    /// Insert or replace the row for `role`.
    pub fn insert(&mut self, role: RoleName, set: CapabilitySet) {
        self.rows.insert(role, set);
    }

    #[must_use]
    pub fn lookup(&self, role: &RoleName) -> RoleCapabilities {
        self.rows.get(role).copied().into()
    }

    /// Rows in a stable order (by role name).
    #[must_use]
    pub fn rows(&self) -> Vec<(RoleName, CapabilitySet)> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .map(|(name, set)| (name.clone(), *set))
            .collect();
        rows.sort_by_key(|(name, _)| name.to_string());
        rows
    }
}
