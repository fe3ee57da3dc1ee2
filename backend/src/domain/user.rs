//! Principals (dashboard users) and their identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PasswordHash, RoleId};

/// Maximum stored length of a username.
pub const USERNAME_MAX: usize = 64;

/// Validation errors for user primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        let uuid = Uuid::new_v4();
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.1
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Unique login name. Trimmed; case is preserved and significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

/// An authenticated actor. Exactly one role is assigned.
///
/// # Examples
/// ```
/// use telemetry_backend::domain::{Principal, RoleId, UserId, Username};
///
/// let principal = Principal::new(
///     UserId::random(),
///     Username::new("ada").expect("username"),
///     RoleId::new(1),
/// );
/// assert_eq!(principal.username().as_ref(), "ada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    id: UserId,
    username: Username,
    role_id: RoleId,
}

impl Principal {
    #[must_use]
    pub fn new(id: UserId, username: Username, role_id: RoleId) -> Self {
        Self {
            id,
            username,
            role_id,
        }
    }

    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    #[must_use]
    pub fn username(&self) -> &Username {
        &self.username
    }

    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Identity comparison used by self-protection rules.
    #[must_use]
    pub fn is_same_account(&self, other: &UserId) -> bool {
        &self.id == other
    }

    #[must_use]
    pub fn with_role(mut self, role_id: RoleId) -> Self {
        self.role_id = role_id;
        self
    }
}

/// Stored account: the principal plus its credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub principal: Principal,
    pub password: PasswordHash,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyId)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserValidationError::InvalidId)]
    #[case("not-a-uuid", UserValidationError::InvalidId)]
    fn invalid_user_ids_are_rejected(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn usernames_are_trimmed() {
        let name = Username::new("  operator  ").expect("valid username");
        assert_eq!(name.as_ref(), "operator");
    }

    #[rstest]
    fn overlong_usernames_are_rejected() {
        let raw = "u".repeat(USERNAME_MAX + 1);
        assert_eq!(
            Username::new(raw),
            Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX })
        );
    }

    #[rstest]
    fn same_account_compares_identity_only() {
        let id = UserId::random();
        let principal = Principal::new(
            id.clone(),
            Username::new("ada").expect("username"),
            RoleId::new(5),
        );
        assert!(principal.is_same_account(&id));
        assert!(!principal.is_same_account(&UserId::random()));
    }
}
