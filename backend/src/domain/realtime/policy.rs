//! Room-join policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether joining the dashboard room is capability-gated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPolicy {
    /// Any connection may join any room.
    #[default]
    Open,
    /// Joining `dashboard` requires an authenticated principal allowed to
    /// view panel 1.
    Capability,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown room policy '{0}', expected 'open' or 'capability'")]
pub struct RoomPolicyParseError(String);

impl FromStr for RoomPolicy {
    type Err = RoomPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "capability" => Ok(Self::Capability),
            _ => Err(RoomPolicyParseError(s.to_owned())),
        }
    }
}

impl fmt::Display for RoomPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Capability => "capability",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("open", RoomPolicy::Open)]
    #[case(" Capability ", RoomPolicy::Capability)]
    fn parses_policy_names(#[case] raw: &str, #[case] expected: RoomPolicy) {
        assert_eq!(raw.parse::<RoomPolicy>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_policy() {
        assert!("strict".parse::<RoomPolicy>().is_err());
    }
}
