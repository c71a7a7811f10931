use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod logging;

// ============================================================================
// Scope Tags
// ============================================================================

/// The role tag persisted as `userScope` after login.
///
/// The server issues exactly these strings; route guards compare against
/// them verbatim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Student,
    Company,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Student, Role::Company];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Student => "Student",
            Role::Company => "Company",
        }
    }

    /// Whether a stored scope string grants this role.
    pub fn matches(&self, scope: &str) -> bool {
        self.as_str() == scope
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown role tag: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.matches(s))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
