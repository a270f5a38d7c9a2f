use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Access level of an identity.
///
/// The set is closed: every value that crosses a trust boundary (a decoded
/// token, a database column, a client payload) goes through [`Role::parse`]
/// or [`Role::resolve`] before it is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Staff,
    User,
}

/// Every role, most privileged first.
pub const USER_ROLES: [Role; 3] = [Role::Admin, Role::Staff, Role::User];

/// Lowest-privilege role, assigned at registration and used whenever a stored
/// or claimed role fails validation.
pub const DEFAULT_USER_ROLE: Role = Role::User;

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Staff => "STAFF",
            Self::User => "USER",
        }
    }

    /// Strict parse: exact match against the registry, `None` otherwise.
    pub fn parse(value: &str) -> Option<Self> {
        USER_ROLES.into_iter().find(|role| role.as_str() == value)
    }

    /// Parse an untyped JSON value (a decoded claim). Anything that is not a
    /// string naming a known role yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }

    /// Coercing read: unknown or absent values become the default role.
    pub fn resolve(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(DEFAULT_USER_ROLE)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

pub fn is_valid_role(value: &str) -> bool {
    Role::parse(value).is_some()
}

pub fn default_role() -> Role {
    DEFAULT_USER_ROLE
}

impl Default for Role {
    fn default() -> Self {
        DEFAULT_USER_ROLE
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}
