use serde::{Deserialize, Serialize};

use crate::types::device::DeviceSnapshot;
use crate::types::preferences::Preferences;
use crate::types::role::Role;

/// A registered account as it may leave the server: no password material,
/// role and preferences already resolved against their registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    #[serde(flatten)]
    pub preferences: Preferences,
    /// True when the account has a local password (false for
    /// external-provider-only accounts).
    pub has_password: bool,
    pub last_login_at: Option<i64>,
    pub last_login_device: Option<DeviceSnapshot>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of a role change, as returned to the admin UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChange {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub updated_at: i64,
}

impl From<&Identity> for RoleChange {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            updated_at: identity.updated_at,
        }
    }
}

/// Body of `PATCH /api/users/:id/role`. The role stays a raw string so an
/// unknown value surfaces as a validation error rather than a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleChangeData {
    pub role: String,
}
