pub mod create;
pub mod sqlite;
pub mod utils;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use shared::types::{
    DeviceSnapshot, Identity, PreferenceUpdate, Preferences, Role,
};

pub use self::sqlite::SqliteIdentityStore;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.message().to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Corrupt(err.to_string())
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An identity together with its password hash. Never serialized; the hash
/// is dropped by [`StoredIdentity::into_identity`] before anything leaves the
/// credential path.
#[derive(Clone)]
pub struct StoredIdentity {
    pub identity: Identity,
    pub password_hash: Option<String>,
}

impl StoredIdentity {
    pub fn into_identity(self) -> Identity {
        self.identity
    }
}

impl std::fmt::Debug for StoredIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredIdentity")
            .field("identity", &self.identity)
            .field("has_password", &self.password_hash.is_some())
            .finish()
    }
}

/// Raw `users` row. Role and preference columns are plain text here and are
/// resolved against their registries in [`IdentityRecord::into_stored`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdentityRecord {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub theme_preference: Option<String>,
    pub color_theme_preference: Option<String>,
    pub language_preference: Option<String>,
    pub last_login_at: Option<i64>,
    pub last_login_device: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl IdentityRecord {
    pub fn into_stored(self) -> StoredIdentity {
        let role = Role::resolve(self.role.as_deref());
        if self.role.as_deref().and_then(Role::parse).is_none() {
            warn!(
                "Stored role {:?} for {} is not a known role, reading as {}",
                self.role, self.id, role
            );
        }

        let preferences = Preferences::resolve(
            self.theme_preference.as_deref(),
            self.color_theme_preference.as_deref(),
            self.language_preference.as_deref(),
        );

        let last_login_device = self.last_login_device.as_deref().and_then(|raw| {
            match serde_json::from_str::<DeviceSnapshot>(raw) {
                Ok(device) => Some(device.normalized()),
                Err(e) => {
                    warn!("Unreadable device snapshot for {}: {}", self.id, e);
                    None
                }
            }
        });

        StoredIdentity {
            identity: Identity {
                id: self.id,
                email: self.email,
                name: self.name,
                role,
                preferences,
                has_password: self.password_hash.is_some(),
                last_login_at: self.last_login_at,
                last_login_device,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            password_hash: self.password_hash,
        }
    }
}

/// Input for account creation. The id and timestamps are assigned by the
/// store.
#[derive(Clone)]
pub struct NewIdentity {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Role,
    pub preferences: Preferences,
}

// ---------------------------------------------------------------------------
// Storage seam
// ---------------------------------------------------------------------------

/// Everything the access-control core needs from persistence. Each write
/// touches only the fields it names, so concurrent writes to distinct fields
/// of one identity do not interfere.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredIdentity>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredIdentity>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError>;

    async fn record_login(
        &self,
        id: &str,
        at: i64,
        device: &DeviceSnapshot,
    ) -> Result<(), StoreError>;

    /// Applies the present fields and returns the resulting preferences, or
    /// `None` when the identity does not exist.
    async fn update_preferences(
        &self,
        id: &str,
        update: &PreferenceUpdate,
    ) -> Result<Option<Preferences>, StoreError>;

    /// Returns the updated identity, or `None` when it does not exist.
    async fn update_role(&self, id: &str, role: Role) -> Result<Option<Identity>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn count_admins(&self) -> Result<i64, StoreError>;

    /// All identities, newest first.
    async fn list(&self) -> Result<Vec<Identity>, StoreError>;
}
