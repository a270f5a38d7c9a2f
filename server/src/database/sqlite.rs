use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{debug, info};

use shared::types::{DeviceSnapshot, Identity, PreferenceUpdate, Preferences, Role};

use crate::database::utils::{generate_uuid, get_timestamp};
use crate::database::{IdentityRecord, IdentityStore, NewIdentity, StoreError, StoredIdentity};

const SELECT_COLUMNS: &str = "SELECT id, email, name, password_hash, role, theme_preference,
        color_theme_preference, language_preference, last_login_at, last_login_device,
        created_at, updated_at
    FROM users";

/// [`IdentityStore`] backed by a SQLite database through `sqlx`.
#[derive(Clone, Debug)]
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `url`. An in-memory database lives only as long as its
    /// connection, so it is pinned to a single connection that never idles out.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = options.connect(url).await?;
        info!("Connected to database (in_memory: {})", in_memory);

        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet.
    pub async fn init(&self) -> Result<(), StoreError> {
        crate::database::create::create_tables(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_one_where(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<StoredIdentity>, StoreError> {
        let sql = format!("{} WHERE {} = ?", SELECT_COLUMNS, column);
        let record = sqlx::query_as::<_, IdentityRecord>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(IdentityRecord::into_stored))
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredIdentity>, StoreError> {
        self.fetch_one_where("email", email).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredIdentity>, StoreError> {
        self.fetch_one_where("id", id).await
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let id = generate_uuid();
        let now = get_timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role, theme_preference,
                color_theme_preference, language_preference, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(new.preferences.theme_preference.as_str())
        .bind(new.preferences.color_theme_preference.as_str())
        .bind(new.preferences.language_preference.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!("Created identity {}", id);

        Ok(Identity {
            id,
            email: new.email,
            name: new.name,
            role: new.role,
            preferences: new.preferences,
            has_password: new.password_hash.is_some(),
            last_login_at: None,
            last_login_device: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn record_login(
        &self,
        id: &str,
        at: i64,
        device: &DeviceSnapshot,
    ) -> Result<(), StoreError> {
        let device_json =
            serde_json::to_string(device).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        sqlx::query(
            "UPDATE users SET last_login_at = ?, last_login_device = ?, updated_at = ? WHERE id = ?",
        )
        .bind(at)
        .bind(device_json)
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_preferences(
        &self,
        id: &str,
        update: &PreferenceUpdate,
    ) -> Result<Option<Preferences>, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET
                theme_preference       = COALESCE(?, theme_preference),
                color_theme_preference = COALESCE(?, color_theme_preference),
                language_preference    = COALESCE(?, language_preference),
                updated_at             = ?
             WHERE id = ?",
        )
        .bind(update.theme.map(|t| t.as_str()))
        .bind(update.color_theme.map(|c| c.as_str()))
        .bind(update.language.map(|l| l.as_str()))
        .bind(get_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(self
            .find_by_id(id)
            .await?
            .map(|stored| stored.identity.preferences))
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<Option<Identity>, StoreError> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(get_timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(self.find_by_id(id).await?.map(StoredIdentity::into_identity))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_admins(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(Role::Admin.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list(&self) -> Result<Vec<Identity>, StoreError> {
        let sql = format!("{} ORDER BY created_at DESC, email ASC", SELECT_COLUMNS);
        let records = sqlx::query_as::<_, IdentityRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(records
            .into_iter()
            .map(|r| r.into_stored().into_identity())
            .collect())
    }
}
