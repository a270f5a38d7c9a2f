#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use keystone::AppState;
use keystone::database::utils::{generate_uuid, get_timestamp, hash_password};
use keystone::database::{IdentityStore, NewIdentity, StoreError, StoredIdentity};
use shared::config::parse_config;
use shared::types::{AppConfig, DeviceSnapshot, Identity, PreferenceUpdate, Preferences, Role};

pub const SECRET: &str = "0123456789abcdef0123456789abcdef";

/// In-memory store with a switchable outage and a write counter.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, StoredIdentity>>,
    failing: AtomicBool,
    failing_writes: AtomicBool,
    failing_reads: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reads keep working; every write fails.
    pub fn set_failing_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Writes keep working; every read fails.
    pub fn set_failing_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &str) -> Option<Identity> {
        self.rows
            .lock()
            .unwrap()
            .get(id)
            .map(|s| s.identity.clone())
    }

    /// Insert directly, bypassing validation. Returns the new id.
    pub fn seed(&self, email: &str, password: &str, role: Role) -> String {
        let now = get_timestamp();
        let identity = Identity {
            id: generate_uuid(),
            email: email.to_string(),
            name: Some(email.split('@').next().unwrap_or("user").to_string()),
            role,
            preferences: Preferences::default(),
            has_password: true,
            last_login_at: None,
            last_login_device: None,
            created_at: now,
            updated_at: now,
        };
        let id = identity.id.clone();
        self.rows.lock().unwrap().insert(
            id.clone(),
            StoredIdentity {
                identity,
                password_hash: Some(hash_password(password).unwrap()),
            },
        );
        id
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected outage".into()))
        } else {
            Ok(())
        }
    }

    fn check_read(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.failing_reads.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected read outage".into()))
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        self.check()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected write outage".into()))
        } else {
            Ok(())
        }
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredIdentity>, StoreError> {
        self.check_read()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|s| s.identity.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<StoredIdentity>, StoreError> {
        self.check_read()?;
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn create(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        self.check_write()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.values().any(|s| s.identity.email == new.email) {
            return Err(StoreError::Conflict("email".into()));
        }
        let now = get_timestamp();
        let identity = Identity {
            id: generate_uuid(),
            email: new.email,
            name: new.name,
            role: new.role,
            preferences: new.preferences,
            has_password: new.password_hash.is_some(),
            last_login_at: None,
            last_login_device: None,
            created_at: now,
            updated_at: now,
        };
        rows.insert(
            identity.id.clone(),
            StoredIdentity {
                identity: identity.clone(),
                password_hash: new.password_hash,
            },
        );
        self.wrote();
        Ok(identity)
    }

    async fn record_login(
        &self,
        id: &str,
        at: i64,
        device: &DeviceSnapshot,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        if let Some(row) = self.rows.lock().unwrap().get_mut(id) {
            row.identity.last_login_at = Some(at);
            row.identity.last_login_device = Some(device.clone());
        }
        self.wrote();
        Ok(())
    }

    async fn update_preferences(
        &self,
        id: &str,
        update: &PreferenceUpdate,
    ) -> Result<Option<Preferences>, StoreError> {
        self.check_write()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(id) else {
            return Ok(None);
        };
        row.identity.preferences.apply(update);
        self.wrote();
        Ok(Some(row.identity.preferences))
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<Option<Identity>, StoreError> {
        self.check_write()?;
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(id) else {
            return Ok(None);
        };
        row.identity.role = role;
        self.wrote();
        Ok(Some(row.identity.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.check_write()?;
        let removed = self.rows.lock().unwrap().remove(id).is_some();
        if removed {
            self.wrote();
        }
        Ok(removed)
    }

    async fn count_admins(&self) -> Result<i64, StoreError> {
        self.check_read()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.identity.role == Role::Admin)
            .count() as i64)
    }

    async fn list(&self) -> Result<Vec<Identity>, StoreError> {
        self.check_read()?;
        let mut all: Vec<Identity> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .map(|s| s.identity.clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.email.cmp(&b.email)));
        Ok(all)
    }
}

pub fn test_config() -> AppConfig {
    parse_config(&format!(
        r#"
[server]
bind = "127.0.0.1"
port = 0

[database]
url = "sqlite::memory:"

[auth]
jwt_secret = "{}"
"#,
        SECRET
    ))
    .unwrap()
}

pub fn test_state(store: Arc<MemoryStore>) -> AppState {
    AppState::new(test_config(), store).unwrap()
}
