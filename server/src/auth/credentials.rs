use tracing::{error, info, warn};

use shared::types::{DeviceSnapshot, Identity, Preferences, RegistrationData, Role};

use crate::database::utils::{get_timestamp, hash_password, is_valid_email, verify_password};
use crate::database::{IdentityStore, NewIdentity, StoreError};
use crate::error::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Verify `email`/`password` against storage.
///
/// Unknown email, missing local credential and wrong password all produce
/// the same [`AuthError::InvalidCredentials`]. On success the last-login
/// audit fields are written on a best-effort basis.
pub async fn authenticate(
    store: &dyn IdentityStore,
    email: &str,
    password: &str,
    device: DeviceSnapshot,
) -> Result<Identity, AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if password.is_empty() {
        return Err(AuthError::Validation("Password is required".to_string()));
    }

    info!("Attempting login for: {}", email);

    let stored = store.find_by_email(email).await.map_err(|e| {
        error!("Storage error looking up {}: {}", email, e);
        AuthError::from(e)
    })?;

    let Some(stored) = stored else {
        warn!("Login failed for {}: no such identity", email);
        return Err(AuthError::InvalidCredentials);
    };

    let Some(hash) = stored.password_hash.clone() else {
        warn!("Login failed for {}: no local credential", email);
        return Err(AuthError::InvalidCredentials);
    };

    let candidate = password.to_string();
    let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &candidate))
        .await
        .map_err(|e| AuthError::Internal(format!("password verification task failed: {}", e)))?;

    match verified {
        Ok(true) => {}
        Ok(false) => {
            warn!("Login failed for {}: wrong password", email);
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => {
            error!("Unusable password hash for {}: {}", email, e);
            return Err(AuthError::InvalidCredentials);
        }
    }

    let mut identity = stored.into_identity();
    let now = get_timestamp();

    match store.record_login(&identity.id, now, &device).await {
        Ok(()) => {
            identity.last_login_at = Some(now);
            identity.last_login_device = Some(device);
        }
        Err(e) => warn!("Failed to record login for {}: {}", identity.id, e),
    }

    info!("Login successful for {} (ID: {})", email, identity.id);

    Ok(identity)
}

/// Create a local account with the default role and default preferences.
pub async fn register(
    store: &dyn IdentityStore,
    data: &RegistrationData,
) -> Result<Identity, AuthError> {
    let name = data.name.trim();
    let email = data.email.trim();

    if name.is_empty() {
        return Err(AuthError::Validation("Name is required".to_string()));
    }

    if !is_valid_email(email) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }

    if data.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let password = data.password.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("password hashing task failed: {}", e)))?
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let created = store
        .create(NewIdentity {
            email: email.to_string(),
            name: Some(name.to_string()),
            password_hash: Some(hash),
            role: Role::default(),
            preferences: Preferences::default(),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                warn!("Registration rejected, email taken: {}", email);
                AuthError::Conflict("Email already taken".to_string())
            }
            other => {
                error!("Storage error registering {}: {}", email, other);
                AuthError::from(other)
            }
        })?;

    info!("Registered {} (ID: {})", created.email, created.id);

    Ok(created)
}
