use tracing::{info, warn};

use shared::types::{Preferences, PreferencesPayload, SessionClaims};

use crate::database::IdentityStore;
use crate::error::AuthError;

/// Persist a partial preference update for `subject_id`.
///
/// Only the subject itself may update its preferences. Validation is strict:
/// an empty payload or any unknown value rejects the whole update before
/// storage is touched. Returns the stored values after the write.
pub async fn update_preferences(
    store: &dyn IdentityStore,
    caller: &SessionClaims,
    subject_id: &str,
    payload: &PreferencesPayload,
) -> Result<Preferences, AuthError> {
    if caller.subject != subject_id {
        warn!(
            "{} attempted to update preferences of {}",
            caller.subject, subject_id
        );
        return Err(AuthError::Forbidden(
            "You can only update your own preferences".to_string(),
        ));
    }

    let update = payload
        .validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let applied = store
        .update_preferences(subject_id, &update)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    info!("Preferences updated for {}", subject_id);

    Ok(applied)
}
