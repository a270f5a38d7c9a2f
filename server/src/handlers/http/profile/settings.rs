use anyhow::Result;
use hyper::body::Incoming as IncomingBody;
use hyper::{Request, StatusCode};
use tracing::{info, warn};

use shared::types::{PreferencesPayload, SessionClaims, SettingsResponse};

use crate::AppState;
use crate::auth::claims::ResolvedClaims;
use crate::auth::preferences;
use crate::handlers::http::utils::{
    HttpResponse, deliver_auth_error, deliver_serialized_json, issue_session, read_body,
    with_cookie,
};

/// PATCH /api/settings
///
/// Persists the caller's own preferences, then re-signs the session so the
/// new values are visible without another login.
pub async fn handle_update_settings(
    req: Request<IncomingBody>,
    state: AppState,
    resolved: ResolvedClaims,
) -> Result<HttpResponse> {
    let resolved_is_fallback = resolved.is_fallback();
    let caller = resolved.claims;
    info!("Updating settings for {}", caller.subject);

    let payload: PreferencesPayload = match read_body(req).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Settings parsing failed: {}", e.to_code());
            return deliver_auth_error(&e);
        }
    };

    let applied = match preferences::update_preferences(
        &*state.store,
        &caller,
        &caller.subject,
        &payload,
    )
    .await
    {
        Ok(applied) => applied,
        Err(e) => return deliver_auth_error(&e),
    };

    let response = SettingsResponse::Success { settings: applied };

    if resolved_is_fallback {
        // The stored preferences are updated; the token keeps its old claims
        // so the next request repairs the role from storage.
        warn!(
            "Settings saved for {} but fallback claims were not re-signed",
            caller.subject
        );
        return deliver_serialized_json(&response, StatusCode::OK);
    }

    // Role stays as the claims carry it; only preferences come from the write.
    let refreshed = SessionClaims::new(caller.subject.clone(), caller.role, applied);

    let issued = match issue_session(&state, &refreshed) {
        Ok(issued) => issued,
        Err(e) => return deliver_auth_error(&e),
    };

    Ok(with_cookie(
        deliver_serialized_json(&response, StatusCode::OK)?,
        issued.cookie,
    ))
}
