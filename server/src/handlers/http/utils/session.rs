use std::time::Duration;

use hyper::header::HeaderValue;

use shared::types::SessionClaims;

use crate::AppState;
use crate::error::AuthError;
use crate::handlers::http::utils::headers::create_session_cookie;

/// A freshly signed token and the cookie that carries it.
pub struct IssuedSession {
    pub token: String,
    pub cookie: HeaderValue,
}

/// Sign `claims` and wrap the token in the configured session cookie.
pub fn issue_session(state: &AppState, claims: &SessionClaims) -> Result<IssuedSession, AuthError> {
    let token = state.tokens.issue(claims)?;

    let cookie = create_session_cookie(
        &state.config.auth.cookie_name,
        &token,
        Duration::from_secs(state.tokens.expiry_secs()),
        state.config.auth.secure_cookies,
    )
    .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok(IssuedSession { token, cookie })
}
