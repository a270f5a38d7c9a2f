use anyhow::Result;
use hyper::body::Incoming as IncomingBody;
use hyper::{Request, StatusCode};
use tracing::{info, warn};

use shared::types::{LoginData, LoginResponse};

use crate::AppState;
use crate::auth::claims::SessionState;
use crate::auth::credentials;
use crate::database::utils::sanitize_string;
use crate::error::AuthError;
use crate::handlers::http::utils::{
    HttpResponse, deliver_auth_error, deliver_serialized_json, issue_session, read_body,
    with_cookie,
};
use crate::security::fingerprint::fingerprint;

/// POST /api/auth/login
pub async fn handle_login(req: Request<IncomingBody>, state: AppState) -> Result<HttpResponse> {
    info!("Processing login request");

    // Headers first: reading the body consumes the request.
    let device = fingerprint(req.headers());

    let login_data: LoginData = match read_body(req).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Login parsing failed: {}", e.to_code());
            return deliver_auth_error(&e);
        }
    };

    let email = sanitize_string(&login_data.email);

    let identity =
        match credentials::authenticate(&*state.store, &email, &login_data.password, device).await
        {
            Ok(identity) => identity,
            Err(e) => return deliver_auth_error(&e),
        };

    let SessionState::Active(resolved) = SessionState::Authenticating(identity.clone()).activate()
    else {
        return deliver_auth_error(&AuthError::Internal("session did not activate".into()));
    };

    let issued = match issue_session(&state, &resolved.claims) {
        Ok(issued) => issued,
        Err(e) => return deliver_auth_error(&e),
    };

    let redirect = state
        .gate
        .landing_path(identity.preferences.language_preference);

    let response = LoginResponse::Success {
        user: identity,
        token: issued.token,
        expires_in: state.tokens.expiry_secs(),
        message: "Login successful".to_string(),
        redirect,
    };

    Ok(with_cookie(
        deliver_serialized_json(&response, StatusCode::OK)?,
        issued.cookie,
    ))
}
