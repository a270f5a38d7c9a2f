use anyhow::{Context, Result};
use hyper::body::Incoming as IncomingBody;
use hyper::{Request, StatusCode};
use tracing::info;

use crate::AppState;
use crate::handlers::http::utils::{
    HttpResponse, delete_cookie, deliver_serialized_json, with_cookie,
};

/// POST /api/auth/logout
///
/// Tokens are stateless, so logging out only clears the cookie.
pub async fn handle_logout(_req: Request<IncomingBody>, state: AppState) -> Result<HttpResponse> {
    info!("User logged out");

    let clear_cookie = delete_cookie(
        &state.config.auth.cookie_name,
        state.config.auth.secure_cookies,
    )
    .context("Failed to build logout cookie")?;

    let response_json = serde_json::json!({
        "status": "success",
        "message": "Logged out successfully",
        "redirect": state.config.access.login_path,
    });

    Ok(with_cookie(
        deliver_serialized_json(&response_json, StatusCode::OK)?,
        clear_cookie,
    ))
}
