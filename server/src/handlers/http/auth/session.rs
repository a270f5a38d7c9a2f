use anyhow::Result;
use hyper::body::Incoming as IncomingBody;
use hyper::{Request, StatusCode};
use tracing::{debug, info, warn};

use shared::types::{ClaimsUpdate, SessionResponse};

use crate::AppState;
use crate::auth::claims::{self, ResolvedClaims};
use crate::handlers::http::utils::{
    HttpResponse, deliver_auth_error, deliver_serialized_json, issue_session, read_json_value,
    with_cookie,
};

/// GET /api/auth/session
///
/// The router has already resolved (and if needed repaired) the claims; a
/// re-signed cookie is attached by the router when they changed.
pub async fn handle_get_session(
    _req: Request<IncomingBody>,
    _state: AppState,
    resolved: ResolvedClaims,
) -> Result<HttpResponse> {
    debug!(
        "Session read for {} ({:?})",
        resolved.claims.subject, resolved.source
    );

    current_session(resolved)
}

/// PATCH /api/auth/session
///
/// Explicit update trigger: the client reports preference values it already
/// persisted. Unknown or invalid fields, and any role, are ignored.
pub async fn handle_update_session(
    req: Request<IncomingBody>,
    state: AppState,
    resolved: ResolvedClaims,
) -> Result<HttpResponse> {
    let payload = match read_json_value(req).await {
        Ok(value) => value,
        Err(e) => return deliver_auth_error(&e),
    };

    let update = ClaimsUpdate::from_value(&payload);

    if update.is_empty() {
        debug!(
            "Empty session update for {}, claims unchanged",
            resolved.claims.subject
        );
        return current_session(resolved);
    }

    let next = claims::apply_update(&resolved.claims, &update);

    if resolved.is_fallback() {
        warn!(
            "Claims for {} are a {:?} fallback, update applied without re-signing",
            next.subject, resolved.source
        );
        let response = SessionResponse::Success {
            session: next,
            refreshed: false,
        };
        return deliver_serialized_json(&response, StatusCode::OK);
    }

    let issued = match issue_session(&state, &next) {
        Ok(issued) => issued,
        Err(e) => return deliver_auth_error(&e),
    };

    info!("Session claims updated for {}", next.subject);

    let response = SessionResponse::Success {
        session: next,
        refreshed: true,
    };

    Ok(with_cookie(
        deliver_serialized_json(&response, StatusCode::OK)?,
        issued.cookie,
    ))
}

fn current_session(resolved: ResolvedClaims) -> Result<HttpResponse> {
    let response = SessionResponse::Success {
        refreshed: resolved.needs_reissue(),
        session: resolved.claims,
    };
    deliver_serialized_json(&response, StatusCode::OK)
}
