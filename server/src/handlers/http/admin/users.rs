use anyhow::Result;
use hyper::body::Incoming as IncomingBody;
use hyper::{Request, StatusCode};
use tracing::{info, warn};

use shared::types::RoleChangeData;

use crate::AppState;
use crate::auth::admin;
use crate::auth::claims::ResolvedClaims;
use crate::error::AuthError;
use crate::handlers::http::utils::{
    HttpResponse, deliver_auth_error, deliver_serialized_json, read_body,
};

/// `:id` segment of `/api/users/:id[/...]`.
fn target_id(req: &Request<IncomingBody>) -> Option<String> {
    req.uri()
        .path()
        .split('/')
        .nth(3)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn missing_target() -> Result<HttpResponse> {
    deliver_auth_error(&AuthError::Validation("Invalid user id".to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/users
pub async fn handle_get_users(
    _req: Request<IncomingBody>,
    state: AppState,
    resolved: ResolvedClaims,
) -> Result<HttpResponse> {
    info!("Serving user list to {}", resolved.claims.subject);

    let users = match admin::list_accounts(&*state.store, &state.policy, &resolved.claims).await
    {
        Ok(users) => users,
        Err(e) => return deliver_auth_error(&e),
    };

    let total = users.len();
    deliver_serialized_json(
        &serde_json::json!({
            "status": "success",
            "users":  users,
            "total":  total,
        }),
        StatusCode::OK,
    )
}

/// PATCH /api/users/:id/role
pub async fn handle_change_role(
    req: Request<IncomingBody>,
    state: AppState,
    resolved: ResolvedClaims,
) -> Result<HttpResponse> {
    let Some(id) = target_id(&req) else {
        return missing_target();
    };

    let data: RoleChangeData = match read_body(req).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Role change parsing failed: {}", e.to_code());
            return deliver_auth_error(&e);
        }
    };

    match admin::change_role(&*state.store, &resolved.claims, &id, &data.role).await {
        Ok(change) => deliver_serialized_json(
            &serde_json::json!({
                "status":  "success",
                "message": "Role updated",
                "user":    change,
            }),
            StatusCode::OK,
        ),
        Err(e) => deliver_auth_error(&e),
    }
}

/// DELETE /api/users/:id
pub async fn handle_delete_user(
    req: Request<IncomingBody>,
    state: AppState,
    resolved: ResolvedClaims,
) -> Result<HttpResponse> {
    let Some(id) = target_id(&req) else {
        return missing_target();
    };

    match admin::delete_account(&*state.store, &resolved.claims, &id).await {
        Ok(()) => deliver_serialized_json(
            &serde_json::json!({
                "status":  "success",
                "message": "User deleted",
                "id":      id,
            }),
            StatusCode::OK,
        ),
        Err(e) => deliver_auth_error(&e),
    }
}
