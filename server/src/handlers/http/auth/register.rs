use anyhow::Result;
use hyper::body::Incoming as IncomingBody;
use hyper::{Request, StatusCode};
use tracing::{info, warn};

use shared::types::{Language, RegistrationData, RegistrationResponse};

use crate::AppState;
use crate::auth::credentials;
use crate::handlers::http::utils::{
    HttpResponse, deliver_auth_error, deliver_serialized_json, read_body,
};

/// POST /api/auth/register
pub async fn handle_register(req: Request<IncomingBody>, state: AppState) -> Result<HttpResponse> {
    info!("Processing registration request");

    let data: RegistrationData = match read_body(req).await {
        Ok(data) => data,
        Err(e) => {
            warn!("Registration parsing failed: {}", e.to_code());
            return deliver_auth_error(&e);
        }
    };

    let identity = match credentials::register(&*state.store, &data).await {
        Ok(identity) => identity,
        Err(e) => return deliver_auth_error(&e),
    };

    let response = RegistrationResponse::Success {
        user_id: identity.id,
        email: identity.email,
        message: "Account created".to_string(),
        redirect: state.gate.login_path(Language::default()),
    };

    deliver_serialized_json(&response, StatusCode::CREATED)
}
