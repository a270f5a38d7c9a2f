use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use tracing::{debug, error, warn};

use shared::types::ErrorResponse;

use crate::error::AuthError;

pub type HttpResponse = Response<BoxBody<Bytes, Infallible>>;

pub fn full<T: Into<Bytes>>(chunk: T) -> BoxBody<Bytes, Infallible> {
    Full::new(chunk.into()).boxed()
}

/// Serialize any `Serialize` type and deliver it as a JSON response.
/// This is the primary helper all handlers should use instead of
/// writing their own one-off serialization + response-building blocks.
pub fn deliver_serialized_json<T: Serialize>(data: &T, status: StatusCode) -> Result<HttpResponse> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(json))
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))?;

    Ok(response)
}

/// Delivers a JSON error response with the specified error code, message, and status.
pub fn deliver_error_json(error_code: &str, message: &str, status: StatusCode) -> Result<HttpResponse> {
    if status.is_server_error() {
        error!("Delivering error JSON: {} - {} ({})", status.as_u16(), error_code, message);
    } else {
        warn!("Delivering error JSON: {} - {} ({})", status.as_u16(), error_code, message);
    }

    deliver_serialized_json(&ErrorResponse::new(error_code, message), status)
}

/// Render an [`AuthError`] as the JSON error envelope. Retryable failures
/// carry a `Retry-After` hint.
pub fn deliver_auth_error(err: &AuthError) -> Result<HttpResponse> {
    debug!("Rendering error: {}", err);

    let mut response = deliver_error_json(err.to_code(), &err.to_message(), err.status())?;

    if err.is_retryable() {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    }

    Ok(response)
}

/// Delivers a success JSON response with optional data.
pub fn deliver_success_json<T: Serialize>(data: Option<T>) -> Result<HttpResponse> {
    let response_body = match data {
        Some(d) => json!({
            "status": "success",
            "data": d
        }),
        None => json!({
            "status": "success"
        }),
    };

    deliver_serialized_json(&response_body, StatusCode::OK)
}

/// 307 to `location`, with a small JSON body for API clients.
pub fn deliver_redirect(location: &str) -> Result<HttpResponse> {
    debug!("Redirecting to {}", location);

    let body = json!({
        "status": "redirect",
        "location": location
    });

    Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(header::LOCATION, location)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CACHE_CONTROL, "no-store")
        .body(full(body.to_string()))
        .map_err(|e| anyhow!("Failed to build redirect response: {}", e))
}

/// Error response built without any fallible step, for the last line of
/// defence (dispatch failures, timeouts).
pub fn fallback_error(status: StatusCode, code: &str, message: &str) -> HttpResponse {
    let body = serde_json::to_string(&ErrorResponse::new(code, message))
        .unwrap_or_else(|_| r#"{"status":"error"}"#.to_string());

    let mut response = Response::new(full(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Attach a `Set-Cookie` header.
pub fn with_cookie(mut response: HttpResponse, cookie: HeaderValue) -> HttpResponse {
    response.headers_mut().append(header::SET_COOKIE, cookie);
    response
}
