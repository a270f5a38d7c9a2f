use std::collections::HashMap;

use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::Request;
use hyper::body::Incoming;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::AuthError;
use crate::handlers::http::utils::headers::header_contains;

/// Largest request body accepted by any endpoint.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Collect the request body, refusing anything over [`MAX_BODY_BYTES`].
pub async fn collect_body(req: Request<Incoming>) -> Result<(bool, Bytes), AuthError> {
    let is_form = header_contains(
        req.headers(),
        "content-type",
        "application/x-www-form-urlencoded",
    );

    let bytes = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            warn!("Failed to read request body: {}", e);
            AuthError::Validation("Request body could not be read".to_string())
        })?
        .to_bytes();

    Ok((is_form, bytes))
}

/// Decode a JSON or `application/x-www-form-urlencoded` body into `T`.
pub async fn read_body<T: DeserializeOwned>(req: Request<Incoming>) -> Result<T, AuthError> {
    let (is_form, bytes) = collect_body(req).await?;
    decode_body(is_form, &bytes)
}

/// Decode a JSON body into an untyped value; an empty body is `{}`.
pub async fn read_json_value(req: Request<Incoming>) -> Result<serde_json::Value, AuthError> {
    let (_, bytes) = collect_body(req).await?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Object(Default::default()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::Validation(format!("Invalid JSON body: {}", e)))
}

pub fn decode_body<T: DeserializeOwned>(is_form: bool, bytes: &[u8]) -> Result<T, AuthError> {
    if is_form {
        let params = form_urlencoded::parse(bytes)
            .into_owned()
            .collect::<HashMap<String, String>>();

        let value = serde_json::to_value(params)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        return serde_json::from_value(value)
            .map_err(|e| AuthError::Validation(format!("Invalid form body: {}", e)));
    }

    serde_json::from_slice(bytes)
        .map_err(|e| AuthError::Validation(format!("Invalid JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::LoginData;

    #[test]
    fn form_body_decodes() {
        let data: LoginData =
            decode_body(true, b"email=a%40x.com&password=secret1").unwrap();
        assert_eq!(data.email, "a@x.com");
        assert_eq!(data.password, "secret1");
    }

    #[test]
    fn json_body_decodes() {
        let data: LoginData =
            decode_body(false, br#"{"email":"a@x.com","password":"secret1"}"#).unwrap();
        assert_eq!(data.email, "a@x.com");
    }

    #[test]
    fn missing_field_is_a_validation_error() {
        let err = decode_body::<LoginData>(false, br#"{"email":"a@x.com"}"#).unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }
}
