use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use shared::types::{SessionClaims, TokenClaims};

use crate::database::utils::get_timestamp;
use crate::error::AuthError;

/// Signs and verifies session tokens (HS256).
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_secs,
        }
    }

    pub fn expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    /// Sign `claims` with a fresh `iat`/`exp` pair.
    pub fn issue(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        let iat = get_timestamp().max(0) as usize;
        let exp = iat + self.expiry_secs as usize;

        encode(
            &Header::new(Algorithm::HS256),
            &claims.to_token_claims(iat, exp),
            &self.encoding,
        )
        .map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Verify signature and expiry. The access-relevant fields are not
    /// validated here.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::Token(e.to_string())
            })
    }

    /// Sign a raw payload as-is. Used to exercise the decode path with
    /// hand-built claims.
    pub fn sign_raw(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Token(e.to_string()))
    }
}
