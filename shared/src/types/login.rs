use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::identity::Identity;

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

#[derive(Clone, Deserialize)]
pub struct LoginData {
    #[serde(alias = "username")]
    pub email: String,
    pub password: String,
}

// Keeps the password out of logs.
impl fmt::Debug for LoginData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginData")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful / failed login response envelope.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoginResponse {
    Success {
        user: Identity,
        /// Signed session token, also set as the session cookie.
        token: String,
        expires_in: u64,
        message: String,
        redirect: String,
    },
    Error {
        code: String,
        message: String,
    },
}

/// Response of the session endpoints (`GET`/`PATCH /api/auth/session`).
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionResponse {
    Success {
        session: crate::types::claims::SessionClaims,
        /// True when the claims were rebuilt (repair or update) and a fresh
        /// token was issued with this response.
        refreshed: bool,
    },
    Error {
        code: String,
        message: String,
    },
}
