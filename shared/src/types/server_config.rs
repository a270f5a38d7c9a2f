use serde::Deserialize;
use thiserror::Error;

use crate::types::role::Role;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://keystone.db?mode=rwc`.
    pub url: String,
    #[serde(default = "default_db_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_token_expiry")]
    pub token_expiry_minutes: u64,
    /// HMAC key used to sign and verify session tokens.
    ///
    /// Prefer loading this via the `JWT_SECRET` environment variable.  This
    /// config field is the fallback for deployments that cannot inject env
    /// vars at runtime.
    ///
    /// **Minimum length:** 32 characters.
    pub jwt_secret: Option<String>,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub secure_cookies: bool,
}

/// One route prefix and the roles allowed beneath it.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RouteRuleConfig {
    pub prefix: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccessConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Where authenticated but under-privileged callers are sent.
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    /// Pages only meant for signed-out visitors.
    #[serde(default = "default_auth_routes")]
    pub auth_routes: Vec<String>,
    #[serde(default = "default_route_rules")]
    pub rules: Vec<RouteRuleConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"0.0.0.0:3000"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl AuthConfig {
    /// Token expiry in seconds, used for the token `exp` and cookie `Max-Age`.
    pub fn token_expiry_secs(&self) -> u64 {
        self.token_expiry_minutes * 60
    }

    /// Resolve the JWT secret with `JWT_SECRET` env-var taking priority over
    /// the config file field.
    ///
    /// Returns `None` when neither source is set (the server startup code
    /// treats this as a hard error).
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.clone())
            .filter(|s| !s.is_empty())
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            landing_path: default_landing_path(),
            auth_routes: default_auth_routes(),
            rules: default_route_rules(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_port() -> u16 {
    3000
}

pub fn default_max_connections() -> usize {
    1000
}

pub fn default_request_timeout() -> u64 {
    30
}

pub fn default_db_connections() -> u32 {
    5
}

pub fn default_token_expiry() -> u64 {
    60
}

pub fn default_cookie_name() -> String {
    "session_token".to_string()
}

pub fn default_login_path() -> String {
    "/login".to_string()
}

pub fn default_landing_path() -> String {
    "/dashboard".to_string()
}

pub fn default_auth_routes() -> Vec<String> {
    ["/", "/login", "/auth/login", "/signup"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn default_route_rules() -> Vec<RouteRuleConfig> {
    vec![
        RouteRuleConfig {
            prefix: "/dashboard/admin".to_string(),
            roles: vec![Role::Admin],
        },
        RouteRuleConfig {
            prefix: "/dashboard/settings".to_string(),
            roles: vec![Role::Admin, Role::Staff, Role::User],
        },
        RouteRuleConfig {
            prefix: "/dashboard".to_string(),
            roles: vec![Role::Admin, Role::Staff, Role::User],
        },
    ]
}
