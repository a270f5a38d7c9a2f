pub mod auth;
pub mod database;
pub mod error;
pub mod handlers;
pub mod security;
pub mod server;
pub mod tower_middle;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use shared::types::AppConfig;

use crate::auth::TokenCodec;
use crate::database::IdentityStore;
use crate::security::{AccessGate, RoutePolicy};

/// Everything a request handler needs, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn IdentityStore>,
    pub tokens: Arc<TokenCodec>,
    pub policy: Arc<RoutePolicy>,
    pub gate: Arc<AccessGate>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn IdentityStore>) -> Result<Self> {
        let secret = config
            .auth
            .resolved_jwt_secret()
            .ok_or_else(|| anyhow!("no JWT secret configured"))?;

        let tokens = TokenCodec::new(&secret, config.auth.token_expiry_secs());

        let policy = Arc::new(
            RoutePolicy::new(config.access.rules.clone())
                .context("Invalid route access rules")?,
        );
        let gate = AccessGate::new(&config.access, policy.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens: Arc::new(tokens),
            policy,
            gate: Arc::new(gate),
        })
    }
}
