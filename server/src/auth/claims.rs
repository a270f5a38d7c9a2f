use tracing::{debug, error, info, warn};

use shared::types::{ClaimsUpdate, Identity, Role, SessionClaims, TokenClaims};

use crate::auth::token::TokenCodec;
use crate::database::IdentityStore;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Where the claims carried by an active session came from on this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimsSource {
    /// Built from a freshly verified identity.
    Minted,
    /// Token claims already valid; no storage access.
    SteadyState,
    /// Role valid but a preference claim was not; coerced without storage.
    Coerced,
    /// Role invalid; rebuilt from the stored identity.
    Repaired,
    /// Role invalid and the identity no longer exists.
    Orphaned,
    /// Role invalid and storage could not be read; defaults for this request.
    Degraded,
    /// Preferences merged from a client update trigger.
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClaims {
    pub claims: SessionClaims,
    pub source: ClaimsSource,
}

impl ResolvedClaims {
    /// Whether the response should carry a re-signed token.
    ///
    /// Degraded and orphaned claims are never written back: doing so would
    /// pin the fallback role into the token and skip the next repair.
    pub fn needs_reissue(&self) -> bool {
        matches!(
            self.source,
            ClaimsSource::Minted
                | ClaimsSource::Coerced
                | ClaimsSource::Repaired
                | ClaimsSource::Updated
        )
    }

    /// Least-privilege stand-ins served while the identity could not be read.
    /// Anything derived from them must not be signed either.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self.source,
            ClaimsSource::Degraded | ClaimsSource::Orphaned
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NoUser,
    Authenticating(Identity),
    Active(ResolvedClaims),
}

impl SessionState {
    /// Authenticating -> Active. Other states are returned unchanged.
    pub fn activate(self) -> Self {
        match self {
            Self::Authenticating(identity) => Self::Active(ResolvedClaims {
                claims: mint(&identity),
                source: ClaimsSource::Minted,
            }),
            other => other,
        }
    }

    pub fn claims(&self) -> Option<&SessionClaims> {
        match self {
            Self::Active(resolved) => Some(&resolved.claims),
            _ => None,
        }
    }

    /// Role of an active session; `None` means no authenticated principal.
    pub fn role(&self) -> Option<Role> {
        self.claims().map(|c| c.role)
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Claims for a verified identity. Role and preferences were already resolved
/// against their registries when the identity was read.
pub fn mint(identity: &Identity) -> SessionClaims {
    SessionClaims::new(identity.id.clone(), identity.role, identity.preferences)
}

/// Read the claims of a decoded token.
///
/// A valid role passes through without touching storage; an invalid
/// preference alongside it is coerced to its default. An invalid role always
/// goes back to storage.
pub async fn resolve(store: &dyn IdentityStore, token: &TokenClaims) -> ResolvedClaims {
    match token.role() {
        Some(role) => {
            let source = if token.is_well_formed() {
                ClaimsSource::SteadyState
            } else {
                debug!("Coercing invalid preference claims for {}", token.sub);
                ClaimsSource::Coerced
            };

            ResolvedClaims {
                claims: SessionClaims::new(token.sub.clone(), role, token.preferences()),
                source,
            }
        }
        None => {
            warn!(
                "Role claim for {} failed validation ({:?}), repairing from storage",
                token.sub, token.role
            );
            repair(store, &token.sub).await
        }
    }
}

/// Rebuild claims for `subject` from storage. Never elevates: a missing
/// identity or an unreadable store yields the default role.
pub async fn repair(store: &dyn IdentityStore, subject: &str) -> ResolvedClaims {
    match store.find_by_id(subject).await {
        Ok(Some(stored)) => {
            info!(
                "Repaired claims for {} (role {})",
                subject, stored.identity.role
            );
            ResolvedClaims {
                claims: mint(&stored.identity),
                source: ClaimsSource::Repaired,
            }
        }
        Ok(None) => {
            warn!("Identity {} no longer exists, using default claims", subject);
            ResolvedClaims {
                claims: SessionClaims::defaults_for(subject),
                source: ClaimsSource::Orphaned,
            }
        }
        Err(e) => {
            error!(
                "Storage unavailable while repairing claims for {}: {}",
                subject, e
            );
            ResolvedClaims {
                claims: SessionClaims::defaults_for(subject),
                source: ClaimsSource::Degraded,
            }
        }
    }
}

/// Merge a client update trigger into `claims`. Only recognised, valid
/// preference fields are applied; the role is never taken from the client.
pub fn apply_update(claims: &SessionClaims, update: &ClaimsUpdate) -> SessionClaims {
    if !update.ignored.is_empty() {
        if update.ignored.iter().any(|k| k == "role") {
            warn!(
                "Client update for {} tried to set its role, ignoring",
                claims.subject
            );
        }
        debug!(
            "Ignoring unrecognised update fields for {}: {:?}",
            claims.subject, update.ignored
        );
    }

    let mut next = claims.clone();
    next.preferences.apply(&update.preferences);
    next
}

/// Decode a raw token (if any) and resolve it into a session state. A token
/// that fails verification means no authenticated principal.
pub async fn load_session(
    tokens: &TokenCodec,
    store: &dyn IdentityStore,
    raw_token: Option<&str>,
) -> SessionState {
    let Some(raw) = raw_token else {
        return SessionState::NoUser;
    };

    match tokens.decode(raw) {
        Ok(token) => SessionState::Active(resolve(store, &token).await),
        Err(_) => SessionState::NoUser,
    }
}
