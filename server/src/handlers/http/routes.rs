use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use hyper::body::Incoming;
use hyper::{Method, Request, StatusCode, header};
use tracing::{debug, error, warn};

use crate::AppState;
use crate::auth::claims::{ResolvedClaims, SessionState, load_session};
use crate::handlers::http::{admin, auth, profile, utils::*};
use crate::security::GateDecision;

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two tiers:
//
//   RouteHandler    no session.  Receives (req, state).
//                   Use for: login, register, logout, health.
//
//   SessionHandler  verified token, claims resolved (and repaired when the
//                   role claim is invalid).  Receives (req, state, claims).
//                   Use for: everything that acts on behalf of a caller.

type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse>> + Send>>;

type RouteHandler = Box<dyn Fn(Request<Incoming>, AppState) -> HandlerFuture + Send + Sync>;

type SessionHandler =
    Box<dyn Fn(Request<Incoming>, AppState, ResolvedClaims) -> HandlerFuture + Send + Sync>;

// ---------------------------------------------------------------------------
// RouteKind
// ---------------------------------------------------------------------------

enum RouteKind {
    /// No session check.
    Open(RouteHandler),

    /// Requires an active session. The handler receives the resolved claims
    /// and must not decode the token again.
    Session(SessionHandler),
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    fn open<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    fn session<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, AppState, ResolvedClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Session(Box::new(move |req, state, claims| {
                Box::pin(handler(req, state, claims))
            })),
        });
        self
    }

    // ── Open (no session) ─────────────────────────────────────────────────────

    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.open(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.open(Method::POST, path, handler)
    }

    // ── Session ───────────────────────────────────────────────────────────────

    pub fn get_session<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, AppState, ResolvedClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.session(Method::GET, path, handler)
    }

    pub fn patch_session<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, AppState, ResolvedClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.session(Method::PATCH, path, handler)
    }

    pub fn delete_session<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Incoming>, AppState, ResolvedClaims) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        self.session(Method::DELETE, path, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Route a request, turning any handler failure into a JSON 500.
    pub async fn dispatch(&self, req: Request<Incoming>, state: AppState) -> HttpResponse {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match self.route(req, state).await {
            Ok(response) => response,
            Err(e) => {
                error!("{} {} failed: {:#}", method, path, e);
                fallback_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error",
                )
            }
        }
    }

    pub async fn route(&self, req: Request<Incoming>, state: AppState) -> Result<HttpResponse> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }

            return match &route.kind {
                RouteKind::Open(h) => h(req, state).await,

                RouteKind::Session(h) => {
                    let session = current_session(&req, &state).await;
                    match session {
                        SessionState::Active(resolved) => {
                            let reissue =
                                resolved.needs_reissue().then(|| resolved.claims.clone());
                            let response = h(req, state.clone(), resolved).await?;
                            Ok(attach_reissued(response, &state, reissue))
                        }
                        _ => {
                            warn!("Session rejected {} {}", method, path);
                            unauthorized()
                        }
                    }
                }
            };
        }

        // No registered route matched: GET requests are page requests and
        // go through the access gate.
        if method == Method::GET {
            return self.gate_page(req, state, &path).await;
        }

        deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    async fn gate_page(
        &self,
        req: Request<Incoming>,
        state: AppState,
        path: &str,
    ) -> Result<HttpResponse> {
        let session = current_session(&req, &state).await;

        match state.gate.decide(path, session.role()) {
            GateDecision::Redirect(location) => deliver_redirect(&location),
            GateDecision::Pass {
                locale,
                relative_path,
            } => {
                debug!("Gate passed {} as {}", path, relative_path);

                let body = serde_json::json!({
                    "status":  "success",
                    "path":    relative_path,
                    "locale":  locale,
                    "session": session.claims(),
                });
                let response = deliver_serialized_json(&body, StatusCode::OK)?;

                let reissue = match session {
                    SessionState::Active(resolved) if resolved.needs_reissue() => {
                        Some(resolved.claims)
                    }
                    _ => None,
                };
                Ok(attach_reissued(response, &state, reissue))
            }
        }
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        if route_path == clean {
            return true;
        }

        // Segment-by-segment matching for `:param` wildcards.
        // e.g.  "/api/users/:id/role"  matches  "/api/users/42/role"
        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return false;
        }

        route_segs
            .iter()
            .zip(path_segs.iter())
            .all(|(r, p)| (r.starts_with(':') && !p.is_empty()) || r == p)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn current_session(req: &Request<Incoming>, state: &AppState) -> SessionState {
    let token = extract_session_token(req.headers(), &state.config.auth.cookie_name);
    load_session(&state.tokens, &*state.store, token.as_deref()).await
}

/// Re-sign `claims` onto the response unless the handler already set a
/// session cookie of its own.
fn attach_reissued(
    response: HttpResponse,
    state: &AppState,
    claims: Option<shared::types::SessionClaims>,
) -> HttpResponse {
    let Some(claims) = claims else {
        return response;
    };

    if response.headers().contains_key(header::SET_COOKIE) {
        return response;
    }

    match issue_session(state, &claims) {
        Ok(issued) => {
            debug!("Reissued session token for {}", claims.subject);
            with_cookie(response, issued.cookie)
        }
        Err(e) => {
            // The request itself succeeded; the next one repairs again.
            warn!("Could not reissue token for {}: {}", claims.subject, e);
            response
        }
    }
}

fn unauthorized() -> Result<HttpResponse> {
    deliver_error_json(
        "UNAUTHORIZED",
        "Authentication required",
        StatusCode::UNAUTHORIZED,
    )
    .context("Failed to deliver 401 response")
}

// ---------------------------------------------------------------------------
// API router
//
// Session tier is enforced here at the routing level. Handlers MUST NOT
// decode the token themselves:
//
//   .get(...) / .post(...)   Open     handler gets (req, state)
//   .get_session(...)        Session  handler gets (req, state, claims)
//   .patch_session(...)      Session  same
//   .delete_session(...)     Session  same
// ---------------------------------------------------------------------------

pub fn build_router() -> Router {
    Router::new()
        // ── Public ───────────────────────────────────────────────────────────
        .get("/health", |_req, _state| async move {
            deliver_serialized_json(
                &serde_json::json!({"status": "success", "health": "ok"}),
                StatusCode::OK,
            )
        })
        .post("/api/auth/login", |req, state| async move {
            auth::handle_login(req, state).await.context("Login failed")
        })
        .post("/api/auth/register", |req, state| async move {
            auth::handle_register(req, state)
                .await
                .context("Registration failed")
        })
        .post("/api/auth/logout", |req, state| async move {
            auth::handle_logout(req, state).await.context("Logout failed")
        })
        // ── Session ──────────────────────────────────────────────────────────
        .get_session("/api/auth/session", |req, state, claims| async move {
            auth::handle_get_session(req, state, claims)
                .await
                .context("Session read failed")
        })
        .patch_session("/api/auth/session", |req, state, claims| async move {
            auth::handle_update_session(req, state, claims)
                .await
                .context("Session update failed")
        })
        .patch_session("/api/settings", |req, state, claims| async move {
            profile::handle_update_settings(req, state, claims)
                .await
                .context("Settings update failed")
        })
        // ── Administration ───────────────────────────────────────────────────
        .get_session("/api/users", |req, state, claims| async move {
            admin::handle_get_users(req, state, claims)
                .await
                .context("User list failed")
        })
        .patch_session("/api/users/:id/role", |req, state, claims| async move {
            admin::handle_change_role(req, state, claims)
                .await
                .context("Role change failed")
        })
        .delete_session("/api/users/:id", |req, state, claims| async move {
            admin::handle_delete_user(req, state, claims)
                .await
                .context("User delete failed")
        })
}
