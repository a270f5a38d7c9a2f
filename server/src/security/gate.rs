use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use shared::types::server_config::AccessConfig;
use shared::types::{Language, Role};

use crate::security::route_policy::{RoutePolicy, normalize_path};

/// Requests under this prefix are never gated.
pub const AUTH_API_PREFIX: &str = "/api/auth";

/// Outcome of the page gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass {
        locale: Language,
        /// Path with the locale segment removed.
        relative_path: String,
    },
    Redirect(String),
}

/// Split a leading locale segment off `path`.
///
/// `"/th/dashboard"` gives `(Th, "/dashboard")`; a path without a locale
/// segment is in the default locale.
pub fn extract_locale(path: &str) -> (Language, String) {
    let path = normalize_path(path);
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    match segments.next().and_then(Language::parse) {
        Some(locale) => {
            let rest: Vec<&str> = segments.collect();
            (locale, format!("/{}", rest.join("/")))
        }
        None => (Language::default(), path),
    }
}

/// Prefix `path` with the locale segment unless it is the default locale.
pub fn localized_path(locale: Language, path: &str) -> String {
    let path = normalize_path(path);
    if locale.is_default() {
        path
    } else if path == "/" {
        format!("/{}", locale.as_str())
    } else {
        format!("/{}{}", locale.as_str(), path)
    }
}

/// Page-level gate run before any non-API page is served.
#[derive(Debug, Clone)]
pub struct AccessGate {
    policy: Arc<RoutePolicy>,
    login_path: String,
    landing_path: String,
    auth_routes: HashSet<String>,
}

impl AccessGate {
    pub fn new(config: &AccessConfig, policy: Arc<RoutePolicy>) -> Self {
        Self {
            policy,
            login_path: normalize_path(&config.login_path),
            landing_path: normalize_path(&config.landing_path),
            auth_routes: config.auth_routes.iter().map(|r| normalize_path(r)).collect(),
        }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    pub fn landing_path(&self, locale: Language) -> String {
        localized_path(locale, &self.landing_path)
    }

    pub fn login_path(&self, locale: Language) -> String {
        localized_path(locale, &self.login_path)
    }

    /// Decide what happens to a page request. `role` is `None` when the
    /// caller has no authenticated session.
    ///
    /// Denied authenticated callers always land on the landing path, whatever
    /// their role; unauthenticated callers go to the login path.
    pub fn decide(&self, path: &str, role: Option<Role>) -> GateDecision {
        let (locale, relative_path) = extract_locale(path);

        if is_auth_api(&relative_path) {
            return GateDecision::Pass {
                locale,
                relative_path,
            };
        }

        if self.auth_routes.contains(&relative_path) {
            if role.is_some() {
                debug!("Signed-in caller on auth route {}, sending to landing", path);
                return GateDecision::Redirect(self.landing_path(locale));
            }
            return GateDecision::Pass {
                locale,
                relative_path,
            };
        }

        if role.is_none() {
            debug!("Unauthenticated request for {}, sending to login", path);
            return GateDecision::Redirect(self.login_path(locale));
        }

        if !self.policy.is_authorized(&relative_path, role) {
            debug!("Role {:?} denied for {}, sending to landing", role, path);
            return GateDecision::Redirect(self.landing_path(locale));
        }

        GateDecision::Pass {
            locale,
            relative_path,
        }
    }
}

/// The auth API itself, matched on whole segments so `/api/authz` is gated.
fn is_auth_api(relative_path: &str) -> bool {
    match relative_path.strip_prefix(AUTH_API_PREFIX) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        let config = AccessConfig::default();
        let policy = RoutePolicy::new(config.rules.clone()).unwrap();
        AccessGate::new(&config, Arc::new(policy))
    }

    #[test]
    fn locale_segment_is_split_off() {
        assert_eq!(
            extract_locale("/th/dashboard/settings"),
            (Language::Th, "/dashboard/settings".to_string())
        );
        assert_eq!(extract_locale("/th"), (Language::Th, "/".to_string()));
        assert_eq!(
            extract_locale("/dashboard"),
            (Language::En, "/dashboard".to_string())
        );
        assert_eq!(
            extract_locale("/en/login"),
            (Language::En, "/login".to_string())
        );
    }

    #[test]
    fn default_locale_has_no_prefix() {
        assert_eq!(localized_path(Language::En, "/dashboard"), "/dashboard");
        assert_eq!(localized_path(Language::Th, "/dashboard"), "/th/dashboard");
        assert_eq!(localized_path(Language::Th, "/"), "/th");
    }

    #[test]
    fn staff_is_sent_to_landing_from_admin_pages() {
        assert_eq!(
            gate().decide("/dashboard/admin/users", Some(Role::Staff)),
            GateDecision::Redirect("/dashboard".into())
        );
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        assert_eq!(
            gate().decide("/dashboard/settings", None),
            GateDecision::Redirect("/login".into())
        );
        assert_eq!(
            gate().decide("/th/dashboard/settings", None),
            GateDecision::Redirect("/th/login".into())
        );
    }

    #[test]
    fn signed_in_caller_skips_auth_routes() {
        assert_eq!(
            gate().decide("/th/login", Some(Role::User)),
            GateDecision::Redirect("/th/dashboard".into())
        );
        assert_eq!(
            gate().decide("/", Some(Role::Admin)),
            GateDecision::Redirect("/dashboard".into())
        );
    }

    #[test]
    fn anonymous_may_see_auth_routes() {
        assert!(matches!(
            gate().decide("/signup", None),
            GateDecision::Pass { .. }
        ));
    }

    #[test]
    fn auth_api_passes_through() {
        assert!(matches!(
            gate().decide("/api/auth/session", None),
            GateDecision::Pass { .. }
        ));
        assert!(matches!(
            gate().decide("/api/auth", None),
            GateDecision::Pass { .. }
        ));
    }

    #[test]
    fn lookalike_auth_api_paths_are_gated() {
        assert_eq!(
            gate().decide("/api/authz", None),
            GateDecision::Redirect("/login".into())
        );
        assert_eq!(
            gate().decide("/api/auth-admin/users", None),
            GateDecision::Redirect("/login".into())
        );
    }

    #[test]
    fn admin_passes_admin_pages() {
        assert_eq!(
            gate().decide("/th/dashboard/admin/users", Some(Role::Admin)),
            GateDecision::Pass {
                locale: Language::Th,
                relative_path: "/dashboard/admin/users".into(),
            }
        );
    }

    #[test]
    fn unlisted_pages_still_need_a_session() {
        assert_eq!(
            gate().decide("/reports", None),
            GateDecision::Redirect("/login".into())
        );
        assert!(matches!(
            gate().decide("/reports", Some(Role::User)),
            GateDecision::Pass { .. }
        ));
    }
}
