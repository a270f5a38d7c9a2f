use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use shared::types::{Role, RouteRuleConfig};

/// Canonical form of a request path: query and fragment dropped, exactly one
/// leading slash, no empty segments, no trailing slash. The root is `"/"`.
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());

    let segments: Vec<&str> = path[..end].split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PolicyError {
    #[error("duplicate route rule prefix: {0}")]
    DuplicatePrefix(String),

    #[error("route rule {0} allows no roles")]
    EmptyRoles(String),
}

/// Roles admitted under a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedRoles {
    /// No rule matches: any principal passes.
    Any,
    Only(BTreeSet<Role>),
}

impl AllowedRoles {
    pub fn permits(&self, role: Option<Role>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(roles) => role.is_some_and(|r| roles.contains(&r)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    prefix: String,
    roles: BTreeSet<Role>,
}

impl RouteRule {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Exact prefix, or prefix followed by a segment boundary. A `"/"` rule
    /// therefore covers only the root path.
    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Longest-prefix route access policy.
///
/// Rules are kept sorted by descending prefix length, so the first match is
/// the most specific one. Two distinct prefixes of equal length can never
/// both match one path; identical prefixes are rejected at construction.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    rules: Vec<RouteRule>,
}

impl RoutePolicy {
    pub fn new<I>(rules: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = RouteRuleConfig>,
    {
        let mut seen = HashSet::new();
        let mut built = Vec::new();

        for rule in rules {
            let prefix = normalize_path(&rule.prefix);

            if rule.roles.is_empty() {
                return Err(PolicyError::EmptyRoles(prefix));
            }

            if !seen.insert(prefix.clone()) {
                return Err(PolicyError::DuplicatePrefix(prefix));
            }

            built.push(RouteRule {
                prefix,
                roles: rule.roles.into_iter().collect(),
            });
        }

        built.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });

        Ok(Self { rules: built })
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// The most specific rule covering `path`, if any.
    pub fn matching_rule(&self, path: &str) -> Option<&RouteRule> {
        let path = normalize_path(path);
        self.rules.iter().find(|rule| rule.matches(&path))
    }

    pub fn allowed_roles(&self, path: &str) -> AllowedRoles {
        match self.matching_rule(path) {
            Some(rule) => AllowedRoles::Only(rule.roles.clone()),
            None => AllowedRoles::Any,
        }
    }

    /// `role` is `None` for an unauthenticated caller, which only passes
    /// unrestricted paths.
    pub fn is_authorized(&self, path: &str, role: Option<Role>) -> bool {
        match self.matching_rule(path) {
            Some(rule) => role.is_some_and(|r| rule.roles.contains(&r)),
            None => true,
        }
    }
}
