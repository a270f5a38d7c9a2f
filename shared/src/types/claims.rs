use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::preferences::{ColorTheme, Language, PreferenceUpdate, Preferences, Theme};
use crate::types::role::Role;

/// Payload of the signed session token exactly as it is encoded.
///
/// Only `sub`, `iat` and `exp` are structurally required. The access-relevant
/// fields are kept as untyped JSON so that a token minted under an older
/// schema (or tampered with before signing keys rotated) still decodes; they
/// are validated afterwards, never trusted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Identity id.
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_preference: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme_preference: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_preference: Option<Value>,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: usize,

    /// Expiry (Unix timestamp, seconds).
    pub exp: usize,
}

impl TokenClaims {
    /// The role claim if, and only if, it names a registry role.
    pub fn role(&self) -> Option<Role> {
        self.role.as_ref().and_then(Role::from_value)
    }

    /// Preference claims with every invalid value coerced to its default.
    pub fn preferences(&self) -> Preferences {
        Preferences::resolve_values(
            self.theme_preference.as_ref(),
            self.color_theme_preference.as_ref(),
            self.language_preference.as_ref(),
        )
    }

    /// True when every access-relevant field already validates.
    pub fn is_well_formed(&self) -> bool {
        self.role().is_some()
            && valid_str(self.theme_preference.as_ref(), Theme::parse)
            && valid_str(self.color_theme_preference.as_ref(), ColorTheme::parse)
            && valid_str(self.language_preference.as_ref(), Language::parse)
    }
}

fn valid_str<T>(value: Option<&Value>, parse: fn(&str) -> Option<T>) -> bool {
    value.and_then(Value::as_str).and_then(parse).is_some()
}

/// Validated view of a session: every field holds a registry value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub subject: String,
    pub role: Role,
    #[serde(flatten)]
    pub preferences: Preferences,
}

impl SessionClaims {
    pub fn new(subject: impl Into<String>, role: Role, preferences: Preferences) -> Self {
        Self {
            subject: subject.into(),
            role,
            preferences,
        }
    }

    /// Privilege-less claims for a subject whose record could not be read.
    pub fn defaults_for(subject: impl Into<String>) -> Self {
        Self::new(subject, Role::default(), Preferences::default())
    }

    pub fn to_token_claims(&self, iat: usize, exp: usize) -> TokenClaims {
        TokenClaims {
            sub: self.subject.clone(),
            role: Some(Value::String(self.role.as_str().to_string())),
            theme_preference: Some(Value::String(
                self.preferences.theme_preference.as_str().to_string(),
            )),
            color_theme_preference: Some(Value::String(
                self.preferences.color_theme_preference.as_str().to_string(),
            )),
            language_preference: Some(Value::String(
                self.preferences.language_preference.as_str().to_string(),
            )),
            iat,
            exp,
        }
    }
}

// ---------------------------------------------------------------------------
// Client-triggered claim update
// ---------------------------------------------------------------------------

/// Lenient parse of a client "update" trigger.
///
/// Present and valid preference fields are collected; every other key,
/// including `role`, lands in `ignored`. Unlike the settings endpoint this
/// never fails: an update trigger that carries nothing usable is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsUpdate {
    pub preferences: PreferenceUpdate,
    pub ignored: Vec<String>,
}

impl ClaimsUpdate {
    pub fn from_value(value: &Value) -> Self {
        let mut update = Self::default();

        let Some(object) = value.as_object() else {
            return update;
        };

        for (key, raw) in object {
            let text = raw.as_str();
            let accepted = match key.as_str() {
                "theme" | "themePreference" => text
                    .and_then(Theme::parse)
                    .map(|t| update.preferences.theme = Some(t))
                    .is_some(),
                "colorTheme" | "colorThemePreference" => text
                    .and_then(ColorTheme::parse)
                    .map(|c| update.preferences.color_theme = Some(c))
                    .is_some(),
                "language" | "languagePreference" => text
                    .and_then(Language::parse)
                    .map(|l| update.preferences.language = Some(l))
                    .is_some(),
                _ => false,
            };

            if !accepted {
                update.ignored.push(key.clone());
            }
        }

        update.ignored.sort();
        update
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims() -> SessionClaims {
        SessionClaims::new(
            "3f1c",
            Role::Staff,
            Preferences {
                theme_preference: Theme::Dark,
                color_theme_preference: ColorTheme::Apricot,
                language_preference: Language::Th,
            },
        )
    }

    #[test]
    fn token_claims_carry_flat_camel_case_keys() {
        let json = serde_json::to_value(claims().to_token_claims(1, 2)).unwrap();
        assert_eq!(json["sub"], "3f1c");
        assert_eq!(json["role"], "STAFF");
        assert_eq!(json["themePreference"], "dark");
        assert_eq!(json["colorThemePreference"], "apricot");
        assert_eq!(json["languagePreference"], "th");
    }

    #[test]
    fn missing_role_is_not_well_formed() {
        let token: TokenClaims =
            serde_json::from_value(json!({"sub": "a", "iat": 1, "exp": 2})).unwrap();
        assert_eq!(token.role(), None);
        assert!(!token.is_well_formed());
        assert_eq!(token.preferences(), Preferences::default());
    }

    #[test]
    fn wrong_typed_role_still_decodes() {
        let token: TokenClaims =
            serde_json::from_value(json!({"sub": "a", "role": 7, "iat": 1, "exp": 2})).unwrap();
        assert_eq!(token.role(), None);
    }

    #[test]
    fn update_ignores_role_and_unknown_values() {
        let update = ClaimsUpdate::from_value(&json!({
            "role": "ADMIN",
            "theme": "light",
            "language": "klingon",
            "extra": true
        }));
        assert_eq!(update.preferences.theme, Some(Theme::Light));
        assert_eq!(update.preferences.language, None);
        assert_eq!(update.ignored, vec!["extra", "language", "role"]);
    }

    #[test]
    fn update_from_non_object_is_empty() {
        assert!(ClaimsUpdate::from_value(&json!("dark")).is_empty());
    }
}
