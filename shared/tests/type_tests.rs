/// Integration-level tests for the `shared` crate.
///
/// Each section tests one module; unit tests that are tightly coupled to
/// private helpers live inside the modules themselves (see `#[cfg(test)]`
/// blocks in `claims.rs` and `preferences.rs`).
// ---------------------------------------------------------------------------
// Role registry
// ---------------------------------------------------------------------------
#[cfg(test)]
mod role_tests {
    use shared::types::role::{default_role, is_valid_role};
    use shared::types::*;

    #[test]
    fn registry_is_closed_and_ordered() {
        assert_eq!(USER_ROLES, [Role::Admin, Role::Staff, Role::User]);
        assert_eq!(DEFAULT_USER_ROLE, Role::User);
        assert_eq!(default_role(), Role::User);
    }

    #[test]
    fn role_names_are_case_sensitive() {
        assert!(is_valid_role("ADMIN"));
        assert!(is_valid_role("STAFF"));
        assert!(!is_valid_role("admin"));
        assert!(!is_valid_role("SUPERUSER"));
        assert!(!is_valid_role(""));
    }

    #[test]
    fn unknown_stored_role_resolves_to_default() {
        assert_eq!(Role::resolve(Some("SUPERUSER")), Role::User);
        assert_eq!(Role::resolve(None), Role::User);
        assert_eq!(Role::resolve(Some("STAFF")), Role::Staff);
    }

    #[test]
    fn role_serializes_uppercase() {
        let json = serde_json::to_value(Role::Staff).unwrap();
        assert_eq!(json, "STAFF");
        let back: Role = serde_json::from_str(r#""ADMIN""#).unwrap();
        assert_eq!(back, Role::Admin);
    }

    #[test]
    fn from_str_reports_the_rejected_value() {
        let err = "root".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("root".to_string()));
        assert_eq!(err.to_string(), "unknown role: root");
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[cfg(test)]
mod preferences_tests {
    use shared::types::*;

    #[test]
    fn payload_deserializes_camel_case() {
        let p: PreferencesPayload =
            serde_json::from_str(r#"{"theme":"dark","colorTheme":"apricot"}"#).unwrap();
        assert_eq!(p.theme.as_deref(), Some("dark"));
        assert_eq!(p.color_theme.as_deref(), Some("apricot"));
        assert!(p.language.is_none());
    }

    #[test]
    fn empty_payload_is_rejected() {
        let p = PreferencesPayload::default();
        assert_eq!(p.validate(), Err(PreferenceError::NothingToUpdate));
        assert_eq!(
            PreferenceError::NothingToUpdate.to_string(),
            "Nothing to update"
        );
    }

    #[test]
    fn one_invalid_value_rejects_the_whole_payload() {
        let p = PreferencesPayload {
            theme: Some("dark".into()),
            color_theme: Some("neon".into()),
            language: None,
        };
        match p.validate() {
            Err(PreferenceError::InvalidValue { field, value }) => {
                assert_eq!(field, "colorTheme");
                assert_eq!(value, "neon");
            }
            other => panic!("expected invalid value, got {:?}", other),
        }
    }

    #[test]
    fn partial_update_only_touches_present_fields() {
        let update = PreferencesPayload {
            language: Some("th".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        let mut prefs = Preferences {
            theme_preference: Theme::Dark,
            ..Default::default()
        };
        prefs.apply(&update);
        assert_eq!(prefs.theme_preference, Theme::Dark);
        assert_eq!(prefs.color_theme_preference, ColorTheme::Neutral);
        assert_eq!(prefs.language_preference, Language::Th);
    }

    #[test]
    fn preferences_serialize_with_claim_names() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["themePreference"], "system");
        assert_eq!(json["colorThemePreference"], "neutral");
        assert_eq!(json["languagePreference"], "en");
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[cfg(test)]
mod claims_tests {
    use serde_json::json;
    use shared::types::*;

    #[test]
    fn session_claims_flatten_preferences() {
        let claims = SessionClaims::defaults_for("u-1");
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["subject"], "u-1");
        assert_eq!(json["role"], "USER");
        assert_eq!(json["themePreference"], "system");
    }

    #[test]
    fn minted_token_claims_are_well_formed() {
        let claims = SessionClaims::new("u-1", Role::Admin, Preferences::default());
        let token = claims.to_token_claims(100, 200);
        assert!(token.is_well_formed());
        assert_eq!(token.role(), Some(Role::Admin));
        assert_eq!(token.iat, 100);
        assert_eq!(token.exp, 200);
    }

    #[test]
    fn invalid_preference_claim_is_not_well_formed_but_coerces() {
        let token: TokenClaims = serde_json::from_value(json!({
            "sub": "u-1",
            "role": "STAFF",
            "themePreference": "sepia",
            "colorThemePreference": "apricot",
            "languagePreference": "th",
            "iat": 1,
            "exp": 2
        }))
        .unwrap();
        assert!(!token.is_well_formed());
        let prefs = token.preferences();
        assert_eq!(prefs.theme_preference, Theme::System);
        assert_eq!(prefs.color_theme_preference, ColorTheme::Apricot);
        assert_eq!(prefs.language_preference, Language::Th);
    }

    #[test]
    fn update_accepts_both_key_spellings() {
        let update = ClaimsUpdate::from_value(&json!({
            "themePreference": "light",
            "colorTheme": "apricot"
        }));
        assert_eq!(update.preferences.theme, Some(Theme::Light));
        assert_eq!(update.preferences.color_theme, Some(ColorTheme::Apricot));
        assert!(update.ignored.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Login / registration types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod login_tests {
    use shared::types::*;

    #[test]
    fn login_data_deserializes_email() {
        let json = r#"{"email":"a@x.com","password":"secret1"}"#;
        let d: LoginData = serde_json::from_str(json).unwrap();
        assert_eq!(d.email, "a@x.com");
    }

    #[test]
    fn login_data_username_alias_maps_to_email() {
        let json = r#"{"username":"a@x.com","password":"secret1"}"#;
        let d: LoginData = serde_json::from_str(json).unwrap();
        assert_eq!(d.email, "a@x.com");
    }

    #[test]
    fn login_data_debug_redacts_password() {
        let d = LoginData {
            email: "a@x.com".into(),
            password: "secret1".into(),
        };
        let out = format!("{:?}", d);
        assert!(out.contains("a@x.com"));
        assert!(!out.contains("secret1"));
    }

    #[test]
    fn registration_debug_redacts_password() {
        let d: RegistrationData =
            serde_json::from_str(r#"{"name":"A","email":"a@x.com","password":"hunter22"}"#)
                .unwrap();
        assert!(!format!("{:?}", d).contains("hunter22"));
    }

    #[test]
    fn register_response_success_has_redirect_field() {
        let r = RegistrationResponse::Success {
            user_id: "id-1".into(),
            email: "a@x.com".into(),
            message: "Account created".into(),
            redirect: "/login".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["redirect"], "/login");
    }

    #[test]
    fn session_response_error_serializes_status() {
        let r = SessionResponse::Error {
            code: "UNAUTHORIZED".into(),
            message: "Not signed in".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "UNAUTHORIZED");
    }

    #[test]
    fn settings_response_carries_resolved_values() {
        let r = SettingsResponse::Success {
            settings: Preferences::default(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["settings"]["languagePreference"], "en");
    }
}

// ---------------------------------------------------------------------------
// JSON error type
// ---------------------------------------------------------------------------

#[cfg(test)]
mod json_error_tests {
    use shared::types::*;

    #[test]
    fn error_response_new_sets_status_to_error() {
        let e = ErrorResponse::new("NOT_FOUND", "resource missing");
        assert_eq!(e.status, "error");
        assert_eq!(e.code, "NOT_FOUND");
        assert_eq!(e.message, "resource missing");
    }

    #[test]
    fn error_response_serializes_correctly() {
        let e = ErrorResponse::new("FORBIDDEN", "access denied");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "FORBIDDEN");
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[cfg(test)]
mod config_tests {
    use shared::config::{load_config, parse_config};
    use shared::types::*;
    use std::io::Write;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn minimal() -> String {
        format!(
            r#"
[server]
bind = "127.0.0.1"

[database]
url = "sqlite::memory:"

[auth]
jwt_secret = "{}"
"#,
            SECRET
        )
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = parse_config(&minimal()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.addr(), "127.0.0.1:3000");
        assert_eq!(config.auth.token_expiry_secs(), 3600);
        assert_eq!(config.auth.cookie_name, "session_token");
        assert_eq!(config.access.login_path, "/login");
        assert_eq!(config.access.landing_path, "/dashboard");
        assert_eq!(config.access.rules.len(), 3);
        assert_eq!(config.access.rules[0].prefix, "/dashboard/admin");
        assert_eq!(config.access.rules[0].roles, vec![Role::Admin]);
    }

    #[test]
    fn empty_file_is_rejected() {
        assert!(matches!(
            parse_config("   \n"),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_expiry_is_rejected() {
        let text = minimal().replace("[auth]", "[auth]\ntoken_expiry_minutes = 0");
        assert!(matches!(
            parse_config(&text),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rule_without_roles_is_rejected() {
        let text = format!(
            "{}\n[access]\nrules = [{{ prefix = \"/dashboard\", roles = [] }}]\n",
            minimal()
        );
        assert!(matches!(
            parse_config(&text),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_role_in_rule_fails_to_parse() {
        let text = format!(
            "{}\n[access]\nrules = [{{ prefix = \"/dashboard\", roles = [\"ROOT\"] }}]\n",
            minimal()
        );
        assert!(matches!(
            parse_config(&text),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn short_secret_is_rejected() {
        // An operator-provided JWT_SECRET would take priority over the file.
        if std::env::var("JWT_SECRET").is_ok() {
            return;
        }
        let text = minimal().replace(SECRET, "too-short");
        assert!(matches!(
            parse_config(&text),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_config_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(minimal().as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = load_config(&path).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            load_config(path.to_str().unwrap()),
            Err(ConfigError::Io(_))
        ));
    }
}
