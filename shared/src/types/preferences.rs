use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Closed preference enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Neutral,
    Apricot,
}

/// Interface language. Doubles as the supported locale set for localized
/// routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Th,
}

pub const THEMES: [Theme; 3] = [Theme::System, Theme::Light, Theme::Dark];
pub const COLOR_THEMES: [ColorTheme; 2] = [ColorTheme::Neutral, ColorTheme::Apricot];
pub const SUPPORTED_LOCALES: [Language; 2] = [Language::En, Language::Th];

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        THEMES.into_iter().find(|t| t.as_str() == value)
    }
}

impl ColorTheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Apricot => "apricot",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        COLOR_THEMES.into_iter().find(|c| c.as_str() == value)
    }
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Th => "th",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        SUPPORTED_LOCALES.into_iter().find(|l| l.as_str() == value)
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Resolved preferences
// ---------------------------------------------------------------------------

/// The three per-user UI preferences, always holding valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme_preference: Theme,
    pub color_theme_preference: ColorTheme,
    pub language_preference: Language,
}

impl Preferences {
    /// Coercing read from raw column values; each unknown value becomes its
    /// default independently of the others.
    pub fn resolve(theme: Option<&str>, color_theme: Option<&str>, language: Option<&str>) -> Self {
        Self {
            theme_preference: theme.and_then(Theme::parse).unwrap_or_default(),
            color_theme_preference: color_theme.and_then(ColorTheme::parse).unwrap_or_default(),
            language_preference: language.and_then(Language::parse).unwrap_or_default(),
        }
    }

    /// Same coercion for untyped JSON values (decoded claims).
    pub fn resolve_values(
        theme: Option<&Value>,
        color_theme: Option<&Value>,
        language: Option<&Value>,
    ) -> Self {
        Self::resolve(
            theme.and_then(Value::as_str),
            color_theme.and_then(Value::as_str),
            language.and_then(Value::as_str),
        )
    }

    pub fn apply(&mut self, update: &PreferenceUpdate) {
        if let Some(theme) = update.theme {
            self.theme_preference = theme;
        }
        if let Some(color_theme) = update.color_theme {
            self.color_theme_preference = color_theme;
        }
        if let Some(language) = update.language {
            self.language_preference = language;
        }
    }
}

// ---------------------------------------------------------------------------
// Preference update payload
// ---------------------------------------------------------------------------

/// Body of `PATCH /api/settings`. Values stay raw strings until
/// [`PreferencesPayload::validate`] runs so that an invalid value can be
/// reported instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPayload {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub color_theme: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// A validated partial update. At least one field is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreferenceUpdate {
    pub theme: Option<Theme>,
    pub color_theme: Option<ColorTheme>,
    pub language: Option<Language>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("Nothing to update")]
    NothingToUpdate,
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl PreferencesPayload {
    /// Strict validation: any present-but-unknown value rejects the whole
    /// payload, and an all-absent payload is rejected as empty.
    pub fn validate(&self) -> Result<PreferenceUpdate, PreferenceError> {
        if self.theme.is_none() && self.color_theme.is_none() && self.language.is_none() {
            return Err(PreferenceError::NothingToUpdate);
        }

        let theme = strict(self.theme.as_deref(), "theme", Theme::parse)?;
        let color_theme = strict(self.color_theme.as_deref(), "colorTheme", ColorTheme::parse)?;
        let language = strict(self.language.as_deref(), "language", Language::parse)?;

        Ok(PreferenceUpdate {
            theme,
            color_theme,
            language,
        })
    }
}

fn strict<T>(
    value: Option<&str>,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, PreferenceError> {
    match value {
        None => Ok(None),
        Some(raw) => parse(raw).map(Some).ok_or_else(|| PreferenceError::InvalidValue {
            field,
            value: raw.to_string(),
        }),
    }
}

impl PreferenceUpdate {
    pub fn is_empty(&self) -> bool {
        self.theme.is_none() && self.color_theme.is_none() && self.language.is_none()
    }
}
