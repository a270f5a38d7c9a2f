use serde::Serialize;

use crate::types::preferences::Preferences;

/// Settings response
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SettingsResponse {
    Success { settings: Preferences },
    Error { code: String, message: String },
}
