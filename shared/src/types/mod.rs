pub mod claims;
pub mod device;
pub mod identity;
pub mod json_error;
pub mod login;
pub mod preferences;
pub mod register;
pub mod role;
pub mod server_config;
pub mod settings;

pub use self::claims::{ClaimsUpdate, SessionClaims, TokenClaims};
pub use self::device::{DeviceSnapshot, DeviceType, GeoHint};
pub use self::identity::{Identity, RoleChange, RoleChangeData};
pub use self::json_error::ErrorResponse;
pub use self::login::{LoginData, LoginResponse, SessionResponse};
pub use self::preferences::{
    ColorTheme, Language, PreferenceError, PreferenceUpdate, Preferences, PreferencesPayload,
    Theme,
};
pub use self::register::{RegistrationData, RegistrationResponse};
pub use self::role::{DEFAULT_USER_ROLE, Role, USER_ROLES, UnknownRole};
pub use self::server_config::{AppConfig, ConfigError, RouteRuleConfig};
pub use self::settings::SettingsResponse;
