use serde::{Deserialize, Serialize};

/// Coarse device class derived from the user-agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
    Bot,
    #[default]
    Unknown,
}

/// Geographic hints supplied by an edge proxy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeoHint {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

/// Audit record of the device behind the most recent successful login.
///
/// Informational only; nothing in the access-control path reads it. String
/// fields are trimmed and empty strings are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub ua: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub device_type: DeviceType,
    pub ip: Option<String>,
    pub geo: GeoHint,
}

/// Trim, mapping empty results to `None`.
pub fn normalize_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl DeviceSnapshot {
    /// Re-apply the normalisation invariant, e.g. after decoding a stored row.
    pub fn normalized(self) -> Self {
        Self {
            ua: normalize_field(self.ua.as_deref()),
            os: normalize_field(self.os.as_deref()),
            browser: normalize_field(self.browser.as_deref()),
            device_type: self.device_type,
            ip: normalize_field(self.ip.as_deref()),
            geo: GeoHint {
                country: normalize_field(self.geo.country.as_deref()),
                region: normalize_field(self.geo.region.as_deref()),
                city: normalize_field(self.geo.city.as_deref()),
            },
        }
    }
}
