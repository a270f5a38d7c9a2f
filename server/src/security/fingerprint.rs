use hyper::header::HeaderMap;

use shared::types::device::normalize_field;
use shared::types::{DeviceSnapshot, DeviceType, GeoHint};

/// Build the audit snapshot of the device behind a login request.
///
/// Purely informational; nothing in the access decision reads it.
pub fn fingerprint(headers: &HeaderMap) -> DeviceSnapshot {
    let ua = header(headers, "user-agent");
    let lowered = ua.as_deref().map(str::to_lowercase);
    let lowered = lowered.as_deref();

    let ip = primary_ip(headers, "x-forwarded-for").or_else(|| primary_ip(headers, "x-real-ip"));

    let geo = GeoHint {
        country: header(headers, "x-vercel-ip-country").or_else(|| header(headers, "cf-ipcountry")),
        region: header(headers, "x-vercel-ip-country-region")
            .or_else(|| header(headers, "x-vercel-ip-region")),
        city: header(headers, "x-vercel-ip-city"),
    };

    DeviceSnapshot {
        os: lowered.and_then(detect_os).map(String::from),
        browser: lowered.and_then(detect_browser).map(String::from),
        device_type: detect_device_type(lowered),
        ua,
        ip,
        geo,
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    normalize_field(headers.get(name).and_then(|v| v.to_str().ok()))
}

fn primary_ip(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(name)?.to_str().ok()?;
    normalize_field(raw.split(',').next())
}

// Detection helpers take the lowercased user-agent.

fn detect_device_type(ua: Option<&str>) -> DeviceType {
    let Some(ua) = ua else {
        return DeviceType::Unknown;
    };

    let any = |needles: &[&str]| needles.iter().any(|n| ua.contains(n));

    if any(&["bot", "crawl", "spider", "slurp"]) {
        DeviceType::Bot
    } else if any(&["mobile", "iphone", "ipod", "android"]) {
        DeviceType::Mobile
    } else if any(&["ipad", "tablet"]) {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

fn detect_os(ua: &str) -> Option<&'static str> {
    if ua.contains("windows") {
        Some("Windows")
    } else if ua.contains("mac os") {
        Some("macOS")
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ios") {
        Some("iOS")
    } else if ua.contains("android") {
        Some("Android")
    } else if ua.contains("linux") {
        Some("Linux")
    } else if ua.contains("cros") {
        Some("ChromeOS")
    } else {
        None
    }
}

fn detect_browser(ua: &str) -> Option<&'static str> {
    if ua.contains("edg/") {
        Some("Edge")
    } else if ua.contains("opr/") || ua.contains("opera") {
        Some("Opera")
    } else if ua.contains("firefox") {
        Some("Firefox")
    } else if ua.contains("safari") && !ua.contains("chrome") {
        Some("Safari")
    } else if ua.contains("chrome") || ua.contains("crios") {
        Some("Chrome")
    } else if ua.contains("msie") || ua.contains("trident") {
        Some("Internet Explorer")
    } else {
        None
    }
}
