//! Environment-derived defaults, read once per process.

use std::path::PathBuf;
use std::sync::OnceLock;

use crate::scan::BrowserKind;

fn parse_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

static SETTINGS_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

/// JSON file backing persistent settings and history (`QR_LITE_SETTINGS`)
pub fn settings_path() -> Option<PathBuf> {
    SETTINGS_PATH
        .get_or_init(|| parse_env_path("QR_LITE_SETTINGS"))
        .clone()
}

static RASTER_SIZE: OnceLock<u32> = OnceLock::new();

/// Side of generated PNG images in pixels (`QR_LITE_RASTER_SIZE`)
pub fn raster_size() -> u32 {
    *RASTER_SIZE.get_or_init(|| parse_env_u32("QR_LITE_RASTER_SIZE", 500).clamp(16, 8192))
}

static QUIET_ZONE: OnceLock<u32> = OnceLock::new();

/// Quiet zone in modules (`QR_LITE_QUIET_ZONE`)
pub fn quiet_zone() -> u32 {
    *QUIET_ZONE.get_or_init(|| parse_env_u32("QR_LITE_QUIET_ZONE", 4).clamp(0, 16))
}

static BROWSER: OnceLock<BrowserKind> = OnceLock::new();

/// Capture API flavour (`QR_LITE_BROWSER`: `firefox` or `chromium`)
pub fn browser() -> BrowserKind {
    *BROWSER.get_or_init(|| {
        std::env::var("QR_LITE_BROWSER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    })
}
