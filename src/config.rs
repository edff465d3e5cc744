//! Runtime configuration from the environment.
//!
//! Values come from process env vars, optionally seeded from a `.env` file
//! via `dotenvy`. Nothing is written back; there is no settings store.

use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 1314;
pub const DEFAULT_ENDPOINT: &str = "/api/eye/inject";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_HOTKEY: &str = "Alt+Shift+S";
pub const DEFAULT_PREVIEW_PIXELS: u64 = 1_500_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EyeConfig {
    pub host: String,
    pub port: u16,
    pub endpoint: String,
    pub timeout: Duration,
    pub hotkey: String,
    pub preview_pixels: u64,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            hotkey: DEFAULT_HOTKEY.to_string(),
            preview_pixels: DEFAULT_PREVIEW_PIXELS,
        }
    }
}

impl EyeConfig {
    /// Loads `.env` (if present) and reads `DESKTOP_EYE_*` variables.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            log::info!("[CONFIG] Loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Missing or malformed
    /// values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = non_empty(lookup("DESKTOP_EYE_HOST")) {
            config.host = host;
        }
        if let Some(port) = parsed(&lookup, "DESKTOP_EYE_PORT") {
            config.port = port;
        }
        if let Some(endpoint) = non_empty(lookup("DESKTOP_EYE_ENDPOINT")) {
            config.endpoint = if endpoint.starts_with('/') {
                endpoint
            } else {
                format!("/{}", endpoint)
            };
        }
        if let Some(secs) = parsed::<u64>(&lookup, "DESKTOP_EYE_TIMEOUT_SECS") {
            if secs > 0 {
                config.timeout = Duration::from_secs(secs);
            }
        }
        if let Some(hotkey) = non_empty(lookup("DESKTOP_EYE_HOTKEY")) {
            config.hotkey = hotkey;
        }
        if let Some(pixels) = parsed(&lookup, "DESKTOP_EYE_PREVIEW_PIXELS") {
            config.preview_pixels = pixels;
        }

        config
    }

    /// Full URL of the inject endpoint.
    pub fn inject_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.endpoint)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = non_empty(lookup(key))?;
    match raw.replace('_', "").parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[CONFIG] Ignoring invalid {}={:?}, using default", key, raw);
            None
        }
    }
}
