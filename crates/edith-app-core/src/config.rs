//! Client configuration, loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::auth::firebase::DEFAULT_IDENTITY_BASE_URL;
use crate::cache::LocalCache;

/// Runtime configuration for the EDITH client.
///
/// Every field has a default so the client runs without any environment
/// variables set (identity calls then fail with "not configured").
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the proxy server (default: `"http://localhost:3000"`).
    pub server_url: String,

    /// Identity Toolkit web API key.
    pub firebase_api_key: Option<String>,

    /// Identity Toolkit root (default: the public v1 endpoint).
    pub identity_base_url: String,

    /// sqlx SQLite URL of the document store.
    pub database_url: String,

    /// Location of the local cache file.
    pub cache_path: PathBuf,

    /// Where password-reset links should land.
    pub reset_continue_url: Option<String>,

    /// Total timeout for one proxy call.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build [`ClientConfig`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            server_url: env_or("EDITH_SERVER_URL", "http://localhost:3000"),
            firebase_api_key: env_opt("FIREBASE_API_KEY"),
            identity_base_url: env_or("EDITH_IDENTITY_BASE_URL", DEFAULT_IDENTITY_BASE_URL),
            database_url: std::env::var("EDITH_DATABASE_URL")
                .unwrap_or_else(|_| default_database_url()),
            cache_path: env_opt("EDITH_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(LocalCache::default_path),
            reset_continue_url: env_opt("EDITH_RESET_CONTINUE_URL"),
            request_timeout: Duration::from_secs(parse_env("EDITH_REQUEST_TIMEOUT_SECS", 60)),
        }
    }
}

fn default_database_url() -> String {
    let path = dirs_next::data_dir()
        .map(|d| d.join("edith").join("edith.db"))
        .unwrap_or_else(|| PathBuf::from("edith.db"));
    format!("sqlite://{}?mode=rwc", path.display())
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
