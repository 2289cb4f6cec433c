//! Server configuration, loaded from environment variables at startup.

use std::path::PathBuf;
use std::time::Duration;

use edith_gemini::prompt::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Runtime configuration for edith-server.
///
/// Every field has a default; without `GEMINI_API_KEY` the server still
/// starts but answers every proxy call with a configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind, `EDITH_BIND_HOST:PORT` (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Credential for the generative-language API.
    pub gemini_api_key: Option<String>,

    /// API root, without the `/models/...` suffix.
    pub gemini_base_url: String,

    pub gemini_model: String,

    /// Total timeout for one upstream call.
    pub upstream_timeout: Duration,

    /// Directory of static client assets; served only when it exists.
    pub static_dir: PathBuf,

    /// Comma-separated list of allowed CORS origins; `None` allows any.
    pub cors_allowed_origins: Option<String>,

    /// Serve the OpenAPI document at `/api-docs/openapi.json`.
    pub enable_docs: bool,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_BASE_URL.to_owned(),
            gemini_model: DEFAULT_MODEL.to_owned(),
            upstream_timeout: Duration::from_secs(60),
            static_dir: PathBuf::from("public"),
            cors_allowed_origins: None,
            enable_docs: true,
            log_level: "info".to_owned(),
            log_json: false,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let host = env_or("EDITH_BIND_HOST", "0.0.0.0");
        let port: u16 = parse_env("PORT", 3000);
        Self {
            bind_address: format!("{host}:{port}"),
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            gemini_base_url: env_or("EDITH_GEMINI_BASE_URL", DEFAULT_BASE_URL),
            gemini_model: env_or("EDITH_GEMINI_MODEL", DEFAULT_MODEL),
            upstream_timeout: Duration::from_secs(parse_env("EDITH_UPSTREAM_TIMEOUT_SECS", 60)),
            static_dir: PathBuf::from(env_or("EDITH_STATIC_DIR", "public")),
            cors_allowed_origins: env_opt("EDITH_CORS_ORIGINS"),
            enable_docs: env_flag("EDITH_ENABLE_DOCS", true),
            log_level: env_or("EDITH_LOG", "info"),
            log_json: env_flag("EDITH_LOG_JSON", false),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
