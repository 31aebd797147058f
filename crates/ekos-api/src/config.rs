//! HTTP server settings read from the environment.

use std::str::FromStr;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Allowed origins; `*` allows any.
    pub cors_origins: Vec<String>,
    /// Sustained requests per second allowed per client IP.
    pub rate_limit_rps: u32,
    pub rate_limit_burst: u32,
    /// Largest accepted request body in bytes.
    pub max_body_size: usize,
    /// Serve Prometheus text at `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            cors_origins: vec!["*".into()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            max_body_size: DEFAULT_BODY_LIMIT,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Overlay `API_*`, `CORS_ORIGINS`, `RATE_LIMIT_*`, `MAX_BODY_SIZE` and
    /// `METRICS_ENABLED` onto the defaults. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cors_origins = std::env::var("CORS_ORIGINS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_origins);

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins,
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.metrics_enabled),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
