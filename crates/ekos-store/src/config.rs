//! Store configuration.

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
    /// Key prefix for every document key
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            namespace: "ekos".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create config from environment variables.
    ///
    /// `STORE_BACKEND` defaults to `redis` when `REDIS_URL` is set and to
    /// `memory` otherwise.
    pub fn from_env() -> Self {
        let redis_url = std::env::var("REDIS_URL").ok();
        let backend = match std::env::var("STORE_BACKEND").ok().as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("redis") => StoreBackend::Redis,
            _ if redis_url.is_some() => StoreBackend::Redis,
            _ => StoreBackend::Memory,
        };

        Self {
            backend,
            redis_url: redis_url.unwrap_or_else(|| "redis://localhost:6379".to_string()),
            namespace: std::env::var("STORE_NAMESPACE").unwrap_or_else(|_| "ekos".to_string()),
        }
    }
}
