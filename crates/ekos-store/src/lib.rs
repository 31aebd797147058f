//! Versioned document storage for the content pipeline.
//!
//! This crate provides:
//! - A [`DocumentStore`] abstraction with Redis and in-memory backends
//! - Compare-and-swap writes on a per-document version
//! - Typed repositories with an optimistic retry loop
//! - The [`TaskTracker`] enforcing the task status lifecycle
//! - Single-writer claims for generated content artifacts

pub mod config;
pub mod content_repo;
pub mod document;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod redis_store;
pub mod repos;
pub mod tracker;

use std::sync::Arc;

pub use config::{StoreBackend, StoreConfig};
pub use content_repo::{Artifact, ContentRepository};
pub use document::{DocumentStore, StoredDocument};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use repos::{
    AnalyticsRepository, PublicationRepository, Repository, SettingsRepository, TrendRepository,
    Versioned,
};
pub use tracker::TaskTracker;

/// Open the store selected by `config`.
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Redis => {
            let store = RedisStore::new(&config.redis_url, &config.namespace)?;
            store.ping().await?;
            Ok(Arc::new(store))
        }
    }
}
