//! Typed repositories over the document store.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use ekos_models::{
    Analytics, ContentId, Publication, PublicationId, SystemSettings, Task, Trend, TrendId,
    SETTINGS_ID,
};

use crate::document::{DocumentStore, StoredDocument};
use crate::error::{StoreError, StoreResult};
use crate::metrics::{record_operation, record_retry};

/// Maximum compare-and-swap attempts for one update.
pub const MAX_UPDATE_RETRIES: u32 = 5;

/// Base delay between retries, multiplied by the attempt number.
pub const RETRY_BASE_DELAY_MS: u64 = 50;

/// A document type with a collection, an id and a store version.
pub trait Versioned: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn doc_id(&self) -> String;
    fn set_version(&mut self, version: u64);
}

macro_rules! versioned {
    ($ty:ty, $collection:literal) => {
        impl Versioned for $ty {
            const COLLECTION: &'static str = $collection;

            fn doc_id(&self) -> String {
                self.id.to_string()
            }

            fn set_version(&mut self, version: u64) {
                self.version = version;
            }
        }
    };
}

versioned!(Task, "tasks");
versioned!(ekos_models::Content, "content");
versioned!(Publication, "publications");
versioned!(Trend, "trends");
versioned!(SystemSettings, "settings");

impl Versioned for Analytics {
    const COLLECTION: &'static str = "analytics";

    fn doc_id(&self) -> String {
        self.id.clone()
    }

    fn set_version(&mut self, _version: u64) {}
}

/// Generic repository for one document type.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Versioned> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn decode(doc: StoredDocument) -> StoreResult<T> {
        let mut value: T = serde_json::from_value(doc.data)?;
        value.set_version(doc.version);
        Ok(value)
    }

    fn observe<R>(operation: &str, started: Instant, result: &StoreResult<R>) {
        record_operation(
            T::COLLECTION,
            operation,
            result.is_ok(),
            started.elapsed().as_secs_f64() * 1000.0,
        );
    }

    /// Fetch a document, or `None` if it does not exist.
    pub async fn find(&self, id: &str) -> StoreResult<Option<T>> {
        let started = Instant::now();
        let result = self.store.get(T::COLLECTION, id).await;
        Self::observe("get", started, &result);
        result?.map(Self::decode).transpose()
    }

    /// Fetch a document, failing with `NotFound` if missing.
    pub async fn get(&self, id: &str) -> StoreResult<T> {
        self.find(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("{}/{}", T::COLLECTION, id)))
    }

    /// Insert a new document.
    pub async fn create(&self, value: &T) -> StoreResult<T> {
        let started = Instant::now();
        let result = self
            .store
            .create(T::COLLECTION, &value.doc_id(), serde_json::to_value(value)?)
            .await;
        Self::observe("create", started, &result);
        Self::decode(result?)
    }

    /// Unconditionally write a document.
    pub async fn put(&self, value: &T) -> StoreResult<T> {
        let started = Instant::now();
        let result = self
            .store
            .put(T::COLLECTION, &value.doc_id(), serde_json::to_value(value)?)
            .await;
        Self::observe("put", started, &result);
        Self::decode(result?)
    }

    /// Compare-and-swap write against the version the caller read.
    pub async fn replace(&self, value: &T, expected_version: u64) -> StoreResult<T> {
        let started = Instant::now();
        let result = self
            .store
            .replace(
                T::COLLECTION,
                &value.doc_id(),
                serde_json::to_value(value)?,
                expected_version,
            )
            .await;
        Self::observe("replace", started, &result);
        Self::decode(result?)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let started = Instant::now();
        let result = self.store.delete(T::COLLECTION, id).await;
        Self::observe("delete", started, &result);
        result
    }

    /// Every document in the collection. Undecodable documents are skipped.
    pub async fn list(&self) -> StoreResult<Vec<T>> {
        let started = Instant::now();
        let result = self.store.list(T::COLLECTION).await;
        Self::observe("list", started, &result);

        let mut values = Vec::new();
        for doc in result? {
            let id = doc.id.clone();
            match Self::decode(doc) {
                Ok(v) => values.push(v),
                Err(e) => warn!(collection = T::COLLECTION, id = %id, error = %e, "Skipping undecodable document"),
            }
        }
        Ok(values)
    }

    /// Read-modify-write with optimistic locking.
    ///
    /// `mutate` is re-applied to a fresh copy after every version conflict.
    /// An error from `mutate` aborts the update without writing.
    pub async fn update<F>(&self, id: &str, mut mutate: F) -> StoreResult<T>
    where
        F: FnMut(&mut T) -> StoreResult<()> + Send,
    {
        let mut last_error = None;

        for attempt in 0..MAX_UPDATE_RETRIES {
            let doc = self
                .store
                .get(T::COLLECTION, id)
                .await?
                .ok_or_else(|| StoreError::not_found(format!("{}/{}", T::COLLECTION, id)))?;
            let version = doc.version;
            let mut value = Self::decode(doc)?;

            mutate(&mut value)?;

            let started = Instant::now();
            let result = self
                .store
                .replace(T::COLLECTION, id, serde_json::to_value(&value)?, version)
                .await;
            Self::observe("replace", started, &result);

            match result {
                Ok(stored) => {
                    value.set_version(stored.version);
                    return Ok(value);
                }
                Err(e) if e.is_precondition_failed() => {
                    debug!(
                        collection = T::COLLECTION,
                        id,
                        attempt = attempt + 1,
                        "Version conflict, retrying"
                    );
                    record_retry(T::COLLECTION);
                    last_error = Some(e);
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS * (attempt as u64 + 1));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            collection = T::COLLECTION,
            id,
            retries = MAX_UPDATE_RETRIES,
            error = ?last_error,
            "Update failed after retries"
        );
        Err(StoreError::conflict(format!(
            "{}/{} could not be updated due to concurrent writes",
            T::COLLECTION,
            id
        )))
    }
}

/// Publications of content on external platforms.
#[derive(Clone)]
pub struct PublicationRepository {
    repo: Repository<Publication>,
}

impl PublicationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    pub async fn create(&self, publication: &Publication) -> StoreResult<Publication> {
        self.repo.create(publication).await
    }

    pub async fn get(&self, id: &PublicationId) -> StoreResult<Publication> {
        self.repo.get(id.as_str()).await
    }

    /// Newest first.
    pub async fn list(&self, limit: usize) -> StoreResult<Vec<Publication>> {
        let mut all = self.repo.list().await?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all.truncate(limit);
        Ok(all)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<Publication>> {
        self.repo.list().await
    }

    pub async fn list_for_content(&self, content_id: &ContentId) -> StoreResult<Vec<Publication>> {
        let mut all = self.repo.list().await?;
        all.retain(|p| &p.content_id == content_id);
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

/// Collected trends.
#[derive(Clone)]
pub struct TrendRepository {
    repo: Repository<Trend>,
}

impl TrendRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// Store a batch of trends, returning the number written.
    pub async fn save_all(&self, trends: &[Trend]) -> StoreResult<usize> {
        for trend in trends {
            self.repo.put(trend).await?;
        }
        Ok(trends.len())
    }

    pub async fn get(&self, id: &TrendId) -> StoreResult<Trend> {
        self.repo.get(id.as_str()).await
    }

    /// Most recently discovered first.
    pub async fn recent(&self, limit: usize) -> StoreResult<Vec<Trend>> {
        let mut all = self.repo.list().await?;
        all.sort_by(|a, b| b.discovered_at.cmp(&a.discovered_at));
        all.truncate(limit);
        Ok(all)
    }

    /// Highest popularity first.
    pub async fn popular(&self, limit: usize) -> StoreResult<Vec<Trend>> {
        let mut all = self.repo.list().await?;
        all.sort_by(|a, b| b.popularity_score.total_cmp(&a.popularity_score));
        all.truncate(limit);
        Ok(all)
    }
}

/// Daily analytics records.
#[derive(Clone)]
pub struct AnalyticsRepository {
    repo: Repository<Analytics>,
}

impl AnalyticsRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    pub async fn record(&self, analytics: &Analytics) -> StoreResult<Analytics> {
        self.repo.put(analytics).await
    }

    pub async fn list(&self) -> StoreResult<Vec<Analytics>> {
        self.repo.list().await
    }
}

/// The system settings singleton.
#[derive(Clone)]
pub struct SettingsRepository {
    repo: Repository<SystemSettings>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// Stored settings, or defaults if none were saved yet.
    pub async fn get(&self) -> StoreResult<SystemSettings> {
        Ok(self.repo.find(SETTINGS_ID).await?.unwrap_or_default())
    }

    /// Replace the stored settings.
    pub async fn save(&self, mut settings: SystemSettings) -> StoreResult<SystemSettings> {
        settings.id = SETTINGS_ID.to_string();
        settings.updated_at = Utc::now();
        self.repo.put(&settings).await
    }
}
