//! Context cache: the single shared copy of the corpus index.
//!
//! Readers always observe either the previous fully-built index or a freshly
//! rebuilt one: a rebuild produces a new `Arc<ContextIndex>` and swaps it in.
//! The cache only goes stale until someone forces a refresh.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::context::index::ContextIndex;
use crate::corpus::Document;

/// Redis key holding the latest serialized index.
pub const INDEX_CACHE_KEY: &str = "specdeck:context:latest";

/// Persistence for the latest index, so restarts reuse the previous build.
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn load(&self) -> Result<Option<ContextIndex>>;
    async fn save(&self, index: &ContextIndex) -> Result<()>;
}

/// Stores the index as JSON under `INDEX_CACHE_KEY`.
pub struct RedisIndexStore {
    client: redis::Client,
}

impl RedisIndexStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IndexStore for RedisIndexStore {
    async fn load(&self) -> Result<Option<ContextIndex>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("Redis connection failed")?;
        let raw: Option<String> = conn.get(INDEX_CACHE_KEY).await?;
        raw.map(|json| serde_json::from_str(&json).context("Cached index is not valid JSON"))
            .transpose()
    }

    async fn save(&self, index: &ContextIndex) -> Result<()> {
        let json = serde_json::to_string(index)?;
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("Redis connection failed")?;
        conn.set::<_, _, ()>(INDEX_CACHE_KEY, json).await?;
        Ok(())
    }
}

/// Process-local store used by tests and single-node runs.
#[derive(Default)]
pub struct MemoryIndexStore {
    slot: Mutex<Option<ContextIndex>>,
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn load(&self) -> Result<Option<ContextIndex>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, index: &ContextIndex) -> Result<()> {
        *self.slot.lock().await = Some(index.clone());
        Ok(())
    }
}

pub struct ContextCache {
    current: RwLock<Option<Arc<ContextIndex>>>,
    store: Arc<dyn IndexStore>,
}

impl ContextCache {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self {
            current: RwLock::new(None),
            store,
        }
    }

    /// Returns the cached index, or builds one from `load_documents`.
    ///
    /// Lookup order: in-process copy, then the persistent store, then a full
    /// rebuild. `force_refresh` skips both caches. `load_documents` is only
    /// invoked when a rebuild actually happens. Store failures are logged and
    /// never fail the request.
    pub async fn get_or_build<F, Fut>(
        &self,
        force_refresh: bool,
        load_documents: F,
    ) -> Result<Arc<ContextIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Document>>>,
    {
        if !force_refresh {
            if let Some(index) = self.current.read().await.clone() {
                return Ok(index);
            }
            match self.store.load().await {
                Ok(Some(index)) => {
                    info!(
                        "Loaded cached context index: {} documents, {} features",
                        index.stats.document_count,
                        index.features.len()
                    );
                    let index = Arc::new(index);
                    *self.current.write().await = Some(index.clone());
                    return Ok(index);
                }
                Ok(None) => {}
                Err(e) => warn!("Context index store unavailable, rebuilding: {e:#}"),
            }
        }

        info!("Analyzing all specs (force_refresh={force_refresh})");
        let documents = load_documents().await?;
        let index = Arc::new(ContextIndex::build(&documents));

        if let Err(e) = self.store.save(&index).await {
            warn!("Failed to persist context index: {e:#}");
        }
        *self.current.write().await = Some(index.clone());

        info!(
            "Context analysis complete: {} features, {} terms",
            index.features.len(),
            index.terminology.len()
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn docs(heading: &str) -> Vec<Document> {
        vec![Document::new("spec.md", format!("## {heading}\nbody"))]
    }

    #[tokio::test]
    async fn test_cached_index_returned_without_rescan() {
        let cache = ContextCache::new(Arc::new(MemoryIndexStore::default()));
        let loads = AtomicUsize::new(0);

        let first = cache
            .get_or_build(false, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(docs("Shop"))
            })
            .await
            .unwrap();
        let second = cache
            .get_or_build(false, || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(docs("Changed"))
            })
            .await
            .unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1, "second call must hit the cache");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.features[0].name, "Shop");
    }

    #[tokio::test]
    async fn test_force_refresh_rebuilds_and_replaces() {
        let cache = ContextCache::new(Arc::new(MemoryIndexStore::default()));
        cache.get_or_build(false, || async { Ok(docs("Shop")) }).await.unwrap();

        let refreshed = cache
            .get_or_build(true, || async { Ok(docs("Battle Pass")) })
            .await
            .unwrap();
        assert_eq!(refreshed.features[0].name, "Battle Pass");

        let after = cache.get_or_build(false, || async { Ok(vec![]) }).await.unwrap();
        assert_eq!(after.features[0].name, "Battle Pass");
    }

    #[tokio::test]
    async fn test_persisted_index_reused_by_fresh_cache() {
        let store: Arc<dyn IndexStore> = Arc::new(MemoryIndexStore::default());
        ContextCache::new(store.clone())
            .get_or_build(false, || async { Ok(docs("Shop")) })
            .await
            .unwrap();

        let restarted = ContextCache::new(store);
        let index = restarted
            .get_or_build(false, || async { Ok(docs("Never loaded")) })
            .await
            .unwrap();
        assert_eq!(index.features[0].name, "Shop");
    }
}
