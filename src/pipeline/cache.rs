//! Concurrency-safe get-or-compute caches backing the pipeline.
//!
//! Every key owns a [`OnceCell`] slot. The store-wide mutex is held only long enough to find or
//! insert that slot; the compute itself runs outside the lock, so a miss on one key never stalls
//! workers touching other keys, and concurrent misses on the same key share a single compute.
//! A failed compute leaves the slot empty, so the next caller retries.
//!
//! [`CacheLayer`] groups the pipeline stores into one generation. `clear` swaps in a fresh
//! generation, which empties every store at once from an observer's point of view.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::arxiv::DocumentHandle;

/// Single-flight key/value store with unbounded, process-lifetime entries.
pub struct ComputeCache<K, V> {
    name: &'static str,
    slots: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> ComputeCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty store labelled `name` in logs and stats.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, running `compute` on a miss.
    ///
    /// At most one `compute` per key is in flight at a time; callers arriving meanwhile wait for
    /// its result. Only successful results are stored.
    pub async fn get_or_compute<E, F, Fut>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        let mut computed = false;
        let result = slot
            .get_or_try_init(|| {
                computed = true;
                compute()
            })
            .await;

        let counter = if computed { &self.misses } else { &self.hits };
        counter.fetch_add(1, Ordering::Relaxed);
        if computed {
            tracing::trace!(cache = self.name, ok = result.is_ok(), "Cache miss computed");
        }

        result.cloned()
    }

    /// Peek at a stored value without computing.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Store `value` unless the key already holds one.
    pub fn insert_if_absent(&self, key: K, value: V) {
        let slot = Arc::clone(
            self.lock()
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new())),
        );
        // Fails only when the slot is already set or being computed, both of which win.
        let _ = slot.set(value);
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    /// Whether no key holds a value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the store's size and hit/miss counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn slot(&self, key: K) -> Arc<OnceCell<V>> {
        Arc::clone(
            self.lock()
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Arc<OnceCell<V>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exact-match key for cached search results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    /// Keyword as supplied by the caller.
    pub keyword: String,
    /// Requested result count; different counts never share an entry.
    pub max_results: usize,
}

/// Key for cached summaries: content fingerprint plus length budget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SummaryKey {
    /// Fingerprint of the summarized text.
    pub fingerprint: String,
    /// Requested summary length in characters.
    pub length_budget: usize,
}

/// Size and effectiveness counters for one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Keys currently holding a value.
    pub entries: usize,
    /// Lookups served without running a compute.
    pub hits: u64,
    /// Lookups that ran a compute.
    pub misses: u64,
}

/// Per-store statistics for the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Search results keyed by `(keyword, max_results)`.
    pub search: StoreStats,
    /// Single-document metadata keyed by identifier.
    pub metadata: StoreStats,
    /// Extracted full text keyed by identifier.
    pub text: StoreStats,
    /// Summaries keyed by `(fingerprint, length_budget)`.
    pub summary: StoreStats,
}

struct CacheGeneration {
    search: ComputeCache<SearchKey, Arc<Vec<DocumentHandle>>>,
    metadata: ComputeCache<String, DocumentHandle>,
    text: ComputeCache<String, Arc<str>>,
    summary: ComputeCache<SummaryKey, Arc<str>>,
}

impl CacheGeneration {
    fn new() -> Self {
        Self {
            search: ComputeCache::new("search"),
            metadata: ComputeCache::new("metadata"),
            text: ComputeCache::new("text"),
            summary: ComputeCache::new("summary"),
        }
    }
}

/// The pipeline's caches, cleared together.
pub struct CacheLayer {
    generation: RwLock<Arc<CacheGeneration>>,
}

impl Default for CacheLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheLayer {
    /// Create a layer with empty stores.
    pub fn new() -> Self {
        Self {
            generation: RwLock::new(Arc::new(CacheGeneration::new())),
        }
    }

    /// Resolve search results for `key`.
    pub async fn search_results<E, F, Fut>(
        &self,
        key: SearchKey,
        compute: F,
    ) -> Result<Arc<Vec<DocumentHandle>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<Vec<DocumentHandle>>, E>>,
    {
        self.resolve(|generation| &generation.search, key, compute)
            .await
    }

    /// Resolve single-document metadata for `document_id`.
    pub async fn metadata<E, F, Fut>(&self, document_id: &str, compute: F) -> Result<DocumentHandle, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DocumentHandle, E>>,
    {
        self.resolve(|generation| &generation.metadata, document_id.to_string(), compute)
            .await
    }

    /// Resolve extracted text for `document_id`.
    pub async fn extracted_text<E, F, Fut>(&self, document_id: &str, compute: F) -> Result<Arc<str>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<str>, E>>,
    {
        self.resolve(|generation| &generation.text, document_id.to_string(), compute)
            .await
    }

    /// Resolve a summary for `key`.
    pub async fn summary<E, F, Fut>(&self, key: SummaryKey, compute: F) -> Result<Arc<str>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<str>, E>>,
    {
        self.resolve(|generation| &generation.summary, key, compute)
            .await
    }

    /// Empty every store. Computes already running still complete for their callers.
    pub fn clear(&self) {
        let mut generation = self
            .generation
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *generation = Arc::new(CacheGeneration::new());
        tracing::info!("Caches cleared");
    }

    /// Per-store statistics for the current generation.
    pub fn stats(&self) -> CacheStats {
        let generation = self.current();
        CacheStats {
            search: generation.search.stats(),
            metadata: generation.metadata.stats(),
            text: generation.text.stats(),
            summary: generation.summary.stats(),
        }
    }

    /// Total number of stored values across all stores.
    pub fn len(&self) -> usize {
        let generation = self.current();
        generation.search.len()
            + generation.metadata.len()
            + generation.text.len()
            + generation.summary.len()
    }

    /// Whether every store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current(&self) -> Arc<CacheGeneration> {
        Arc::clone(
            &self
                .generation
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    async fn resolve<K, V, E, F, Fut>(
        &self,
        select: fn(&CacheGeneration) -> &ComputeCache<K, V>,
        key: K,
        compute: F,
    ) -> Result<V, E>
    where
        K: Eq + Hash + Clone,
        V: Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let generation = self.current();
        let value = select(&generation)
            .get_or_compute(key.clone(), compute)
            .await?;

        // A clear raced with this compute: publish into the generation now in use.
        let latest = self.current();
        if !Arc::ptr_eq(&generation, &latest) {
            select(&latest).insert_if_absent(key, value.clone());
        }
        Ok(value)
    }
}
