//! Central caching store.
//!
//! [`DataStore`] owns the lifecycle of every table the dashboard sees: it
//! loads a source file once, enriches it, memoizes filtered subsets, and
//! invalidates everything the moment the file changes on disk. Handles are
//! cheap to clone and safe to share across threads; callbacks in the serving
//! layer each hold a clone and go through the same cache.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CoreConfig;
use crate::data::Table;
use crate::enrichment;
use crate::filter::{FilterKey, FilterSpec};
use crate::freshness::{Freshness, FreshnessTracker};
use crate::loader::CsvLoader;
use crate::metadata::MetadataSnapshot;
use crate::sampling;

/// Point-in-time cache statistics for diagnostics endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Number of memoized filter results currently held.
    pub entries_cached: usize,
    /// Approximate memory held by base tables and memoized results, in MiB.
    pub memory_usage_mb: f64,
}

/// Enriched base table plus the metadata snapshot computed alongside it.
#[derive(Clone, Debug)]
struct BaseEntry {
    table: Table,
    metadata: MetadataSnapshot,
}

#[derive(Debug, Default)]
struct StoreInner {
    base: HashMap<PathBuf, BaseEntry>,
    results: IndexMap<FilterKey, Table>,
    order: VecDeque<FilterKey>,
    freshness: FreshnessTracker,
}

impl StoreInner {
    /// Drop the base table and every memoized result derived from `path`.
    fn purge_path(&mut self, path: &Path) {
        self.base.remove(path);
        let before = self.results.len();
        self.results.retain(|key, _| key.path != path);
        self.order.retain(|key| key.path != path);
        let dropped = before - self.results.len();
        if dropped > 0 {
            debug!(path = %path.display(), dropped, "purged memoized results");
        }
        self.freshness.forget(path);
    }

    /// FIFO eviction down to `capacity` memoized results.
    fn enforce_limit(&mut self, capacity: usize) {
        while self.results.len() > capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.results.shift_remove(&oldest).is_some() {
                debug!(path = %oldest.path.display(), spec = ?oldest.spec, "evicted memoized result");
            }
        }
    }
}

/// Shared handle over the data core: load-once caching, freshness gating,
/// memoized filtering, and deterministic chart sampling.
#[derive(Clone, Debug)]
pub struct DataStore {
    config: CoreConfig,
    inner: Arc<RwLock<StoreInner>>,
}

impl DataStore {
    /// Create a store with the given configuration.
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            inner: Arc::new(RwLock::new(StoreInner::default())),
        }
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The enriched base table for `path`, loading it on first access.
    ///
    /// A missing or unreadable source yields the empty table, never an
    /// error; the outcome is cached until the path changes on disk.
    pub fn load_table(&self, path: &Path) -> Table {
        self.fresh_base(path).table
    }

    /// Sorted distinct dimension values for `path`, for filter dropdowns.
    pub fn metadata(&self, path: &Path) -> MetadataSnapshot {
        self.fresh_base(path).metadata
    }

    /// The subset of `path` matching `spec`.
    ///
    /// An unconstrained spec returns the base table directly and is never
    /// memoized. Constrained results are memoized per (path, spec) with
    /// FIFO eviction past the configured capacity.
    pub fn filtered(&self, path: &Path, spec: &FilterSpec) -> Table {
        let base = self.fresh_base(path);
        if spec.is_unconstrained() {
            return base.table;
        }
        let key = FilterKey {
            path: path.to_path_buf(),
            spec: spec.clone(),
        };
        {
            let inner = self.inner.read().expect("data store poisoned");
            if let Some(hit) = inner.results.get(&key) {
                return hit.clone();
            }
        }
        let result = spec.apply(&base.table);
        let mut inner = self.inner.write().expect("data store poisoned");
        // A concurrent caller may have inserted the same key meanwhile.
        if let Some(hit) = inner.results.get(&key) {
            return hit.clone();
        }
        inner.results.insert(key.clone(), result.clone());
        inner.order.push_back(key);
        inner.enforce_limit(self.config.capacity);
        result
    }

    /// The filtered subset downsampled for chart rendering.
    ///
    /// `target` defaults to the configured chart sample size. Sampling is
    /// seeded from the configuration, so repeated calls over unchanged data
    /// return identical tables.
    pub fn sampled_for_charts(
        &self,
        path: &Path,
        spec: &FilterSpec,
        target: Option<usize>,
    ) -> Table {
        let subset = self.filtered(path, spec);
        sampling::sample(
            &subset,
            target.unwrap_or(self.config.chart_sample_size),
            self.config.seed,
        )
    }

    /// Drop every cached table, memoized result, and freshness stamp.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("data store poisoned");
        let bases = inner.base.len();
        let results = inner.results.len();
        inner.base.clear();
        inner.results.clear();
        inner.order.clear();
        inner.freshness.clear();
        info!(bases, results, "cleared data store");
    }

    /// Current cache statistics.
    pub fn cache_info(&self) -> CacheInfo {
        let inner = self.inner.read().expect("data store poisoned");
        let bytes: usize = inner
            .base
            .values()
            .map(|entry| entry.table.approx_mem_bytes())
            .sum::<usize>()
            + inner
                .results
                .values()
                .map(Table::approx_mem_bytes)
                .sum::<usize>();
        CacheInfo {
            entries_cached: inner.results.len(),
            memory_usage_mb: bytes as f64 / (1024.0 * 1024.0),
        }
    }

    /// Return the cached base entry for `path`, reloading it when the file
    /// changed, disappeared, or was never seen.
    fn fresh_base(&self, path: &Path) -> BaseEntry {
        {
            let inner = self.inner.read().expect("data store poisoned");
            if inner.freshness.check(path) == Freshness::Fresh {
                if let Some(entry) = inner.base.get(path) {
                    return entry.clone();
                }
            }
        }
        let mut inner = self.inner.write().expect("data store poisoned");
        // Double check: another caller may have reloaded while we waited.
        if inner.freshness.check(path) == Freshness::Fresh {
            if let Some(entry) = inner.base.get(path) {
                return entry.clone();
            }
        }
        match inner.freshness.check(path) {
            Freshness::Stale => {
                debug!(path = %path.display(), "source changed, reloading");
            }
            Freshness::Missing => {
                warn!(path = %path.display(), "source removed, dropping cached data");
            }
            Freshness::Fresh => {}
        }
        inner.purge_path(path);

        let loader = CsvLoader::new(self.config.chunk_size);
        let table = match loader.load(path) {
            Ok(raw) => enrichment::enrich(&raw),
            Err(error) => {
                warn!(path = %path.display(), %error, "source unavailable, serving empty table");
                Table::empty()
            }
        };
        let entry = BaseEntry {
            metadata: MetadataSnapshot::extract(&table),
            table,
        };
        inner.freshness.observe(path);
        inner.base.insert(path.to_path_buf(), entry.clone());
        entry
    }
}
