//! # Dashboard Cache
//!
//! Memoised dashboard views keyed by `(scope, granularity, date_range)`.
//!
//! ## Invalidation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cache Invalidation                                │
//! │                                                                         │
//! │  save_record(store "a")                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  invalidate_store("a", &brands)                                        │
//! │       │                                                                 │
//! │       ├── drop  store:a                                                │
//! │       ├── drop  brand:<brand of a>                                     │
//! │       ├── drop  all                                                    │
//! │       └── keep  store:b, brand:<other>                                 │
//! │                                                                         │
//! │  save_store / save_brand → invalidate_all()                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every invalidation bumps a generation counter. A view computed from
//! reads taken under an older generation is discarded on insert, so a write
//! that lands mid-computation is never shadowed by a stale view.
//!
//! The engine never caches; staleness is entirely this module's concern.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use tenpo_core::{BrandDirectory, DateRange, Granularity, Scope};

use crate::config::CacheSettings;
use crate::service::DashboardView;

/// Cache key for one dashboard computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scope: Scope,
    pub granularity: Granularity,
    pub date_range: DateRange,
}

impl CacheKey {
    pub fn new(scope: Scope, granularity: Granularity, date_range: DateRange) -> Self {
        CacheKey {
            scope,
            granularity,
            date_range,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    view: Arc<DashboardView>,
    /// Insertion order, for eviction.
    seq: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_seq: u64,
    generation: u64,
}

/// Shared, bounded cache of dashboard views.
#[derive(Debug, Clone)]
pub struct DashboardCache {
    enabled: bool,
    max_entries: usize,
    state: Arc<RwLock<CacheState>>,
}

impl DashboardCache {
    pub fn new(settings: &CacheSettings) -> Self {
        DashboardCache {
            enabled: settings.enabled,
            max_entries: settings.max_entries.max(1),
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        DashboardCache {
            enabled: false,
            max_entries: 1,
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Arc<DashboardView>> {
        if !self.enabled {
            return None;
        }

        let state = self.state.read().await;
        let hit = state.entries.get(key).map(|entry| Arc::clone(&entry.view));
        debug!(scope = %key.scope, granularity = %key.granularity, hit = hit.is_some(), "Dashboard cache lookup");
        hit
    }

    /// Current invalidation generation; read it before fetching inputs.
    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Stores a view computed under `generation`, evicting the oldest entry
    /// when full. Dropped if any invalidation happened since.
    pub async fn insert(&self, key: CacheKey, view: Arc<DashboardView>, generation: u64) {
        if !self.enabled {
            return;
        }

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!(scope = %key.scope, "Discarding dashboard view computed before an invalidation");
            return;
        }
        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_entries {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(scope = %oldest.scope, "Evicting oldest dashboard view");
                state.entries.remove(&oldest);
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(key, CacheEntry { view, seq });
    }

    pub async fn invalidate_all(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        let dropped = state.entries.len();
        state.entries.clear();
        info!(dropped, "Dashboard cache cleared");
    }

    /// Drops every view whose scope includes `store_id`.
    pub async fn invalidate_store(&self, store_id: &str, brands: &BrandDirectory) {
        let mut state = self.state.write().await;
        state.generation += 1;
        let before = state.entries.len();
        state
            .entries
            .retain(|key, _| !key.scope.includes_store(store_id, brands));
        info!(store_id, dropped = before - state.entries.len(), "Dashboard cache invalidated for store");
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tenpo_core::KpiSnapshot;

    fn view(scope: Scope) -> Arc<DashboardView> {
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        Arc::new(DashboardView {
            scope,
            granularity: Granularity::Monthly,
            date_range: DateRange::unbounded(),
            period_end: end,
            buckets: Vec::new(),
            kpi: KpiSnapshot::default(),
            target: None,
            achievement: None,
        })
    }

    fn key(scope: Scope) -> CacheKey {
        CacheKey::new(scope, Granularity::Monthly, DateRange::unbounded())
    }

    fn settings(max_entries: usize) -> CacheSettings {
        CacheSettings {
            enabled: true,
            max_entries,
        }
    }

    #[tokio::test]
    async fn test_get_after_insert() {
        let cache = DashboardCache::new(&settings(8));
        let scope = Scope::Store("a".into());
        assert!(cache.get(&key(scope.clone())).await.is_none());

        let stored = view(scope.clone());
        cache.insert(key(scope.clone()), Arc::clone(&stored), 0).await;

        let hit = cache.get(&key(scope)).await.unwrap();
        assert!(Arc::ptr_eq(&hit, &stored));
    }

    #[tokio::test]
    async fn test_granularity_is_part_of_key() {
        let cache = DashboardCache::new(&settings(8));
        cache.insert(key(Scope::AllStores), view(Scope::AllStores), 0).await;

        let weekly = CacheKey::new(Scope::AllStores, Granularity::Weekly, DateRange::unbounded());
        assert!(cache.get(&weekly).await.is_none());
    }

    #[tokio::test]
    async fn test_evicts_oldest() {
        let cache = DashboardCache::new(&settings(2));
        for id in ["a", "b", "c"] {
            let scope = Scope::Store(id.into());
            cache.insert(key(scope.clone()), view(scope), 0).await;
        }

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&key(Scope::Store("a".into()))).await.is_none());
        assert!(cache.get(&key(Scope::Store("c".into()))).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_store_drops_enclosing_scopes() {
        let cache = DashboardCache::new(&settings(8));
        let brands: BrandDirectory = [("a", "menya"), ("b", "torikin")].into_iter().collect();

        for scope in [
            Scope::Store("a".into()),
            Scope::Store("b".into()),
            Scope::Brand("menya".into()),
            Scope::Brand("torikin".into()),
            Scope::AllStores,
        ] {
            cache.insert(key(scope.clone()), view(scope), 0).await;
        }

        cache.invalidate_store("a", &brands).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get(&key(Scope::Store("b".into()))).await.is_some());
        assert!(cache.get(&key(Scope::Brand("torikin".into()))).await.is_some());
        assert!(cache.get(&key(Scope::AllStores)).await.is_none());

        cache.invalidate_all().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_after_invalidation_is_discarded() {
        let cache = DashboardCache::new(&settings(8));
        let brands: BrandDirectory = [("a", "menya")].into_iter().collect();
        let scope = Scope::Store("a".into());

        let generation = cache.generation().await;
        cache.invalidate_store("a", &brands).await;
        cache.insert(key(scope.clone()), view(scope.clone()), generation).await;
        assert!(cache.is_empty().await);

        let generation = cache.generation().await;
        cache.insert(key(scope.clone()), view(scope.clone()), generation).await;
        assert!(cache.get(&key(scope)).await.is_some());

        cache.invalidate_all().await;
        assert_eq!(cache.generation().await, generation + 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_stores_nothing() {
        let cache = DashboardCache::disabled();
        cache.insert(key(Scope::AllStores), view(Scope::AllStores), 0).await;
        assert!(cache.get(&key(Scope::AllStores)).await.is_none());
        assert!(cache.is_empty().await);
    }
}
