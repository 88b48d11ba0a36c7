//! # Dashboard Service
//!
//! Fetches engine inputs from the database, runs the engine and caches the
//! result.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      dashboard(request)                                 │
//! │                                                                         │
//! │  cache hit? ──yes──▶ return Arc<DashboardView>                         │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  note cache generation                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────── async, I/O ─────────────────────────────────┐   │
//! │  │ brand directory                                                 │   │
//! │  │ records in range          records in preceding range            │   │
//! │  │ baselines for the months those records touch                    │   │
//! │  │ targets for the month of period_end, daily targets (daily view) │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────── sync, pure (tenpo-core) ────────────────────┐   │
//! │  │ compute_kpis → summarize_periods → resolve_target → evaluate    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  cache.insert (dropped if invalidated meanwhile), return               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use tenpo_core::achievement::evaluate_with_spend;
use tenpo_core::comparison::{compare_stores, SortKey, SortOrder, StoreComparison};
use tenpo_core::expense::MonthlyExpenseBaseline;
use tenpo_core::kpi::compute_kpis;
use tenpo_core::summary::{summarize_periods, PeriodSummary};
use tenpo_core::target::resolve_target;
use tenpo_core::validation::normalize;
use tenpo_core::{
    Achievement, BaselineBook, DailyRecord, DailyTarget, DateRange, ExpenseBaseline, Granularity, KpiSnapshot,
    RawDailyRecord, ResolvedTarget, Scope, ScopeFilter, TargetSpec, YearMonth,
};
use tenpo_db::{Brand, Database, Store, TargetFilter};

use crate::cache::{CacheKey, DashboardCache};
use crate::config::ReportConfig;
use crate::error::{ReportError, ReportResult};

// =============================================================================
// Request / View
// =============================================================================

/// What the caller wants to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardRequest {
    pub scope: Scope,
    pub granularity: Granularity,
    pub date_range: DateRange,
    /// Date actuals are counted up to; picks the target month.
    #[ts(as = "String")]
    pub period_end: NaiveDate,
}

impl DashboardRequest {
    /// A whole calendar month, evaluated as of its last day.
    pub fn month(scope: Scope, month: YearMonth, granularity: Granularity) -> Self {
        DashboardRequest {
            scope,
            granularity,
            date_range: DateRange::between(month.first_day(), month.last_day()),
            period_end: month.last_day(),
        }
    }

    /// The month containing `today`, up to and including `today`.
    pub fn month_to_date(scope: Scope, today: NaiveDate, granularity: Granularity) -> Self {
        let month = YearMonth::from_date(today);
        DashboardRequest {
            scope,
            granularity,
            date_range: DateRange::between(month.first_day(), today),
            period_end: today,
        }
    }

    fn validate(&self) -> ReportResult<()> {
        if let (Some(from), Some(to)) = (self.date_range.from, self.date_range.to) {
            if from > to {
                return Err(ReportError::InvalidRequest(format!(
                    "date range starts after it ends ({from} > {to})"
                )));
            }
        }
        Ok(())
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.scope.clone(), self.granularity, self.date_range)
    }
}

/// Everything one dashboard screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardView {
    pub scope: Scope,
    pub granularity: Granularity,
    pub date_range: DateRange,
    #[ts(as = "String")]
    pub period_end: NaiveDate,
    /// One row per period key, oldest first.
    pub buckets: Vec<PeriodSummary>,
    /// Totals over the whole range, with growth against the preceding range.
    pub kpi: KpiSnapshot,
    /// `None` only for a single store without a target.
    pub target: Option<ResolvedTarget>,
    pub achievement: Option<Achievement>,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct DashboardService {
    db: Database,
    cache: DashboardCache,
    average_spend: f64,
}

impl DashboardService {
    pub fn new(db: Database, config: &ReportConfig) -> Self {
        DashboardService {
            db,
            cache: DashboardCache::new(&config.cache),
            average_spend: config.dashboard.average_spend,
        }
    }

    /// Opens the configured database and builds the service.
    pub async fn from_config(config: &ReportConfig) -> ReportResult<Self> {
        config.validate()?;
        let db = Database::new(config.db_config()).await?;
        info!(cache_enabled = config.cache.enabled, "Dashboard service ready");
        Ok(Self::new(db, config))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn cache(&self) -> &DashboardCache {
        &self.cache
    }

    /// Builds (or returns the cached) dashboard for `request`.
    pub async fn dashboard(&self, request: DashboardRequest) -> ReportResult<Arc<DashboardView>> {
        request.validate()?;

        let key = request.cache_key();
        if let Some(cached) = self.cache.get(&key).await {
            if cached.period_end == request.period_end {
                return Ok(cached);
            }
        }

        let generation = self.cache.generation().await;
        let view = Arc::new(self.compute(&request).await?);
        self.cache.insert(key, Arc::clone(&view), generation).await;
        Ok(view)
    }

    async fn compute(&self, request: &DashboardRequest) -> ReportResult<DashboardView> {
        let scope = &request.scope;
        let brands = self.db.stores().brand_directory().await?;

        let records = self
            .db
            .records()
            .list_records(&ScopeFilter::for_scope(scope, request.date_range))
            .await?;

        let previous = match request.date_range.preceding() {
            Some(range) => Some(self.db.records().list_records(&ScopeFilter::for_scope(scope, range)).await?),
            None => None,
        };

        let baselines = self.baseline_book(&records, previous.as_deref()).await?;

        let daily_targets: Vec<DailyTarget> = if request.granularity == Granularity::Daily {
            self.db
                .targets()
                .list_daily_targets(scope.store_id(), request.date_range)
                .await?
                .into_iter()
                .filter(|t| scope.includes_store(&t.store_id, &brands))
                .collect()
        } else {
            Vec::new()
        };

        let period = YearMonth::from_date(request.period_end);
        let targets = self
            .db
            .targets()
            .list_targets(&TargetFilter {
                store_id: scope.store_id().map(String::from),
                period: Some(period),
            })
            .await?;

        debug!(
            scope = %scope,
            granularity = %request.granularity,
            records = records.len(),
            previous = ?previous.as_ref().map(Vec::len),
            baselines = baselines.len(),
            targets = targets.len(),
            "Computing dashboard"
        );

        let kpi = compute_kpis(&records, previous.as_deref(), &baselines);
        let buckets = summarize_periods(&records, request.granularity, &baselines, false, &daily_targets);
        let target = resolve_target(scope, period, &targets, &brands);
        let achievement = target
            .as_ref()
            .map(|t| evaluate_with_spend(&kpi, t, request.period_end, self.average_spend));

        Ok(DashboardView {
            scope: scope.clone(),
            granularity: request.granularity,
            date_range: request.date_range,
            period_end: request.period_end,
            buckets,
            kpi,
            target,
            achievement,
        })
    }

    /// Baselines for every month the given records fall in.
    async fn baseline_book(&self, records: &[DailyRecord], previous: Option<&[DailyRecord]>) -> ReportResult<BaselineBook> {
        let mut months = records
            .iter()
            .chain(previous.unwrap_or(&[]))
            .map(DailyRecord::year_month);

        let Some(first) = months.next() else {
            return Ok(BaselineBook::new());
        };
        let (from, to) = months.fold((first, first), |(lo, hi), m| (lo.min(m), hi.max(m)));

        Ok(self.db.baselines().book_between(from, to).await?)
    }

    /// Per-store ranking across the chain for `range`.
    pub async fn store_comparison(&self, range: DateRange, sort_by: SortKey, order: SortOrder) -> ReportResult<StoreComparison> {
        let records = self
            .db
            .records()
            .list_records(&ScopeFilter::for_scope(&Scope::AllStores, range))
            .await?;
        let previous = match range.preceding() {
            Some(prev) => Some(
                self.db
                    .records()
                    .list_records(&ScopeFilter::for_scope(&Scope::AllStores, prev))
                    .await?,
            ),
            None => None,
        };
        let baselines = self.baseline_book(&records, previous.as_deref()).await?;

        debug!(records = records.len(), sort_by = ?sort_by, "Comparing stores");
        Ok(compare_stores(&records, previous.as_deref(), &baselines, sort_by, order))
    }

    // =========================================================================
    // Writers (invalidate the cache)
    // =========================================================================

    /// Normalizes and stores a submitted record, replacing any existing
    /// record for the same store, date and slice.
    pub async fn save_record(&self, raw: &RawDailyRecord) -> ReportResult<DailyRecord> {
        let record = normalize(raw)?;
        self.db.records().upsert(&record).await?;
        self.invalidate_store(&record.store_id).await?;
        Ok(record)
    }

    pub async fn save_target(&self, target: &TargetSpec) -> ReportResult<()> {
        self.db.targets().upsert(target).await?;
        self.invalidate_store(&target.store_id).await
    }

    pub async fn save_daily_target(&self, target: &DailyTarget) -> ReportResult<()> {
        self.db.targets().upsert_daily(target).await?;
        self.invalidate_store(&target.store_id).await
    }

    /// Stores the daily overhead estimate derived from monthly totals.
    pub async fn save_monthly_baseline(&self, monthly: &MonthlyExpenseBaseline) -> ReportResult<ExpenseBaseline> {
        let baseline = self.db.baselines().upsert_monthly(monthly).await?;
        self.invalidate_store(&baseline.store_id).await?;
        Ok(baseline)
    }

    /// Creates or updates a store. Brand membership may change, so every
    /// cached view is dropped.
    pub async fn save_store(&self, store: &Store) -> ReportResult<()> {
        self.db.stores().upsert(store).await?;
        self.cache.invalidate_all().await;
        Ok(())
    }

    pub async fn save_brand(&self, brand: &Brand) -> ReportResult<()> {
        self.db.stores().upsert_brand(brand).await?;
        self.cache.invalidate_all().await;
        Ok(())
    }

    async fn invalidate_store(&self, store_id: &str) -> ReportResult<()> {
        if self.cache.is_enabled() {
            let brands = self.db.stores().brand_directory().await?;
            self.cache.invalidate_store(store_id, &brands).await;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
