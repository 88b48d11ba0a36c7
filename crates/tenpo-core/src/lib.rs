//! # tenpo-core: Performance Aggregation & Target-Tracking Engine
//!
//! Turns validated daily store records into period summaries, KPI
//! snapshots and target-achievement figures. Every function here is a
//! pure, synchronous function of its inputs.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tenpo Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tenpo-report (caller layer)                     │   │
//! │  │    config ──► DashboardService ──► DashboardCache               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ fetch, then compute                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tenpo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  raw ─► validation ─► scope ─► period ─► expense + kpi          │   │
//! │  │                                              │                  │   │
//! │  │                         target ─────► achievement               │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CACHE • NO ASYNC • PURE FUNCTIONS                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │                   tenpo-db (persistence)                        │   │
//! │  │        records, baselines, targets, brand directory             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (DailyRecord, TargetSpec, YearMonth, etc.)
//! - [`money`] - Whole-yen Money type and zero-guarded ratio helpers
//! - [`error`] - Domain error types
//! - [`validation`] - Record normalizer
//! - [`expense`] - Expense aggregator and baseline fallback
//! - [`period`] - Daily / weekly / monthly bucketing
//! - [`scope`] - Store / brand / date-range filtering
//! - [`kpi`] - KPI calculator
//! - [`target`] - Target resolver
//! - [`achievement`] - Achievement evaluator
//! - [`summary`] - Per-period table rows
//! - [`comparison`] - Per-store ranking
//! - [`templates`] - Rate templates per business type
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tenpo_core::achievement::evaluate;
//! use tenpo_core::expense::NoBaseline;
//! use tenpo_core::kpi::compute_kpis;
//! use tenpo_core::target::resolve_target;
//! use tenpo_core::validation::normalize;
//! use tenpo_core::{BrandDirectory, Money, RawDailyRecord, Scope, TargetSpec};
//!
//! let record = normalize(&RawDailyRecord {
//!     id: "r1".into(),
//!     store_id: "shibuya".into(),
//!     date: "2025-12-20".into(),
//!     operation_slice: "full_day".into(),
//!     sales: Some(4_000_000),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let target = TargetSpec {
//!     store_id: "shibuya".into(),
//!     period: "2025-12".parse().unwrap(),
//!     target_sales: Money::from_units(5_000_000),
//!     target_profit: Money::from_units(750_000),
//!     target_profit_margin_pct: 15.0,
//!     target_cost_rate_pct: 30.0,
//!     target_labor_rate_pct: 25.0,
//! };
//!
//! let kpi = compute_kpis(&[record], None, &NoBaseline);
//! let scope = Scope::Store("shibuya".into());
//! let resolved = resolve_target(&scope, target.period, &[target], &BrandDirectory::new()).unwrap();
//! let result = evaluate(&kpi, &resolved, NaiveDate::from_ymd_opt(2025, 12, 20).unwrap());
//!
//! assert_eq!(result.remaining_sales.units(), 1_000_000);
//! assert_eq!(result.days_remaining, 11);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod achievement;
pub mod comparison;
pub mod error;
pub mod expense;
pub mod kpi;
pub mod money;
pub mod period;
pub mod scope;
pub mod summary;
pub mod target;
pub mod templates;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use achievement::{Achievement, DailyAchievement};
pub use error::{CoreError, CoreResult, ValidationError};
pub use expense::{BaselineBook, BaselineSource, NoBaseline};
pub use kpi::KpiSnapshot;
pub use money::Money;
pub use period::PeriodBucket;
pub use scope::{BrandDirectory, DateRange, Scope, ScopeFilter};
pub use target::ResolvedTarget;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Store-id sentinel meaning "no store restriction".
pub const ALL_STORES: &str = "all";

/// Largest yen amount accepted on a single record field (¥10 billion).
///
/// ## Business Reason
/// Catches mistyped figures at entry time and keeps chain-wide totals
/// far from `i64` overflow.
pub const MAX_RECORD_AMOUNT: i64 = 10_000_000_000;

/// Largest customer count accepted on a single record.
pub const MAX_RECORD_CUSTOMERS: i64 = 1_000_000;
