//! # Expense Aggregator
//!
//! Sums a record's cost line items into one total-expenses figure.
//!
//! ## Baseline Fallback
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Some stores enter overhead ONCE per month instead of daily.           │
//! │                                                                         │
//! │  Without a fallback the daily chart reads:                             │
//! │     Dec 01: ████████████ (rent, utilities, ... all here)               │
//! │     Dec 02: ██                                                          │
//! │     Dec 03: ██                                                          │
//! │                                                                         │
//! │  Rule:                                                                  │
//! │     overhead(record) == 0                                              │
//! │       AND baseline exists for (record.store_id, record month)          │
//! │     ⇒ overhead := baseline.daily_overhead_estimate                     │
//! │                                                                         │
//! │  Purchase and labor are never substituted.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DailyRecord, ExpenseBaseline, OverheadCategory, OverheadCosts, YearMonth};

// =============================================================================
// Baseline Lookup
// =============================================================================

/// Anything that can answer "what is the baseline for this store-month?".
pub trait BaselineSource {
    fn baseline_for(&self, store_id: &str, month: YearMonth) -> Option<&ExpenseBaseline>;
}

/// No baselines at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaseline;

impl BaselineSource for NoBaseline {
    fn baseline_for(&self, _store_id: &str, _month: YearMonth) -> Option<&ExpenseBaseline> {
        None
    }
}

/// A single baseline only answers for its own store-month.
impl BaselineSource for ExpenseBaseline {
    fn baseline_for(&self, store_id: &str, month: YearMonth) -> Option<&ExpenseBaseline> {
        (self.store_id == store_id && self.year_month == month).then_some(self)
    }
}

impl<T: BaselineSource + ?Sized> BaselineSource for &T {
    fn baseline_for(&self, store_id: &str, month: YearMonth) -> Option<&ExpenseBaseline> {
        (**self).baseline_for(store_id, month)
    }
}

impl<T: BaselineSource> BaselineSource for Option<T> {
    fn baseline_for(&self, store_id: &str, month: YearMonth) -> Option<&ExpenseBaseline> {
        self.as_ref().and_then(|b| b.baseline_for(store_id, month))
    }
}

/// Baselines for many stores and months, keyed by `(store_id, month)`.
#[derive(Debug, Clone, Default)]
pub struct BaselineBook {
    entries: HashMap<(String, YearMonth), ExpenseBaseline>,
}

impl BaselineBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the baseline for its store-month.
    pub fn insert(&mut self, baseline: ExpenseBaseline) {
        self.entries
            .insert((baseline.store_id.clone(), baseline.year_month), baseline);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ExpenseBaseline> for BaselineBook {
    fn from_iter<I: IntoIterator<Item = ExpenseBaseline>>(iter: I) -> Self {
        let mut book = BaselineBook::new();
        for baseline in iter {
            book.insert(baseline);
        }
        book
    }
}

impl BaselineSource for BaselineBook {
    fn baseline_for(&self, store_id: &str, month: YearMonth) -> Option<&ExpenseBaseline> {
        self.entries.get(&(store_id.to_string(), month))
    }
}

// =============================================================================
// Aggregation
// =============================================================================

/// A record's expenses split the way the KPI calculator needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseBreakdown {
    pub purchase: Money,
    pub labor: Money,
    /// Overhead after any baseline substitution.
    pub overhead: Money,
    /// True when the baseline estimate replaced an all-zero overhead.
    pub baseline_applied: bool,
}

impl ExpenseBreakdown {
    /// `purchase + labor + overhead`.
    #[inline]
    pub fn total(&self) -> Money {
        self.purchase + self.labor + self.overhead
    }
}

/// Splits a record's expenses, applying the baseline fallback.
pub fn expense_breakdown<B: BaselineSource + ?Sized>(
    record: &DailyRecord,
    baselines: &B,
) -> ExpenseBreakdown {
    let recorded = record.overhead.total();
    let substitute = if recorded.is_zero() {
        baselines
            .baseline_for(&record.store_id, record.year_month())
            .map(|b| b.daily_overhead_estimate)
    } else {
        None
    };

    ExpenseBreakdown {
        purchase: record.purchase,
        labor: record.labor_cost,
        overhead: substitute.unwrap_or(recorded),
        baseline_applied: substitute.is_some(),
    }
}

/// `purchase + labor + eight overhead categories`, with the baseline
/// fallback for all-zero overhead.
///
/// ## Example
/// ```rust
/// use tenpo_core::expense::{total_expenses, NoBaseline};
/// # use tenpo_core::validation::normalize;
/// # use tenpo_core::RawDailyRecord;
/// # let record = normalize(&RawDailyRecord {
/// #     id: "r".into(), store_id: "s".into(), date: "2025-12-01".into(),
/// #     operation_slice: "full_day".into(), purchase: 30_000, labor_cost: 20_000,
/// #     rent: 5_000, ..Default::default()
/// # }).unwrap();
/// assert_eq!(total_expenses(&record, &NoBaseline).units(), 55_000);
/// ```
pub fn total_expenses<B: BaselineSource + ?Sized>(record: &DailyRecord, baselines: &B) -> Money {
    expense_breakdown(record, baselines).total()
}

// =============================================================================
// Monthly Baseline Derivation
// =============================================================================

/// Monthly expense totals entered once per store-month.
///
/// The daily baseline is derived from these by spreading the month's
/// overhead evenly across its open days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyExpenseBaseline {
    pub store_id: String,
    #[ts(as = "String")]
    pub year_month: YearMonth,
    pub labor_cost_employee: Money,
    pub labor_cost_part_time: Money,
    pub overhead: OverheadCosts,
    /// Trading days in the month; calendar days when absent.
    pub open_days: Option<u32>,
}

impl MonthlyExpenseBaseline {
    /// Days the monthly amounts are spread across (never zero).
    pub fn spread_days(&self) -> u32 {
        self.open_days
            .filter(|d| *d > 0)
            .unwrap_or_else(|| self.year_month.days_in_month())
            .max(1)
    }

    /// Whole-month labor.
    pub fn monthly_labor(&self) -> Money {
        self.labor_cost_employee + self.labor_cost_part_time
    }

    /// Whole-month labor plus overhead.
    pub fn monthly_total(&self) -> Money {
        self.monthly_labor() + self.overhead.total()
    }

    /// Labor spread per open day, rounded to whole units.
    pub fn daily_labor_estimate(&self) -> Money {
        Money::from_rounded(self.monthly_labor().per(self.spread_days() as u64))
    }

    /// Per-category overhead spread per open day, each rounded.
    pub fn daily_overhead_by_category(&self) -> OverheadCosts {
        let days = self.spread_days() as u64;
        let mut daily = OverheadCosts::default();
        for category in OverheadCategory::ALL {
            *daily.get_mut(category) = Money::from_rounded(self.overhead.get(category).per(days));
        }
        daily
    }

    /// The daily baseline the expense aggregator consumes.
    ///
    /// The overhead sum is divided once and rounded once.
    pub fn daily_baseline(&self) -> ExpenseBaseline {
        ExpenseBaseline {
            store_id: self.store_id.clone(),
            year_month: self.year_month,
            daily_overhead_estimate: Money::from_rounded(
                self.overhead.total().per(self.spread_days() as u64),
            ),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawDailyRecord;
    use crate::validation::normalize;

    fn record(store: &str, date: &str, overhead_rent: i64) -> DailyRecord {
        normalize(&RawDailyRecord {
            id: format!("{store}-{date}"),
            store_id: store.into(),
            date: date.into(),
            operation_slice: "full_day".into(),
            sales: Some(100_000),
            purchase: 30_000,
            labor_cost: 20_000,
            rent: overhead_rent,
            ..Default::default()
        })
        .unwrap()
    }

    fn baseline(store: &str, month: &str, estimate: i64) -> ExpenseBaseline {
        ExpenseBaseline {
            store_id: store.into(),
            year_month: month.parse().unwrap(),
            daily_overhead_estimate: Money::from_units(estimate),
        }
    }

    #[test]
    fn test_total_without_baseline() {
        let r = record("a", "2025-12-01", 4_000);
        assert_eq!(total_expenses(&r, &NoBaseline).units(), 54_000);
    }

    #[test]
    fn test_baseline_substituted_when_overhead_zero() {
        let r = record("a", "2025-12-01", 0);
        let b = baseline("a", "2025-12", 5_000);

        let breakdown = expense_breakdown(&r, &b);
        assert!(breakdown.baseline_applied);
        assert_eq!(breakdown.overhead.units(), 5_000);
        assert_eq!(breakdown.total().units(), 55_000);
    }

    #[test]
    fn test_baseline_ignored_when_overhead_recorded() {
        let r = record("a", "2025-12-01", 1);
        let b = baseline("a", "2025-12", 5_000);
        let breakdown = expense_breakdown(&r, &b);
        assert!(!breakdown.baseline_applied);
        assert_eq!(breakdown.total().units(), 50_001);
    }

    #[test]
    fn test_baseline_must_match_store_and_month() {
        let r = record("a", "2025-12-01", 0);
        assert_eq!(total_expenses(&r, &baseline("b", "2025-12", 5_000)).units(), 50_000);
        assert_eq!(total_expenses(&r, &baseline("a", "2025-11", 5_000)).units(), 50_000);
    }

    #[test]
    fn test_baseline_book_lookup() {
        let book: BaselineBook = vec![baseline("a", "2025-12", 5_000), baseline("b", "2025-12", 7_000)]
            .into_iter()
            .collect();
        assert_eq!(book.len(), 2);

        let r = record("b", "2025-12-15", 0);
        assert_eq!(total_expenses(&r, &book).units(), 57_000);

        let none: Option<BaselineBook> = None;
        assert_eq!(total_expenses(&r, &none).units(), 50_000);
    }

    #[test]
    fn test_monthly_baseline_spreads_over_open_days() {
        let monthly = MonthlyExpenseBaseline {
            store_id: "a".into(),
            year_month: "2025-12".parse().unwrap(),
            labor_cost_employee: Money::from_units(400_000),
            labor_cost_part_time: Money::from_units(200_000),
            overhead: OverheadCosts {
                rent: Money::from_units(250_000),
                utilities: Money::from_units(50_000),
                ..Default::default()
            },
            open_days: Some(25),
        };

        assert_eq!(monthly.spread_days(), 25);
        assert_eq!(monthly.daily_baseline().daily_overhead_estimate.units(), 12_000);
        assert_eq!(monthly.daily_labor_estimate().units(), 24_000);
        assert_eq!(monthly.monthly_total().units(), 900_000);
        assert_eq!(monthly.daily_overhead_by_category().rent.units(), 10_000);
    }

    #[test]
    fn test_monthly_baseline_defaults_to_calendar_days() {
        let monthly = MonthlyExpenseBaseline {
            store_id: "a".into(),
            year_month: "2025-11".parse().unwrap(),
            labor_cost_employee: Money::zero(),
            labor_cost_part_time: Money::zero(),
            overhead: OverheadCosts {
                rent: Money::from_units(100_000),
                ..Default::default()
            },
            open_days: Some(0),
        };
        assert_eq!(monthly.spread_days(), 30);
        // 100000 / 30 = 3333.33 → 3333
        assert_eq!(monthly.daily_baseline().daily_overhead_estimate.units(), 3_333);
    }
}
