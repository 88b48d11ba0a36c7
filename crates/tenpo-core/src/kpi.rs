//! # KPI Calculator
//!
//! Reduces a record set into one `KpiSnapshot`.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  records ──► KpiTotals::add (per record, via Expense Aggregator)        │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │             exact Money sums                                            │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │  KpiTotals::snapshot ──► profits, zero-guarded rates, averages          │
//! │                   │                                                     │
//! │  comparison? ─────┴──► sales / profit growth                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Zero State
//! An empty record set yields a snapshot where every numeric field is zero.
//! Rates and averages over zero sales or zero customers are `0.0`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::expense::{expense_breakdown, BaselineSource};
use crate::money::{growth_pct, safe_div, Money};
use crate::scope::{BrandDirectory, Scope};
use crate::types::{DailyRecord, OperationSlice};

// =============================================================================
// Snapshot
// =============================================================================

/// Derived KPIs for one record set. Never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct KpiSnapshot {
    pub total_sales: Money,
    pub total_expenses: Money,
    pub purchase_total: Money,
    pub labor_total: Money,
    /// Overhead after baseline substitution.
    pub other_expense_total: Money,

    /// `total_sales - purchase_total`
    pub gross_profit: Money,
    /// `total_sales - total_expenses`
    pub operating_profit: Money,
    /// `purchase_total + labor_total`
    pub prime_cost: Money,

    pub profit_margin_pct: f64,
    pub purchase_rate_pct: f64,
    pub labor_rate_pct: f64,
    pub prime_cost_rate_pct: f64,

    pub average_ticket: f64,
    /// Sales per distinct store-day.
    pub average_daily_sales: f64,

    pub total_customers: u64,
    pub lunch_customers: u64,
    pub dinner_customers: u64,

    pub lunch_sales: Money,
    pub dinner_sales: Money,
    pub full_day_sales: Money,

    pub record_count: u64,
    pub store_count: u64,

    /// Present only when a comparison set was supplied.
    pub sales_growth_pct: Option<f64>,
    pub profit_growth_pct: Option<f64>,
}

// =============================================================================
// Accumulator
// =============================================================================

/// Exact running sums over a record set.
///
/// Every field is additive, so totals over disjoint sets can be merged.
#[derive(Debug, Clone, Default)]
pub struct KpiTotals {
    sales: Money,
    purchase: Money,
    labor: Money,
    overhead: Money,
    customers: u64,
    lunch_customers: u64,
    dinner_customers: u64,
    lunch_sales: Money,
    dinner_sales: Money,
    full_day_sales: Money,
    record_count: u64,
    store_days: BTreeSet<(String, NaiveDate)>,
    stores: BTreeSet<String>,
}

impl KpiTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sums a whole record set.
    pub fn from_records<B: BaselineSource + ?Sized>(records: &[DailyRecord], baselines: &B) -> Self {
        let mut totals = KpiTotals::new();
        for record in records {
            totals.add(record, baselines);
        }
        totals
    }

    /// Folds one record into the sums.
    pub fn add<B: BaselineSource + ?Sized>(&mut self, record: &DailyRecord, baselines: &B) {
        let expenses = expense_breakdown(record, baselines);

        self.sales += record.sales;
        self.purchase += expenses.purchase;
        self.labor += expenses.labor;
        self.overhead += expenses.overhead;
        self.customers += record.customer_count;
        self.record_count += 1;

        match record.operation_slice {
            OperationSlice::Lunch => {
                self.lunch_sales += record.sales;
                self.lunch_customers += record.lunch_customers.unwrap_or(record.customer_count);
            }
            OperationSlice::Dinner => {
                self.dinner_sales += record.sales;
                self.dinner_customers += record.dinner_customers.unwrap_or(record.customer_count);
            }
            OperationSlice::FullDay => {
                self.full_day_sales += record.sales;
                self.lunch_customers += record.lunch_customers.unwrap_or(0);
                self.dinner_customers += record.dinner_customers.unwrap_or(0);
            }
        }

        self.store_days.insert((record.store_id.clone(), record.date));
        self.stores.insert(record.store_id.clone());
    }

    /// Merges another accumulator into this one.
    pub fn merge(&mut self, other: KpiTotals) {
        self.sales += other.sales;
        self.purchase += other.purchase;
        self.labor += other.labor;
        self.overhead += other.overhead;
        self.customers += other.customers;
        self.lunch_customers += other.lunch_customers;
        self.dinner_customers += other.dinner_customers;
        self.lunch_sales += other.lunch_sales;
        self.dinner_sales += other.dinner_sales;
        self.full_day_sales += other.full_day_sales;
        self.record_count += other.record_count;
        self.store_days.extend(other.store_days);
        self.stores.extend(other.stores);
    }

    pub fn sales(&self) -> Money {
        self.sales
    }

    pub fn total_expenses(&self) -> Money {
        self.purchase + self.labor + self.overhead
    }

    pub fn operating_profit(&self) -> Money {
        self.sales - self.total_expenses()
    }

    /// Derives the snapshot; growth fields are left empty.
    pub fn snapshot(&self) -> KpiSnapshot {
        let total_expenses = self.total_expenses();
        let prime_cost = self.purchase + self.labor;

        KpiSnapshot {
            total_sales: self.sales,
            total_expenses,
            purchase_total: self.purchase,
            labor_total: self.labor,
            other_expense_total: self.overhead,
            gross_profit: self.sales - self.purchase,
            operating_profit: self.operating_profit(),
            prime_cost,
            profit_margin_pct: self.operating_profit().percent_of(self.sales),
            purchase_rate_pct: self.purchase.percent_of(self.sales),
            labor_rate_pct: self.labor.percent_of(self.sales),
            prime_cost_rate_pct: prime_cost.percent_of(self.sales),
            average_ticket: self.sales.per(self.customers),
            average_daily_sales: self.sales.per(self.store_days.len() as u64),
            total_customers: self.customers,
            lunch_customers: self.lunch_customers,
            dinner_customers: self.dinner_customers,
            lunch_sales: self.lunch_sales,
            dinner_sales: self.dinner_sales,
            full_day_sales: self.full_day_sales,
            record_count: self.record_count,
            store_count: self.stores.len() as u64,
            sales_growth_pct: None,
            profit_growth_pct: None,
        }
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Computes the KPI snapshot for `records`.
///
/// When `comparison` is given, its sales and operating profit are computed
/// with the same baselines and used for the growth fields.
///
/// ## Example
/// ```rust
/// use tenpo_core::kpi::compute_kpis;
/// use tenpo_core::expense::NoBaseline;
///
/// let kpi = compute_kpis(&[], None, &NoBaseline);
/// assert_eq!(kpi.record_count, 0);
/// assert_eq!(kpi.profit_margin_pct, 0.0);
/// ```
pub fn compute_kpis<B: BaselineSource + ?Sized>(
    records: &[DailyRecord],
    comparison: Option<&[DailyRecord]>,
    baselines: &B,
) -> KpiSnapshot {
    let mut snapshot = KpiTotals::from_records(records, baselines).snapshot();

    if let Some(previous) = comparison {
        let previous = KpiTotals::from_records(previous, baselines);
        snapshot.sales_growth_pct = Some(growth_pct(snapshot.total_sales, previous.sales()));
        snapshot.profit_growth_pct = Some(growth_pct(snapshot.operating_profit, previous.operating_profit()));
    }

    snapshot
}

/// `compute_kpis` over only the records inside `scope`.
pub fn compute_scope_kpis<B: BaselineSource + ?Sized>(
    scope: &Scope,
    records: &[DailyRecord],
    comparison: Option<&[DailyRecord]>,
    baselines: &B,
    brands: &BrandDirectory,
) -> KpiSnapshot {
    let in_scope = |set: &[DailyRecord]| -> Vec<DailyRecord> {
        set.iter()
            .filter(|r| scope.includes_store(&r.store_id, brands))
            .cloned()
            .collect()
    };

    let current = in_scope(records);
    let previous = comparison.map(in_scope);
    compute_kpis(&current, previous.as_deref(), baselines)
}

/// Average of a slice of percentages; `0.0` when empty.
pub(crate) fn mean(values: &[f64]) -> f64 {
    safe_div(values.iter().sum(), values.len() as f64)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::NoBaseline;
    use crate::types::{ExpenseBaseline, RawDailyRecord};
    use crate::validation::normalize;

    fn raw(store: &str, date: &str, slice: &str, sales: i64) -> RawDailyRecord {
        RawDailyRecord {
            id: format!("{store}-{date}-{slice}"),
            store_id: store.into(),
            date: date.into(),
            operation_slice: slice.into(),
            sales: Some(sales),
            ..Default::default()
        }
    }

    fn record(raw: RawDailyRecord) -> DailyRecord {
        normalize(&raw).unwrap()
    }

    fn mixed_records() -> Vec<DailyRecord> {
        vec![
            record(RawDailyRecord {
                customers: Some(20),
                purchase: 12_000,
                labor_cost: 8_000,
                rent: 2_000,
                ..raw("a", "2025-12-01", "lunch", 40_000)
            }),
            record(RawDailyRecord {
                customers: Some(25),
                purchase: 18_000,
                labor_cost: 12_000,
                ..raw("a", "2025-12-01", "dinner", 60_000)
            }),
            record(RawDailyRecord {
                lunch_customers: Some(10),
                dinner_customers: Some(15),
                purchase: 25_000,
                labor_cost: 15_000,
                utilities: 3_000,
                ..raw("b", "2025-12-02", "full_day", 90_000)
            }),
        ]
    }

    #[test]
    fn test_single_record_with_baseline() {
        let r = record(RawDailyRecord {
            purchase: 30_000,
            labor_cost: 20_000,
            ..raw("a", "2025-12-01", "full_day", 100_000)
        });
        let baseline = ExpenseBaseline {
            store_id: "a".into(),
            year_month: "2025-12".parse().unwrap(),
            daily_overhead_estimate: Money::from_units(5_000),
        };

        let kpi = compute_kpis(&[r], None, &baseline);
        assert_eq!(kpi.total_expenses.units(), 55_000);
        assert_eq!(kpi.operating_profit.units(), 45_000);
        assert_eq!(kpi.gross_profit.units(), 70_000);
        assert_eq!(kpi.other_expense_total.units(), 5_000);
        assert_eq!(kpi.purchase_rate_pct, 30.0);
        assert_eq!(kpi.labor_rate_pct, 20.0);
        assert_eq!(kpi.profit_margin_pct, 45.0);
        assert_eq!(kpi.prime_cost.units(), 50_000);
        assert_eq!(kpi.prime_cost_rate_pct, 50.0);
    }

    #[test]
    fn test_empty_set_is_all_zero() {
        let kpi = compute_kpis(&[], None, &NoBaseline);
        assert_eq!(kpi, KpiSnapshot::default());
        assert_eq!(kpi.record_count, 0);
        assert_eq!(kpi.average_ticket, 0.0);
        assert!(kpi.sales_growth_pct.is_none());
    }

    #[test]
    fn test_zero_sales_rates_are_zero_not_nan() {
        let r = record(RawDailyRecord {
            purchase: 5_000,
            labor_cost: 3_000,
            customers: Some(0),
            ..raw("a", "2025-12-01", "full_day", 0)
        });
        let kpi = compute_kpis(&[r], None, &NoBaseline);

        assert_eq!(kpi.operating_profit.units(), -8_000);
        for value in [
            kpi.profit_margin_pct,
            kpi.purchase_rate_pct,
            kpi.labor_rate_pct,
            kpi.prime_cost_rate_pct,
            kpi.average_ticket,
        ] {
            assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn test_day_part_splits_and_counts() {
        let kpi = compute_kpis(&mixed_records(), None, &NoBaseline);

        assert_eq!(kpi.total_sales.units(), 190_000);
        assert_eq!(kpi.lunch_sales.units(), 40_000);
        assert_eq!(kpi.dinner_sales.units(), 60_000);
        assert_eq!(kpi.full_day_sales.units(), 90_000);
        assert_eq!(kpi.lunch_customers, 30);
        assert_eq!(kpi.dinner_customers, 40);
        assert_eq!(kpi.total_customers, 70);
        assert_eq!(kpi.record_count, 3);
        assert_eq!(kpi.store_count, 2);
        // Two store-days: a on 12-01, b on 12-02
        assert_eq!(kpi.average_daily_sales, 95_000.0);
        assert!((kpi.average_ticket - 190_000.0 / 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_totals_are_additive_over_partitions() {
        let records = mixed_records();
        let (a, b) = records.split_at(1);

        let whole = compute_kpis(&records, None, &NoBaseline);
        let left = compute_kpis(a, None, &NoBaseline);
        let right = compute_kpis(b, None, &NoBaseline);

        assert_eq!(whole.total_sales, left.total_sales + right.total_sales);
        assert_eq!(whole.total_expenses, left.total_expenses + right.total_expenses);
        assert_eq!(whole.purchase_total, left.purchase_total + right.purchase_total);
        assert_eq!(whole.labor_total, left.labor_total + right.labor_total);

        let mut merged = KpiTotals::from_records(a, &NoBaseline);
        merged.merge(KpiTotals::from_records(b, &NoBaseline));
        assert_eq!(merged.snapshot(), whole);
    }

    #[test]
    fn test_idempotent() {
        let records = mixed_records();
        let first = compute_kpis(&records, Some(&records[..1]), &NoBaseline);
        let second = compute_kpis(&records, Some(&records[..1]), &NoBaseline);
        assert_eq!(first, second);
        assert_eq!(first.average_ticket.to_bits(), second.average_ticket.to_bits());
    }

    #[test]
    fn test_growth_against_comparison() {
        let current = vec![record(raw("a", "2025-12-01", "full_day", 120_000))];
        let previous = vec![record(raw("a", "2025-11-01", "full_day", 100_000))];

        let kpi = compute_kpis(&current, Some(previous.as_slice()), &NoBaseline);
        assert!((kpi.sales_growth_pct.unwrap() - 20.0).abs() < 1e-9);
        assert!((kpi.profit_growth_pct.unwrap() - 20.0).abs() < 1e-9);

        let kpi = compute_kpis(&current, Some(&[][..]), &NoBaseline);
        assert_eq!(kpi.sales_growth_pct, Some(0.0));
    }

    #[test]
    fn test_profit_growth_from_a_loss_is_zero() {
        let current = vec![record(raw("a", "2025-12-01", "full_day", 100))];
        let previous = vec![record(RawDailyRecord {
            purchase: 100,
            ..raw("a", "2025-11-01", "full_day", 0)
        })];

        let kpi = compute_kpis(&current, Some(previous.as_slice()), &NoBaseline);
        assert_eq!(kpi.operating_profit.units(), 100);
        assert_eq!(kpi.profit_growth_pct, Some(0.0));
        assert_eq!(kpi.sales_growth_pct, Some(0.0));
    }

    #[test]
    fn test_scope_kpis() {
        let brands: BrandDirectory = [("a", "izakaya"), ("b", "cafe")].into_iter().collect();
        let records = mixed_records();

        let kpi = compute_scope_kpis(&Scope::Brand("cafe".into()), &records, None, &NoBaseline, &brands);
        assert_eq!(kpi.total_sales.units(), 90_000);

        let kpi = compute_scope_kpis(&Scope::Store("a".into()), &records, None, &NoBaseline, &brands);
        assert_eq!(kpi.record_count, 2);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[30.0, 20.0]), 25.0);
    }
}
