//! # Target Resolver
//!
//! Finds the target for a `(scope, period)` pair.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scope::Store(id)                                                       │
//! │     exact (store_id, period) match, else None ("target not set")       │
//! │                                                                         │
//! │  Scope::AllStores / Scope::Brand(id)                                    │
//! │     target_sales, target_profit     SUM over contributing stores       │
//! │     target_profit_margin_pct        target_profit / target_sales * 100 │
//! │     target_cost_rate_pct            simple MEAN over stores            │
//! │     target_labor_rate_pct           simple MEAN over stores            │
//! │     no contributing stores          every field 0 (never None)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every branch returns the same `ResolvedTarget` shape, so callers never
//! care which scope produced it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::kpi::mean;
use crate::money::Money;
use crate::scope::{BrandDirectory, Scope};
use crate::types::{TargetSpec, YearMonth};

// =============================================================================
// Resolved Target
// =============================================================================

/// A target for any scope, shaped like a single-store `TargetSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedTarget {
    pub scope: Scope,
    #[ts(as = "String")]
    pub period: YearMonth,
    pub target_sales: Money,
    pub target_profit: Money,
    pub target_profit_margin_pct: f64,
    pub target_cost_rate_pct: f64,
    pub target_labor_rate_pct: f64,
    /// Number of store targets folded into this one.
    pub contributing_stores: u64,
}

impl ResolvedTarget {
    /// An all-zero target for aggregate scopes with no store targets.
    pub fn zero(scope: Scope, period: YearMonth) -> Self {
        ResolvedTarget {
            scope,
            period,
            target_sales: Money::zero(),
            target_profit: Money::zero(),
            target_profit_margin_pct: 0.0,
            target_cost_rate_pct: 0.0,
            target_labor_rate_pct: 0.0,
            contributing_stores: 0,
        }
    }

    /// Wraps one store's target unchanged.
    pub fn from_spec(spec: &TargetSpec) -> Self {
        ResolvedTarget {
            scope: Scope::Store(spec.store_id.clone()),
            period: spec.period,
            target_sales: spec.target_sales,
            target_profit: spec.target_profit,
            target_profit_margin_pct: spec.target_profit_margin_pct,
            target_cost_rate_pct: spec.target_cost_rate_pct,
            target_labor_rate_pct: spec.target_labor_rate_pct,
            contributing_stores: 1,
        }
    }

    /// Sums and averages store targets into one aggregate.
    pub fn aggregate<'a>(scope: Scope, period: YearMonth, specs: impl IntoIterator<Item = &'a TargetSpec>) -> Self {
        let mut target = ResolvedTarget::zero(scope, period);
        let mut cost_rates = Vec::new();
        let mut labor_rates = Vec::new();

        for spec in specs {
            target.target_sales += spec.target_sales;
            target.target_profit += spec.target_profit;
            cost_rates.push(spec.target_cost_rate_pct);
            labor_rates.push(spec.target_labor_rate_pct);
            target.contributing_stores += 1;
        }

        target.target_profit_margin_pct = target.target_profit.percent_of(target.target_sales);
        target.target_cost_rate_pct = mean(&cost_rates);
        target.target_labor_rate_pct = mean(&labor_rates);
        target
    }

    /// True when there is nothing to measure against.
    pub fn is_empty(&self) -> bool {
        self.contributing_stores == 0
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolves the target for `scope` in `period`.
///
/// Returns `None` only for a single store with no target. Aggregate scopes
/// always produce a value, zero-filled when no store contributes.
///
/// ## Example
/// ```rust
/// use tenpo_core::target::resolve_target;
/// use tenpo_core::{BrandDirectory, Scope, YearMonth};
///
/// let period: YearMonth = "2025-12".parse().unwrap();
/// let brands = BrandDirectory::new();
///
/// assert!(resolve_target(&Scope::Store("a".into()), period, &[], &brands).is_none());
/// let all = resolve_target(&Scope::AllStores, period, &[], &brands).unwrap();
/// assert_eq!(all.target_sales.units(), 0);
/// ```
pub fn resolve_target(
    scope: &Scope,
    period: YearMonth,
    targets: &[TargetSpec],
    brands: &BrandDirectory,
) -> Option<ResolvedTarget> {
    let in_period = targets.iter().filter(move |t| t.period == period);

    match scope {
        Scope::Store(store_id) => in_period
            .filter(|t| &t.store_id == store_id)
            .map(ResolvedTarget::from_spec)
            .next(),
        Scope::AllStores | Scope::Brand(_) => Some(ResolvedTarget::aggregate(
            scope.clone(),
            period,
            in_period.filter(|t| scope.includes_store(&t.store_id, brands)),
        )),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(store: &str, period: &str, sales: i64, profit: i64, cost: f64, labor: f64) -> TargetSpec {
        TargetSpec {
            store_id: store.into(),
            period: period.parse().unwrap(),
            target_sales: Money::from_units(sales),
            target_profit: Money::from_units(profit),
            target_profit_margin_pct: 0.0,
            target_cost_rate_pct: cost,
            target_labor_rate_pct: labor,
        }
    }

    fn december() -> YearMonth {
        "2025-12".parse().unwrap()
    }

    fn targets() -> Vec<TargetSpec> {
        vec![
            spec("a", "2025-12", 5_000_000, 750_000, 30.0, 25.0),
            spec("b", "2025-12", 3_000_000, 450_000, 34.0, 27.0),
            spec("a", "2025-11", 4_000_000, 600_000, 30.0, 25.0),
        ]
    }

    fn brands() -> BrandDirectory {
        [("a", "ramen"), ("b", "cafe")].into_iter().collect()
    }

    #[test]
    fn test_all_stores_sums_and_averages() {
        let all = resolve_target(&Scope::AllStores, december(), &targets(), &brands()).unwrap();

        assert_eq!(all.target_sales.units(), 8_000_000);
        assert_eq!(all.target_profit.units(), 1_200_000);
        assert_eq!(all.target_profit_margin_pct, 15.0);
        assert_eq!(all.target_cost_rate_pct, 32.0);
        assert_eq!(all.target_labor_rate_pct, 26.0);
        assert_eq!(all.contributing_stores, 2);
    }

    #[test]
    fn test_all_stores_sales_equals_sum_for_period() {
        let targets = targets();
        let all = resolve_target(&Scope::AllStores, december(), &targets, &brands()).unwrap();
        let expected: Money = targets
            .iter()
            .filter(|t| t.period == december())
            .map(|t| t.target_sales)
            .sum();
        assert_eq!(all.target_sales, expected);
    }

    #[test]
    fn test_single_store_exact_match_or_none() {
        let found = resolve_target(&Scope::Store("b".into()), december(), &targets(), &brands()).unwrap();
        assert_eq!(found.target_sales.units(), 3_000_000);
        assert_eq!(found.contributing_stores, 1);

        let november: YearMonth = "2025-11".parse().unwrap();
        assert!(resolve_target(&Scope::Store("b".into()), november, &targets(), &brands()).is_none());
    }

    #[test]
    fn test_brand_scope_restricts_to_brand_stores() {
        let ramen = resolve_target(&Scope::Brand("ramen".into()), december(), &targets(), &brands()).unwrap();
        assert_eq!(ramen.target_sales.units(), 5_000_000);
        assert_eq!(ramen.target_cost_rate_pct, 30.0);
        assert_eq!(ramen.scope, Scope::Brand("ramen".into()));
    }

    #[test]
    fn test_empty_aggregate_is_zero_not_none() {
        for scope in [Scope::AllStores, Scope::Brand("bar".into())] {
            let resolved = resolve_target(&scope, "2026-01".parse().unwrap(), &targets(), &brands()).unwrap();
            assert!(resolved.is_empty());
            assert_eq!(resolved.target_sales, Money::zero());
            assert_eq!(resolved.target_profit_margin_pct, 0.0);
            assert_eq!(resolved.target_cost_rate_pct, 0.0);
        }
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let mut reversed = targets();
        reversed.reverse();
        let a = resolve_target(&Scope::AllStores, december(), &targets(), &brands());
        let b = resolve_target(&Scope::AllStores, december(), &reversed, &brands());
        assert_eq!(a, b);
    }
}
