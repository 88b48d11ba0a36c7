//! # Achievement Evaluator
//!
//! Compares a `KpiSnapshot` with a `ResolvedTarget`.
//!
//! ## Run-Rate Projection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  period_end = 2025-12-20 (December has 31 days)                        │
//! │                                                                         │
//! │  days_remaining       = 31 - 20                  = 11                  │
//! │  remaining_sales      = max(0, target - actual)                        │
//! │  required_daily_sales = remaining / days_remaining                     │
//! │                                                                         │
//! │  period_end on the last day ⇒ days_remaining = 0,                      │
//! │  required_daily_sales = 0 ("period closed")                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::kpi::KpiSnapshot;
use crate::money::{safe_div, Money};
use crate::target::ResolvedTarget;
use crate::types::{DailyTarget, YearMonth};

/// Fallback average spend per customer when a period has no customers yet.
pub const DEFAULT_AVERAGE_SPEND: f64 = 3_500.0;

// =============================================================================
// Monthly Achievement
// =============================================================================

/// Actual versus target for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Achievement {
    pub sales_achievement_pct: f64,
    pub profit_achievement_pct: f64,
    pub remaining_sales: Money,
    pub days_remaining: u32,
    pub required_daily_sales: f64,
    pub required_daily_customers: f64,
    pub is_achieved: bool,

    /// Actual minus target, in percentage points.
    pub profit_margin_gap_pts: f64,
    pub cost_rate_gap_pts: f64,
    pub labor_rate_gap_pts: f64,
}

impl Achievement {
    /// True once the evaluation date is the last day of its month.
    pub fn is_period_closed(&self) -> bool {
        self.days_remaining == 0
    }
}

/// Days left in `date`'s month after `date` itself.
pub fn days_remaining_in_month(date: NaiveDate) -> u32 {
    YearMonth::from_date(date).days_in_month().saturating_sub(date.day())
}

/// Evaluates achievement with the default average-spend fallback.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tenpo_core::achievement::evaluate;
/// use tenpo_core::kpi::KpiSnapshot;
/// use tenpo_core::money::Money;
/// use tenpo_core::target::ResolvedTarget;
/// use tenpo_core::Scope;
///
/// let kpi = KpiSnapshot { total_sales: Money::from_units(4_000_000), ..Default::default() };
/// let mut target = ResolvedTarget::zero(Scope::AllStores, "2025-12".parse().unwrap());
/// target.target_sales = Money::from_units(5_000_000);
///
/// let result = evaluate(&kpi, &target, NaiveDate::from_ymd_opt(2025, 12, 20).unwrap());
/// assert_eq!(result.days_remaining, 11);
/// assert_eq!(Money::from_rounded(result.required_daily_sales).units(), 90_909);
/// ```
pub fn evaluate(kpi: &KpiSnapshot, target: &ResolvedTarget, period_end: NaiveDate) -> Achievement {
    evaluate_with_spend(kpi, target, period_end, DEFAULT_AVERAGE_SPEND)
}

/// Evaluates achievement, using `fallback_spend` when the KPI average
/// ticket is zero.
pub fn evaluate_with_spend(
    kpi: &KpiSnapshot,
    target: &ResolvedTarget,
    period_end: NaiveDate,
    fallback_spend: f64,
) -> Achievement {
    let remaining_sales = (target.target_sales - kpi.total_sales).non_negative();
    let days_remaining = days_remaining_in_month(period_end);
    let required_daily_sales = if days_remaining > 0 {
        remaining_sales.per(days_remaining as u64)
    } else {
        0.0
    };

    let spend = if kpi.average_ticket > 0.0 {
        kpi.average_ticket
    } else {
        fallback_spend
    };

    Achievement {
        sales_achievement_pct: kpi.total_sales.percent_of(target.target_sales),
        profit_achievement_pct: kpi.operating_profit.percent_of(target.target_profit),
        remaining_sales,
        days_remaining,
        required_daily_sales,
        required_daily_customers: safe_div(required_daily_sales, spend),
        is_achieved: kpi.total_sales >= target.target_sales,
        profit_margin_gap_pts: kpi.profit_margin_pct - target.target_profit_margin_pct,
        cost_rate_gap_pts: kpi.purchase_rate_pct - target.target_cost_rate_pct,
        labor_rate_gap_pts: kpi.labor_rate_pct - target.target_labor_rate_pct,
    }
}

// =============================================================================
// Daily Achievement
// =============================================================================

/// Actual versus target for one store-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyAchievement {
    pub store_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub target_sales: Money,
    pub actual_sales: Money,
    pub achievement_rate_pct: f64,
    pub is_achieved: bool,
    /// `actual - target`; negative when short.
    pub difference: Money,
}

pub fn evaluate_daily(actual_sales: Money, target: &DailyTarget) -> DailyAchievement {
    DailyAchievement {
        store_id: target.store_id.clone(),
        date: target.date,
        target_sales: target.target_sales,
        actual_sales,
        achievement_rate_pct: actual_sales.percent_of(target.target_sales),
        is_achieved: actual_sales >= target.target_sales,
        difference: actual_sales - target.target_sales,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn target(sales: i64, profit: i64) -> ResolvedTarget {
        ResolvedTarget {
            target_sales: Money::from_units(sales),
            target_profit: Money::from_units(profit),
            target_profit_margin_pct: 15.0,
            target_cost_rate_pct: 30.0,
            target_labor_rate_pct: 25.0,
            contributing_stores: 1,
            ..ResolvedTarget::zero(Scope::Store("a".into()), "2025-12".parse().unwrap())
        }
    }

    fn kpi(sales: i64, profit: i64) -> KpiSnapshot {
        KpiSnapshot {
            total_sales: Money::from_units(sales),
            operating_profit: Money::from_units(profit),
            ..Default::default()
        }
    }

    #[test]
    fn test_mid_month_run_rate() {
        let result = evaluate(&kpi(4_000_000, 500_000), &target(5_000_000, 750_000), date("2025-12-20"));

        assert_eq!(result.remaining_sales.units(), 1_000_000);
        assert_eq!(result.days_remaining, 11);
        assert!((result.required_daily_sales - 90_909.09).abs() < 0.01);
        assert_eq!(result.sales_achievement_pct, 80.0);
        assert!(!result.is_achieved);
        assert!((result.profit_achievement_pct - 66.666_666).abs() < 1e-3);
    }

    #[test]
    fn test_last_day_closes_period() {
        for end in ["2025-12-31", "2025-11-30", "2024-02-29"] {
            let result = evaluate(&kpi(1_000, 0), &target(5_000_000, 0), date(end));
            assert_eq!(result.days_remaining, 0, "{end}");
            assert_eq!(result.required_daily_sales, 0.0);
            assert!(result.is_period_closed());
        }
    }

    #[test]
    fn test_over_target() {
        let result = evaluate(&kpi(6_000_000, 900_000), &target(5_000_000, 750_000), date("2025-12-10"));
        assert!(result.is_achieved);
        assert_eq!(result.remaining_sales, Money::zero());
        assert_eq!(result.required_daily_sales, 0.0);
        assert_eq!(result.sales_achievement_pct, 120.0);
    }

    #[test]
    fn test_zero_target_guards() {
        let result = evaluate(&kpi(1_000, 100), &target(0, 0), date("2025-12-10"));
        assert_eq!(result.sales_achievement_pct, 0.0);
        assert_eq!(result.profit_achievement_pct, 0.0);
        assert!(result.is_achieved);
    }

    #[test]
    fn test_required_customers_uses_ticket_then_fallback() {
        let no_customers = evaluate(&kpi(0, 0), &target(350_000, 0), date("2025-12-21"));
        // 350000 / 10 days / 3500
        assert!((no_customers.required_daily_customers - 10.0).abs() < 1e-9);

        let with_ticket = KpiSnapshot {
            average_ticket: 5_000.0,
            ..kpi(0, 0)
        };
        let result = evaluate(&with_ticket, &target(350_000, 0), date("2025-12-21"));
        assert!((result.required_daily_customers - 7.0).abs() < 1e-9);

        let custom = evaluate_with_spend(&kpi(0, 0), &target(350_000, 0), date("2025-12-21"), 1_000.0);
        assert!((custom.required_daily_customers - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_rate_gaps() {
        let actual = KpiSnapshot {
            profit_margin_pct: 12.0,
            purchase_rate_pct: 33.0,
            labor_rate_pct: 24.0,
            ..kpi(100, 12)
        };
        let result = evaluate(&actual, &target(100, 15), date("2025-12-10"));
        assert_eq!(result.profit_margin_gap_pts, -3.0);
        assert_eq!(result.cost_rate_gap_pts, 3.0);
        assert_eq!(result.labor_rate_gap_pts, -1.0);
    }

    #[test]
    fn test_daily_achievement() {
        let daily = DailyTarget {
            store_id: "a".into(),
            date: date("2025-12-05"),
            target_sales: Money::from_units(200_000),
        };

        let short = evaluate_daily(Money::from_units(150_000), &daily);
        assert_eq!(short.achievement_rate_pct, 75.0);
        assert!(!short.is_achieved);
        assert_eq!(short.difference.units(), -50_000);

        let hit = evaluate_daily(Money::from_units(200_000), &daily);
        assert!(hit.is_achieved);
        assert_eq!(hit.difference, Money::zero());
    }
}
