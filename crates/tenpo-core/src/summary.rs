//! # Period Summaries
//!
//! Table rows for the records view: one KPI snapshot per period, or per
//! `(period, store)` when split by store.
//!
//! ```text
//!   key         store   sales     profit   achievement (daily only)
//!   ──────────  ─────   ───────   ──────   ────────────────────────
//!   2025-12-01  a       120000    30000    96.0%
//!   2025-12-01  b        80000    12000    -
//!   2025-12-02  a       140000    41000    112.0%
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::achievement::{evaluate_daily, DailyAchievement};
use crate::expense::BaselineSource;
use crate::kpi::{compute_kpis, KpiSnapshot};
use crate::money::Money;
use crate::period::{group_by, group_by_store};
use crate::types::{DailyRecord, DailyTarget, Granularity};
use crate::ALL_STORES;

/// One row of a period table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodSummary {
    pub key: String,
    /// Set when the table is split by store.
    pub store_id: Option<String>,
    pub kpi: KpiSnapshot,
    /// Daily granularity only, and only when a daily target exists.
    pub daily_achievement: Option<DailyAchievement>,
}

/// Builds chronologically ordered period rows.
pub fn summarize_periods<B: BaselineSource + ?Sized>(
    records: &[DailyRecord],
    granularity: Granularity,
    baselines: &B,
    split_by_store: bool,
    daily_targets: &[DailyTarget],
) -> Vec<PeriodSummary> {
    let mut rows = Vec::new();

    for (key, bucket) in group_by(records, granularity) {
        if split_by_store {
            for (store_id, store_records) in group_by_store(&bucket) {
                let kpi = compute_kpis(&store_records, None, baselines);
                let daily_achievement = daily_row_achievement(granularity, &store_records, &kpi, daily_targets);
                rows.push(PeriodSummary {
                    key: key.clone(),
                    store_id: Some(store_id),
                    kpi,
                    daily_achievement,
                });
            }
        } else {
            let kpi = compute_kpis(&bucket, None, baselines);
            let daily_achievement = daily_row_achievement(granularity, &bucket, &kpi, daily_targets);
            rows.push(PeriodSummary {
                key,
                store_id: None,
                kpi,
                daily_achievement,
            });
        }
    }

    rows
}

/// Daily target achievement for one day's rows.
///
/// Targets of every store present in the row are summed.
fn daily_row_achievement(
    granularity: Granularity,
    records: &[DailyRecord],
    kpi: &KpiSnapshot,
    daily_targets: &[DailyTarget],
) -> Option<DailyAchievement> {
    if granularity != Granularity::Daily {
        return None;
    }
    let date = records.first()?.date;
    let stores: BTreeSet<&str> = records.iter().map(|r| r.store_id.as_str()).collect();

    let matching: Vec<&DailyTarget> = daily_targets
        .iter()
        .filter(|t| t.date == date && stores.contains(t.store_id.as_str()))
        .collect();
    if matching.is_empty() {
        return None;
    }

    let store_id = match stores.iter().next() {
        Some(only) if stores.len() == 1 => only.to_string(),
        _ => ALL_STORES.to_string(),
    };
    let combined = DailyTarget {
        store_id,
        date,
        target_sales: matching.iter().map(|t| t.target_sales).sum::<Money>(),
    };
    Some(evaluate_daily(kpi.total_sales, &combined))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::NoBaseline;
    use crate::types::RawDailyRecord;
    use crate::validation::normalize;
    use chrono::NaiveDate;

    fn record(store: &str, date: &str, sales: i64) -> DailyRecord {
        normalize(&RawDailyRecord {
            id: format!("{store}-{date}"),
            store_id: store.into(),
            date: date.into(),
            operation_slice: "full_day".into(),
            sales: Some(sales),
            ..Default::default()
        })
        .unwrap()
    }

    fn daily_target(store: &str, date: &str, sales: i64) -> DailyTarget {
        DailyTarget {
            store_id: store.into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            target_sales: Money::from_units(sales),
        }
    }

    fn records() -> Vec<DailyRecord> {
        vec![
            record("b", "2025-12-02", 80_000),
            record("a", "2025-12-01", 120_000),
            record("b", "2025-12-01", 60_000),
            record("a", "2025-12-08", 100_000),
        ]
    }

    #[test]
    fn test_rows_are_chronological() {
        let rows = summarize_periods(&records(), Granularity::Daily, &NoBaseline, false, &[]);
        let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2025-12-01", "2025-12-02", "2025-12-08"]);
        assert_eq!(rows[0].kpi.total_sales.units(), 180_000);
        assert!(rows.iter().all(|r| r.store_id.is_none()));
    }

    #[test]
    fn test_split_by_store() {
        let rows = summarize_periods(&records(), Granularity::Weekly, &NoBaseline, true, &[]);
        let pairs: Vec<_> = rows
            .iter()
            .map(|r| (r.key.as_str(), r.store_id.as_deref().unwrap(), r.kpi.total_sales.units()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("2025-12-01", "a", 120_000),
                ("2025-12-01", "b", 140_000),
                ("2025-12-08", "a", 100_000),
            ]
        );
    }

    #[test]
    fn test_daily_targets_attach_to_daily_rows() {
        let targets = vec![daily_target("a", "2025-12-01", 100_000), daily_target("b", "2025-12-01", 100_000)];

        let split = summarize_periods(&records(), Granularity::Daily, &NoBaseline, true, &targets);
        let a_first = split[0].daily_achievement.as_ref().unwrap();
        assert_eq!(a_first.store_id, "a");
        assert_eq!(a_first.achievement_rate_pct, 120.0);
        assert!(split[2].daily_achievement.is_none());

        let combined = summarize_periods(&records(), Granularity::Daily, &NoBaseline, false, &targets);
        let first = combined[0].daily_achievement.as_ref().unwrap();
        assert_eq!(first.store_id, ALL_STORES);
        assert_eq!(first.target_sales.units(), 200_000);
        assert_eq!(first.achievement_rate_pct, 90.0);

        let monthly = summarize_periods(&records(), Granularity::Monthly, &NoBaseline, false, &targets);
        assert_eq!(monthly.len(), 1);
        assert!(monthly[0].daily_achievement.is_none());
    }
}
