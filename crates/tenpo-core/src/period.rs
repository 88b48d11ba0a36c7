//! # Period Grouper
//!
//! Buckets records by day, ISO week or month, independent of store.
//!
//! ## Key Formats
//! ```text
//! ┌──────────────┬────────────────────────────────┬──────────────┐
//! │ Granularity  │ Key                            │ Example      │
//! ├──────────────┼────────────────────────────────┼──────────────┤
//! │ Daily        │ the record's own date          │ 2025-12-03   │
//! │ Weekly       │ Monday on/before the date      │ 2025-12-01   │
//! │ Monthly      │ YYYY-MM                        │ 2025-12      │
//! └──────────────┴────────────────────────────────┴──────────────┘
//! ```
//!
//! Every key format sorts lexicographically in chronological order, and
//! `group_by` returns a `BTreeMap`, so iteration is already chronological.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{DailyRecord, Granularity, YearMonth};

// =============================================================================
// Period Keys
// =============================================================================

/// The Monday on or before `date`.
#[inline]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Bucket key for `date` at the given granularity.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tenpo_core::period::period_key;
/// use tenpo_core::Granularity;
///
/// let sunday = NaiveDate::from_ymd_opt(2025, 12, 7).unwrap();
/// assert_eq!(period_key(sunday, Granularity::Weekly), "2025-12-01");
/// assert_eq!(period_key(sunday, Granularity::Monthly), "2025-12");
/// ```
pub fn period_key(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => week_start(date).format("%Y-%m-%d").to_string(),
        Granularity::Monthly => YearMonth::from_date(date).to_string(),
    }
}

/// First and last calendar day covered by a period key.
pub fn period_bounds(key: &str, granularity: Granularity) -> CoreResult<(NaiveDate, NaiveDate)> {
    let invalid = |expected: &'static str| CoreError::InvalidPeriodKey {
        key: key.to_string(),
        expected,
    };

    match granularity {
        Granularity::Daily => {
            let day = NaiveDate::parse_from_str(key, "%Y-%m-%d").map_err(|_| invalid("YYYY-MM-DD"))?;
            Ok((day, day))
        }
        Granularity::Weekly => {
            let monday =
                NaiveDate::parse_from_str(key, "%Y-%m-%d").map_err(|_| invalid("a Monday as YYYY-MM-DD"))?;
            if week_start(monday) != monday {
                return Err(invalid("a Monday as YYYY-MM-DD"));
            }
            Ok((monday, monday + Duration::days(6)))
        }
        Granularity::Monthly => {
            let month: YearMonth = key.parse().map_err(|_| invalid("YYYY-MM"))?;
            Ok((month.first_day(), month.last_day()))
        }
    }
}

// =============================================================================
// Grouping
// =============================================================================

/// One period's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PeriodBucket {
    pub key: String,
    pub records: Vec<DailyRecord>,
}

/// Groups records by period key.
///
/// No record is dropped or duplicated; input order is preserved within
/// each bucket.
pub fn group_by(records: &[DailyRecord], granularity: Granularity) -> BTreeMap<String, Vec<DailyRecord>> {
    let mut groups: BTreeMap<String, Vec<DailyRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(period_key(record.date, granularity))
            .or_default()
            .push(record.clone());
    }
    groups
}

/// `group_by` flattened into chronologically ordered buckets.
pub fn buckets(records: &[DailyRecord], granularity: Granularity) -> Vec<PeriodBucket> {
    group_by(records, granularity)
        .into_iter()
        .map(|(key, records)| PeriodBucket { key, records })
        .collect()
}

/// Groups records by store id, sorted by id.
pub fn group_by_store(records: &[DailyRecord]) -> BTreeMap<String, Vec<DailyRecord>> {
    let mut groups: BTreeMap<String, Vec<DailyRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.store_id.clone())
            .or_default()
            .push(record.clone());
    }
    groups
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawDailyRecord;
    use crate::validation::normalize;

    fn record(store: &str, date: &str) -> DailyRecord {
        normalize(&RawDailyRecord {
            id: format!("{store}-{date}"),
            store_id: store.into(),
            date: date.into(),
            operation_slice: "full_day".into(),
            sales: Some(10_000),
            ..Default::default()
        })
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_start_is_monday() {
        assert_eq!(week_start(date("2025-12-01")), date("2025-12-01"));
        assert_eq!(week_start(date("2025-12-07")), date("2025-12-01"));
        assert_eq!(week_start(date("2025-12-08")), date("2025-12-08"));
        // Crosses a year boundary
        assert_eq!(week_start(date("2026-01-01")), date("2025-12-29"));
    }

    #[test]
    fn test_full_week_lands_in_one_bucket() {
        let records: Vec<_> = (1..=7).map(|d| record("a", &format!("2025-12-{d:02}"))).collect();
        let groups = group_by(&records, Granularity::Weekly);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups["2025-12-01"].len(), 7);
    }

    #[test]
    fn test_grouping_is_complete_for_every_granularity() {
        let records = vec![
            record("a", "2025-11-30"),
            record("b", "2025-12-01"),
            record("a", "2025-12-01"),
            record("a", "2025-12-15"),
            record("c", "2026-01-02"),
        ];

        for granularity in [Granularity::Daily, Granularity::Weekly, Granularity::Monthly] {
            let total: usize = group_by(&records, granularity).values().map(Vec::len).sum();
            assert_eq!(total, records.len(), "{granularity}");
        }
    }

    #[test]
    fn test_keys_are_chronological() {
        let records = vec![record("a", "2026-01-02"), record("a", "2025-11-30"), record("a", "2025-12-15")];
        let keys: Vec<_> = buckets(&records, Granularity::Monthly).into_iter().map(|b| b.key).collect();
        assert_eq!(keys, vec!["2025-11", "2025-12", "2026-01"]);
    }

    #[test]
    fn test_period_bounds() {
        assert_eq!(
            period_bounds("2025-12", Granularity::Monthly).unwrap(),
            (date("2025-12-01"), date("2025-12-31"))
        );
        assert_eq!(
            period_bounds("2025-12-01", Granularity::Weekly).unwrap(),
            (date("2025-12-01"), date("2025-12-07"))
        );
        assert!(period_bounds("2025-12-02", Granularity::Weekly).is_err());
        assert!(period_bounds("2025/12", Granularity::Monthly).is_err());
    }

    #[test]
    fn test_group_by_store() {
        let records = vec![record("b", "2025-12-01"), record("a", "2025-12-01"), record("b", "2025-12-02")];
        let groups = group_by_store(&records);
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(groups["b"].len(), 2);
    }
}
