//! # Record Normalizer
//!
//! Turns a raw staff submission into a canonical [`DailyRecord`].
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Normalization Steps                                │
//! │                                                                         │
//! │  RawDailyRecord (signed ints, strings)                                 │
//! │       │                                                                 │
//! │       ├── id / store_id empty?            → Required                   │
//! │       ├── date not YYYY-MM-DD?            → InvalidFormat              │
//! │       ├── slice not lunch|dinner|full_day → NotAllowed                 │
//! │       ├── any amount or count < 0?        → Negative                   │
//! │       ├── above MAX_RECORD_* bounds?      → TooLarge                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sales = supplied value, else cash/credit × 8%/10% sub-amounts         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DailyRecord (every amount >= 0, known slice)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Negative values are rejected, never clamped: bad upstream data should
//! surface at entry time instead of quietly skewing a dashboard.
//!
//! ## Usage
//! ```rust
//! use tenpo_core::validation::normalize;
//! use tenpo_core::RawDailyRecord;
//!
//! let raw = RawDailyRecord {
//!     id: "r-1".into(),
//!     store_id: "store-a".into(),
//!     date: "2025-12-01".into(),
//!     operation_slice: "dinner".into(),
//!     sales_cash_10: Some(40_000),
//!     sales_credit_10: Some(60_000),
//!     ..Default::default()
//! };
//! let record = normalize(&raw).unwrap();
//! assert_eq!(record.sales.units(), 100_000);
//! ```

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::{MAX_RECORD_AMOUNT, MAX_RECORD_CUSTOMERS};
use crate::types::{
    DailyRecord, OperationSlice, OverheadCategory, OverheadCosts, RawDailyRecord, SalesBreakdown,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

fn require(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(value.to_string())
}

fn bounded(field: &str, value: i64, max: i64) -> ValidationResult<i64> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
    if value > max {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            value,
            max,
        });
    }
    Ok(value)
}

fn non_negative(field: &str, value: i64) -> ValidationResult<Money> {
    bounded(field, value, MAX_RECORD_AMOUNT).map(Money::from_units)
}

fn non_negative_count(field: &str, value: i64) -> ValidationResult<u64> {
    bounded(field, value, MAX_RECORD_CUSTOMERS).map(|v| v as u64)
}

fn optional_amount(field: &str, value: Option<i64>) -> ValidationResult<Option<Money>> {
    value.map(|v| non_negative(field, v)).transpose()
}

fn optional_count(field: &str, value: Option<i64>) -> ValidationResult<Option<u64>> {
    value.map(|v| non_negative_count(field, v)).transpose()
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    let value = require(field, value)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("expected a valid YYYY-MM-DD date ({})", e),
    })
}

// =============================================================================
// Normalizer
// =============================================================================

/// Validates and shapes one raw record.
///
/// ## Rules
/// - `sales`, when supplied, is taken as-is; otherwise it is the sum of the
///   four cash/credit × 8%/10% sub-amounts (absent sub-amounts count as 0)
/// - `customers`, when absent, is `lunch_customers + dinner_customers`
/// - Every amount and count must be `>= 0` and within the `MAX_RECORD_*` bounds
///
/// ## Errors
/// The first offending field, as a [`ValidationError`].
pub fn normalize(raw: &RawDailyRecord) -> ValidationResult<DailyRecord> {
    let id = require("id", &raw.id)?;
    let store_id = require("store_id", &raw.store_id)?;
    let date = parse_date("date", &raw.date)?;
    let operation_slice: OperationSlice = raw.operation_slice.trim().parse()?;

    // Sales and its payment/tax breakdown
    let cash_10 = optional_amount("sales_cash_10", raw.sales_cash_10)?;
    let cash_8 = optional_amount("sales_cash_8", raw.sales_cash_8)?;
    let credit_10 = optional_amount("sales_credit_10", raw.sales_credit_10)?;
    let credit_8 = optional_amount("sales_credit_8", raw.sales_credit_8)?;

    let has_breakdown =
        cash_10.is_some() || cash_8.is_some() || credit_10.is_some() || credit_8.is_some();
    let sales_breakdown = has_breakdown.then(|| SalesBreakdown {
        cash_10: cash_10.unwrap_or_default(),
        cash_8: cash_8.unwrap_or_default(),
        credit_10: credit_10.unwrap_or_default(),
        credit_8: credit_8.unwrap_or_default(),
    });

    let sales = match optional_amount("sales", raw.sales)? {
        Some(direct) => direct,
        None => {
            let derived = sales_breakdown.map(|b| b.total()).unwrap_or_default();
            non_negative("sales", derived.units())?
        }
    };

    // Customers
    let lunch_customers = optional_count("lunch_customers", raw.lunch_customers)?;
    let dinner_customers = optional_count("dinner_customers", raw.dinner_customers)?;
    let customer_count = match optional_count("customers", raw.customers)? {
        Some(count) => count,
        None => lunch_customers.unwrap_or(0) + dinner_customers.unwrap_or(0),
    };

    // Costs
    let purchase = non_negative("purchase", raw.purchase)?;
    let labor_cost = non_negative("labor_cost", raw.labor_cost)?;
    let mut overhead = OverheadCosts::default();
    for category in OverheadCategory::ALL {
        *overhead.get_mut(category) = non_negative(category.field_name(), raw.overhead(category))?;
    }

    Ok(DailyRecord {
        id,
        store_id,
        date,
        operation_slice,
        sales,
        sales_breakdown,
        customer_count,
        lunch_customers,
        dinner_customers,
        purchase,
        labor_cost,
        overhead,
        notes: raw.notes.clone().unwrap_or_default(),
    })
}

/// Normalizes a batch, stopping at the first bad payload.
///
/// ## Errors
/// `CoreError::RecordRejected` carrying the zero-based index of the
/// offending payload.
pub fn normalize_all(raws: &[RawDailyRecord]) -> CoreResult<Vec<DailyRecord>> {
    raws.iter()
        .enumerate()
        .map(|(index, raw)| normalize(raw).map_err(|source| CoreError::RecordRejected { index, source }))
        .collect()
}

// =============================================================================
// Duplicate Detection
// =============================================================================

/// A `(store, date, slice)` combination seen more than once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSlice {
    pub store_id: String,
    pub date: NaiveDate,
    pub operation_slice: OperationSlice,
    /// Ids of every record sharing the key, in input order.
    pub record_ids: Vec<String>,
}

/// Reports `(store, date, slice)` keys that occur more than once.
///
/// The engine never drops duplicates itself; this is for ingestion callers
/// that want to reject a batch before it reaches the canonical dataset.
pub fn find_duplicate_slices(records: &[DailyRecord]) -> Vec<DuplicateSlice> {
    let mut seen: BTreeMap<(&str, NaiveDate, OperationSlice), Vec<String>> = BTreeMap::new();
    for record in records {
        seen.entry((record.store_id.as_str(), record.date, record.operation_slice))
            .or_default()
            .push(record.id.clone());
    }

    seen.into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|((store_id, date, operation_slice), record_ids)| DuplicateSlice {
            store_id: store_id.to_string(),
            date,
            operation_slice,
            record_ids,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawDailyRecord {
        RawDailyRecord {
            id: "r-1".into(),
            store_id: "store-a".into(),
            date: "2025-12-01".into(),
            operation_slice: "full_day".into(),
            sales: Some(100_000),
            customers: Some(40),
            purchase: 30_000,
            labor_cost: 20_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_valid_record() {
        let record = normalize(&raw()).unwrap();
        assert_eq!(record.store_id, "store-a");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(record.operation_slice, OperationSlice::FullDay);
        assert_eq!(record.sales.units(), 100_000);
        assert_eq!(record.customer_count, 40);
        assert_eq!(record.purchase.units(), 30_000);
        assert!(record.overhead.total().is_zero());
        assert!(record.sales_breakdown.is_none());
    }

    #[test]
    fn test_sales_derived_from_sub_amounts() {
        let mut payload = raw();
        payload.sales = None;
        payload.sales_cash_10 = Some(10_000);
        payload.sales_cash_8 = Some(2_000);
        payload.sales_credit_10 = Some(30_000);
        payload.sales_credit_8 = Some(8_000);

        let record = normalize(&payload).unwrap();
        assert_eq!(record.sales.units(), 50_000);
        assert_eq!(record.sales_breakdown.unwrap().credit_10.units(), 30_000);
    }

    #[test]
    fn test_direct_sales_wins_over_sub_amounts() {
        let mut payload = raw();
        payload.sales_cash_10 = Some(1);
        let record = normalize(&payload).unwrap();
        assert_eq!(record.sales.units(), 100_000);
    }

    #[test]
    fn test_missing_sales_defaults_to_zero() {
        let mut payload = raw();
        payload.sales = None;
        let record = normalize(&payload).unwrap();
        assert!(record.sales.is_zero());
    }

    #[test]
    fn test_negative_amount_rejected_with_field() {
        let mut payload = raw();
        payload.rent = -1;
        let err = normalize(&payload).unwrap_err();
        assert_eq!(err.field(), "rent");
        assert!(matches!(err, ValidationError::Negative { value: -1, .. }));

        let mut payload = raw();
        payload.sales_credit_8 = Some(-100);
        assert_eq!(normalize(&payload).unwrap_err().field(), "sales_credit_8");

        let mut payload = raw();
        payload.customers = Some(-3);
        assert_eq!(normalize(&payload).unwrap_err().field(), "customers");
    }

    #[test]
    fn test_oversized_amount_rejected() {
        let mut payload = raw();
        payload.sales = Some(i64::MAX / 2 + 1);
        let err = normalize(&payload).unwrap_err();
        assert_eq!(err.field(), "sales");
        assert!(matches!(err, ValidationError::TooLarge { max: MAX_RECORD_AMOUNT, .. }));

        let mut payload = raw();
        payload.purchase = MAX_RECORD_AMOUNT;
        assert!(normalize(&payload).is_ok());
        payload.purchase = MAX_RECORD_AMOUNT + 1;
        assert_eq!(normalize(&payload).unwrap_err().field(), "purchase");

        let mut payload = raw();
        payload.customers = Some(MAX_RECORD_CUSTOMERS + 1);
        assert_eq!(normalize(&payload).unwrap_err().field(), "customers");
    }

    #[test]
    fn test_derived_sales_bounded() {
        let mut payload = raw();
        payload.sales = None;
        payload.sales_cash_10 = Some(MAX_RECORD_AMOUNT);
        payload.sales_credit_10 = Some(1);
        let err = normalize(&payload).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { ref field, .. } if field == "sales"));
    }

    #[test]
    fn test_unknown_slice_rejected() {
        let mut payload = raw();
        payload.operation_slice = "breakfast".into();
        let err = normalize(&payload).unwrap_err();
        assert_eq!(err.field(), "operation_slice");
    }

    #[test]
    fn test_invalid_date_rejected() {
        for bad in ["2025-02-30", "2025/12/01", "", "yesterday"] {
            let mut payload = raw();
            payload.date = bad.into();
            let err = normalize(&payload).unwrap_err();
            assert_eq!(err.field(), "date", "date '{}' should be rejected", bad);
        }
    }

    #[test]
    fn test_customers_fall_back_to_day_parts() {
        let mut payload = raw();
        payload.customers = None;
        payload.lunch_customers = Some(12);
        payload.dinner_customers = Some(30);
        let record = normalize(&payload).unwrap();
        assert_eq!(record.customer_count, 42);
    }

    #[test]
    fn test_normalize_all_reports_index() {
        let mut bad = raw();
        bad.store_id = "  ".into();
        let err = normalize_all(&[raw(), bad]).unwrap_err();
        match err {
            CoreError::RecordRejected { index, source } => {
                assert_eq!(index, 1);
                assert_eq!(source.field(), "store_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_round_trip_through_raw() {
        let record = normalize(&raw()).unwrap();
        let again = normalize(&RawDailyRecord::from(&record)).unwrap();
        assert_eq!(again, record);
    }

    #[test]
    fn test_find_duplicate_slices() {
        let a = normalize(&raw()).unwrap();
        let mut b = a.clone();
        b.id = "r-2".into();
        let mut c = a.clone();
        c.id = "r-3".into();
        c.operation_slice = OperationSlice::Lunch;

        let dups = find_duplicate_slices(&[a, b, c]);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].record_ids, vec!["r-1".to_string(), "r-2".to_string()]);
        assert_eq!(dups[0].operation_slice, OperationSlice::FullDay);
    }
}
