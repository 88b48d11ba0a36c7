//! # Domain Types
//!
//! Core domain types used throughout Tenpo.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DailyRecord    │   │ ExpenseBaseline │   │   TargetSpec    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  store_id       │   │  store_id       │   │  store_id       │       │
//! │  │  date + slice   │   │  year_month     │   │  period (month) │       │
//! │  │  sales          │   │  daily overhead │   │  sales / profit │       │
//! │  │  purchase/labor │   └─────────────────┘   │  rate targets   │       │
//! │  │  OverheadCosts  │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ OperationSlice  │   │   YearMonth     │   │  Granularity    │       │
//! │  │  Lunch          │   │  "2025-12"      │   │  Daily          │       │
//! │  │  Dinner         │   │                 │   │  Weekly (Mon)   │       │
//! │  │  FullDay        │   │                 │   │  Monthly        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! A `DailyRecord` is identified by `id`, and `(store_id, date,
//! operation_slice)` is unique within a canonical dataset. Edits supersede
//! a record; nothing here mutates one in place.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Operation Slice
// =============================================================================

/// Which part of a store-day a record covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OperationSlice {
    Lunch,
    Dinner,
    FullDay,
}

impl OperationSlice {
    /// All slices, in display order.
    pub const ALL: [OperationSlice; 3] = [
        OperationSlice::Lunch,
        OperationSlice::Dinner,
        OperationSlice::FullDay,
    ];

    /// Wire name (`lunch`, `dinner`, `full_day`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationSlice::Lunch => "lunch",
            OperationSlice::Dinner => "dinner",
            OperationSlice::FullDay => "full_day",
        }
    }
}

impl fmt::Display for OperationSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationSlice {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lunch" => Ok(OperationSlice::Lunch),
            "dinner" => Ok(OperationSlice::Dinner),
            "full_day" => Ok(OperationSlice::FullDay),
            other => Err(ValidationError::NotAllowed {
                field: "operation_slice".to_string(),
                value: other.to_string(),
                allowed: OperationSlice::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Year-Month
// =============================================================================

/// A calendar month, keyed as `YYYY-MM`.
///
/// Ordering is chronological, which matches the lexicographic order of the
/// `YYYY-MM` string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a month; `None` if `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day of the month.
    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    /// Number of days in the month (28..=31).
    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    /// The following month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            YearMonth {
                year: self.year - 1,
                month: 12,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "year_month".to_string(),
            reason: format!("expected YYYY-MM, got '{}'", s),
        };

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Granularity
// =============================================================================

/// The period-bucketing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    /// ISO week, Monday start.
    Weekly,
    #[default]
    Monthly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Daily => write!(f, "daily"),
            Granularity::Weekly => write!(f, "weekly"),
            Granularity::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Granularity::Daily),
            "weekly" | "week" => Ok(Granularity::Weekly),
            "monthly" | "month" => Ok(Granularity::Monthly),
            other => Err(ValidationError::NotAllowed {
                field: "granularity".to_string(),
                value: other.to_string(),
                allowed: vec!["daily".into(), "weekly".into(), "monthly".into()],
            }),
        }
    }
}

// =============================================================================
// Overhead Costs
// =============================================================================

/// The fixed set of overhead expense categories.
///
/// Purchase (cost of goods) and labor are tracked separately on the
/// record and are NOT overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OverheadCategory {
    Utilities,
    Rent,
    Consumables,
    Promotion,
    Cleaning,
    Misc,
    Communication,
    Others,
}

impl OverheadCategory {
    pub const ALL: [OverheadCategory; 8] = [
        OverheadCategory::Utilities,
        OverheadCategory::Rent,
        OverheadCategory::Consumables,
        OverheadCategory::Promotion,
        OverheadCategory::Cleaning,
        OverheadCategory::Misc,
        OverheadCategory::Communication,
        OverheadCategory::Others,
    ];

    /// Field name used in payloads and validation messages.
    pub const fn field_name(&self) -> &'static str {
        match self {
            OverheadCategory::Utilities => "utilities",
            OverheadCategory::Rent => "rent",
            OverheadCategory::Consumables => "consumables",
            OverheadCategory::Promotion => "promotion",
            OverheadCategory::Cleaning => "cleaning",
            OverheadCategory::Misc => "misc",
            OverheadCategory::Communication => "communication",
            OverheadCategory::Others => "others",
        }
    }
}

/// Amounts for the eight overhead categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverheadCosts {
    pub utilities: Money,
    pub rent: Money,
    pub consumables: Money,
    pub promotion: Money,
    pub cleaning: Money,
    pub misc: Money,
    pub communication: Money,
    pub others: Money,
}

impl OverheadCosts {
    /// Amount for one category.
    pub fn get(&self, category: OverheadCategory) -> Money {
        match category {
            OverheadCategory::Utilities => self.utilities,
            OverheadCategory::Rent => self.rent,
            OverheadCategory::Consumables => self.consumables,
            OverheadCategory::Promotion => self.promotion,
            OverheadCategory::Cleaning => self.cleaning,
            OverheadCategory::Misc => self.misc,
            OverheadCategory::Communication => self.communication,
            OverheadCategory::Others => self.others,
        }
    }

    /// Mutable access to one category.
    pub fn get_mut(&mut self, category: OverheadCategory) -> &mut Money {
        match category {
            OverheadCategory::Utilities => &mut self.utilities,
            OverheadCategory::Rent => &mut self.rent,
            OverheadCategory::Consumables => &mut self.consumables,
            OverheadCategory::Promotion => &mut self.promotion,
            OverheadCategory::Cleaning => &mut self.cleaning,
            OverheadCategory::Misc => &mut self.misc,
            OverheadCategory::Communication => &mut self.communication,
            OverheadCategory::Others => &mut self.others,
        }
    }

    /// Sum of all eight categories.
    pub fn total(&self) -> Money {
        OverheadCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

// =============================================================================
// Sales Breakdown
// =============================================================================

/// Sales split by payment method and consumption tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesBreakdown {
    pub cash_10: Money,
    pub cash_8: Money,
    pub credit_10: Money,
    pub credit_8: Money,
}

impl SalesBreakdown {
    pub fn total(&self) -> Money {
        self.cash_10 + self.cash_8 + self.credit_10 + self.credit_8
    }
}

// =============================================================================
// Daily Record
// =============================================================================

/// One operational slice of one store on one date.
///
/// Only the record normalizer constructs these from untrusted input, so
/// every amount is `>= 0` and the slice is a known value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyRecord {
    pub id: String,
    pub store_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub operation_slice: OperationSlice,

    /// Total sales for the slice.
    pub sales: Money,
    /// Present when sales were entered per payment/tax category.
    pub sales_breakdown: Option<SalesBreakdown>,

    pub customer_count: u64,
    pub lunch_customers: Option<u64>,
    pub dinner_customers: Option<u64>,

    /// Cost of goods.
    pub purchase: Money,
    pub labor_cost: Money,
    pub overhead: OverheadCosts,

    pub notes: String,
}

impl DailyRecord {
    /// Month the record falls in.
    #[inline]
    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// An unvalidated record payload as submitted by store staff.
///
/// Signed integers on purpose: the normalizer has to see a negative value
/// to reject it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct RawDailyRecord {
    pub id: String,
    pub store_id: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub operation_slice: String,

    pub sales: Option<i64>,
    pub sales_cash_10: Option<i64>,
    pub sales_cash_8: Option<i64>,
    pub sales_credit_10: Option<i64>,
    pub sales_credit_8: Option<i64>,

    pub customers: Option<i64>,
    pub lunch_customers: Option<i64>,
    pub dinner_customers: Option<i64>,

    pub purchase: i64,
    pub labor_cost: i64,
    pub utilities: i64,
    pub rent: i64,
    pub consumables: i64,
    pub promotion: i64,
    pub cleaning: i64,
    pub misc: i64,
    pub communication: i64,
    pub others: i64,

    pub notes: Option<String>,
}

impl RawDailyRecord {
    /// Raw amount for one overhead category.
    pub fn overhead(&self, category: OverheadCategory) -> i64 {
        match category {
            OverheadCategory::Utilities => self.utilities,
            OverheadCategory::Rent => self.rent,
            OverheadCategory::Consumables => self.consumables,
            OverheadCategory::Promotion => self.promotion,
            OverheadCategory::Cleaning => self.cleaning,
            OverheadCategory::Misc => self.misc,
            OverheadCategory::Communication => self.communication,
            OverheadCategory::Others => self.others,
        }
    }
}

impl From<&DailyRecord> for RawDailyRecord {
    fn from(record: &DailyRecord) -> Self {
        let breakdown = record.sales_breakdown;
        RawDailyRecord {
            id: record.id.clone(),
            store_id: record.store_id.clone(),
            date: record.date.format("%Y-%m-%d").to_string(),
            operation_slice: record.operation_slice.as_str().to_string(),
            sales: Some(record.sales.units()),
            sales_cash_10: breakdown.map(|b| b.cash_10.units()),
            sales_cash_8: breakdown.map(|b| b.cash_8.units()),
            sales_credit_10: breakdown.map(|b| b.credit_10.units()),
            sales_credit_8: breakdown.map(|b| b.credit_8.units()),
            customers: Some(record.customer_count as i64),
            lunch_customers: record.lunch_customers.map(|c| c as i64),
            dinner_customers: record.dinner_customers.map(|c| c as i64),
            purchase: record.purchase.units(),
            labor_cost: record.labor_cost.units(),
            utilities: record.overhead.utilities.units(),
            rent: record.overhead.rent.units(),
            consumables: record.overhead.consumables.units(),
            promotion: record.overhead.promotion.units(),
            cleaning: record.overhead.cleaning.units(),
            misc: record.overhead.misc.units(),
            communication: record.overhead.communication.units(),
            others: record.overhead.others.units(),
            notes: Some(record.notes.clone()),
        }
    }
}

// =============================================================================
// Expense Baseline
// =============================================================================

/// Per-store, per-month "typical" daily overhead.
///
/// Substituted for a record's overhead when the record's own eight
/// overhead categories are all zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseBaseline {
    pub store_id: String,
    #[ts(as = "String")]
    pub year_month: YearMonth,
    pub daily_overhead_estimate: Money,
}

// =============================================================================
// Targets
// =============================================================================

/// Monthly target for one store.
///
/// Percentages are nominally 0-100 but deliberately not clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TargetSpec {
    pub store_id: String,
    #[ts(as = "String")]
    pub period: YearMonth,
    pub target_sales: Money,
    pub target_profit: Money,
    pub target_profit_margin_pct: f64,
    pub target_cost_rate_pct: f64,
    pub target_labor_rate_pct: f64,
}

/// Sales target for one store on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyTarget {
    pub store_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub target_sales: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
