//! # Store Comparison
//!
//! Per-store league table with chain totals.
//!
//! ## Trend Band
//! ```text
//!   sales growth  >  +1%   → Up
//!   sales growth  < -1%    → Down
//!   otherwise / no prior   → Stable
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::expense::BaselineSource;
use crate::kpi::{compute_kpis, mean};
use crate::money::Money;
use crate::period::group_by_store;
use crate::types::DailyRecord;

/// Growth inside `±TREND_STABLE_BAND_PCT` reads as stable.
pub const TREND_STABLE_BAND_PCT: f64 = 1.0;

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Sales,
    Profit,
    Margin,
    RecordCount,
}

impl FromStr for SortKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(SortKey::Sales),
            "profit" => Ok(SortKey::Profit),
            "margin" => Ok(SortKey::Margin),
            "record_count" | "report_count" => Ok(SortKey::RecordCount),
            other => Err(ValidationError::NotAllowed {
                field: "sort_by".to_string(),
                value: other.to_string(),
                allowed: vec!["sales".into(), "profit".into(), "margin".into(), "record_count".into()],
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn from_growth(growth_pct: Option<f64>) -> Self {
        match growth_pct {
            Some(g) if g > TREND_STABLE_BAND_PCT => Trend::Up,
            Some(g) if g < -TREND_STABLE_BAND_PCT => Trend::Down,
            _ => Trend::Stable,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "up"),
            Trend::Down => write!(f, "down"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// One store's line in the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreRow {
    /// 1-based position after sorting.
    pub rank: u32,
    pub store_id: String,
    pub sales: Money,
    pub operating_profit: Money,
    pub profit_margin_pct: f64,
    pub record_count: u64,
    pub average_daily_sales: f64,
    #[ts(as = "Option<String>")]
    pub last_record_date: Option<NaiveDate>,
    pub sales_growth_pct: Option<f64>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChainTotals {
    pub total_sales: Money,
    pub total_profit: Money,
    /// Simple mean of the store margins.
    pub average_margin_pct: f64,
    pub total_records: u64,
    pub store_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreComparison {
    pub rows: Vec<StoreRow>,
    pub totals: ChainTotals,
}

// =============================================================================
// Comparison
// =============================================================================

/// Builds the ranked per-store table.
///
/// `previous` is the comparison window used for each store's trend. Ties
/// are broken by store id.
pub fn compare_stores<B: BaselineSource + ?Sized>(
    records: &[DailyRecord],
    previous: Option<&[DailyRecord]>,
    baselines: &B,
    sort_by: SortKey,
    order: SortOrder,
) -> StoreComparison {
    let previous_by_store = previous.map(group_by_store);

    let mut rows: Vec<StoreRow> = group_by_store(records)
        .into_iter()
        .map(|(store_id, store_records)| {
            let prior = previous_by_store
                .as_ref()
                .map(|by_store| by_store.get(&store_id).map(Vec::as_slice).unwrap_or(&[]));
            let kpi = compute_kpis(&store_records, prior, baselines);

            StoreRow {
                rank: 0,
                last_record_date: store_records.iter().map(|r| r.date).max(),
                store_id,
                sales: kpi.total_sales,
                operating_profit: kpi.operating_profit,
                profit_margin_pct: kpi.profit_margin_pct,
                record_count: kpi.record_count,
                average_daily_sales: kpi.average_daily_sales,
                sales_growth_pct: kpi.sales_growth_pct,
                trend: Trend::from_growth(kpi.sales_growth_pct),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        let primary = compare_by(a, b, sort_by);
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.store_id.cmp(&b.store_id))
    });
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index as u32 + 1;
    }

    let margins: Vec<f64> = rows.iter().map(|r| r.profit_margin_pct).collect();
    let totals = ChainTotals {
        total_sales: rows.iter().map(|r| r.sales).sum(),
        total_profit: rows.iter().map(|r| r.operating_profit).sum(),
        average_margin_pct: mean(&margins),
        total_records: rows.iter().map(|r| r.record_count).sum(),
        store_count: rows.len() as u64,
    };

    StoreComparison { rows, totals }
}

fn compare_by(a: &StoreRow, b: &StoreRow, key: SortKey) -> Ordering {
    match key {
        SortKey::Sales => a.sales.cmp(&b.sales),
        SortKey::Profit => a.operating_profit.cmp(&b.operating_profit),
        SortKey::Margin => a.profit_margin_pct.total_cmp(&b.profit_margin_pct),
        SortKey::RecordCount => a.record_count.cmp(&b.record_count),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
