//! # Target Templates
//!
//! Starting-point rate targets per business type.
//!
//! ```text
//! ┌────────────┬─────────────────┬─────────────────┬─────────────────┐
//! │ Type       │ HighMargin      │ Balanced        │ HighVolume      │
//! │            │ margin/cost/lab │ margin/cost/lab │ margin/cost/lab │
//! ├────────────┼─────────────────┼─────────────────┼─────────────────┤
//! │ restaurant │ 20 / 30 / 24    │ 15 / 33 / 27    │ 12 / 36 / 29    │
//! │ izakaya    │ 18 / 30 / 25    │ 14 / 33 / 28    │ 11 / 36 / 30    │
//! │ cafe       │ 22 / 28 / 23    │ 17 / 32 / 26    │ 13 / 36 / 28    │
//! │ ramen      │ 20 / 30 / 24    │ 16 / 33 / 27    │ 13 / 36 / 29    │
//! │ bar        │ 25 / 25 / 22    │ 20 / 28 / 25    │ 15 / 32 / 28    │
//! │ fastfood   │ 15 / 32 / 26    │ 12 / 35 / 28    │  9 / 38 / 30    │
//! │ bakery     │ 23 / 28 / 22    │ 18 / 32 / 25    │ 14 / 35 / 27    │
//! │ other      │ 20 / 30 / 25    │ 15 / 33 / 28    │ 12 / 36 / 30    │
//! └────────────┴─────────────────┴─────────────────┴─────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{TargetSpec, YearMonth};

// =============================================================================
// Brand Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BrandType {
    Restaurant,
    Izakaya,
    Cafe,
    Ramen,
    Bar,
    #[serde(rename = "fastfood")]
    FastFood,
    Bakery,
    #[default]
    Other,
}

impl BrandType {
    pub const ALL: [BrandType; 8] = [
        BrandType::Restaurant,
        BrandType::Izakaya,
        BrandType::Cafe,
        BrandType::Ramen,
        BrandType::Bar,
        BrandType::FastFood,
        BrandType::Bakery,
        BrandType::Other,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            BrandType::Restaurant => "restaurant",
            BrandType::Izakaya => "izakaya",
            BrandType::Cafe => "cafe",
            BrandType::Ramen => "ramen",
            BrandType::Bar => "bar",
            BrandType::FastFood => "fastfood",
            BrandType::Bakery => "bakery",
            BrandType::Other => "other",
        }
    }

    /// Unknown or missing types map to `Other`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .and_then(|v| BrandType::ALL.into_iter().find(|t| t.as_str().eq_ignore_ascii_case(v)))
            .unwrap_or(BrandType::Other)
    }

    /// `[margin, cost, labor]` for each profile, high-margin first.
    fn rates(&self) -> [[f64; 3]; 3] {
        match self {
            BrandType::Restaurant => [[20.0, 30.0, 24.0], [15.0, 33.0, 27.0], [12.0, 36.0, 29.0]],
            BrandType::Izakaya => [[18.0, 30.0, 25.0], [14.0, 33.0, 28.0], [11.0, 36.0, 30.0]],
            BrandType::Cafe => [[22.0, 28.0, 23.0], [17.0, 32.0, 26.0], [13.0, 36.0, 28.0]],
            BrandType::Ramen => [[20.0, 30.0, 24.0], [16.0, 33.0, 27.0], [13.0, 36.0, 29.0]],
            BrandType::Bar => [[25.0, 25.0, 22.0], [20.0, 28.0, 25.0], [15.0, 32.0, 28.0]],
            BrandType::FastFood => [[15.0, 32.0, 26.0], [12.0, 35.0, 28.0], [9.0, 38.0, 30.0]],
            BrandType::Bakery => [[23.0, 28.0, 22.0], [18.0, 32.0, 25.0], [14.0, 35.0, 27.0]],
            BrandType::Other => [[20.0, 30.0, 25.0], [15.0, 33.0, 28.0], [12.0, 36.0, 30.0]],
        }
    }
}

impl fmt::Display for BrandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TemplateProfile {
    /// Margin first, premium pricing.
    HighMargin,
    Balanced,
    /// Thin margin, high turnover.
    HighVolume,
}

impl TemplateProfile {
    pub const ALL: [TemplateProfile; 3] = [
        TemplateProfile::HighMargin,
        TemplateProfile::Balanced,
        TemplateProfile::HighVolume,
    ];

    const fn index(&self) -> usize {
        match self {
            TemplateProfile::HighMargin => 0,
            TemplateProfile::Balanced => 1,
            TemplateProfile::HighVolume => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TargetTemplate {
    pub brand_type: BrandType,
    pub profile: TemplateProfile,
    pub profit_margin_pct: f64,
    pub cost_rate_pct: f64,
    pub labor_rate_pct: f64,
}

impl TargetTemplate {
    pub fn new(brand_type: BrandType, profile: TemplateProfile) -> Self {
        let [margin, cost, labor] = brand_type.rates()[profile.index()];
        TargetTemplate {
            brand_type,
            profile,
            profit_margin_pct: margin,
            cost_rate_pct: cost,
            labor_rate_pct: labor,
        }
    }

    /// A store target for `period` with profit derived from the margin.
    ///
    /// ## Example
    /// ```rust
    /// use tenpo_core::money::Money;
    /// use tenpo_core::templates::{BrandType, TargetTemplate, TemplateProfile};
    ///
    /// let template = TargetTemplate::new(BrandType::Izakaya, TemplateProfile::Balanced);
    /// let target = template.to_target("a", "2025-12".parse().unwrap(), Money::from_units(5_000_000));
    /// assert_eq!(target.target_profit.units(), 700_000);
    /// ```
    pub fn to_target(&self, store_id: &str, period: YearMonth, target_sales: Money) -> TargetSpec {
        TargetSpec {
            store_id: store_id.to_string(),
            period,
            target_sales,
            target_profit: Money::from_rounded(target_sales.as_f64() * self.profit_margin_pct / 100.0),
            target_profit_margin_pct: self.profit_margin_pct,
            target_cost_rate_pct: self.cost_rate_pct,
            target_labor_rate_pct: self.labor_rate_pct,
        }
    }
}

/// All three profiles for a business type, high-margin first.
pub fn templates_for(brand_type: BrandType) -> [TargetTemplate; 3] {
    TemplateProfile::ALL.map(|profile| TargetTemplate::new(brand_type, profile))
}

// =============================================================================
// Unit Tests
// =============================================================================
