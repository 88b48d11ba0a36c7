//! # Scope Filter
//!
//! Narrows a record set by store, brand and date range before grouping.
//!
//! ## Scope Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scope::AllStores      every store in the chain ("all")                │
//! │  Scope::Brand(id)      stores mapped to the brand in BrandDirectory    │
//! │  Scope::Store(id)      exactly one store                               │
//! │                                                                         │
//! │  The same Scope drives both record filtering and target resolution,    │
//! │  so a dashboard never mixes one store's records with another           │
//! │  scope's targets.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::DailyRecord;
use crate::ALL_STORES;

// =============================================================================
// Scope
// =============================================================================

/// The store/brand/all-stores selection for one computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
    Store(String),
    Brand(String),
    #[default]
    AllStores,
}

impl Scope {
    /// Scope for a store id, honouring the `"all"` sentinel.
    pub fn from_store_id(store_id: Option<&str>) -> Self {
        match store_id {
            None => Scope::AllStores,
            Some(id) if id.is_empty() || id == ALL_STORES => Scope::AllStores,
            Some(id) => Scope::Store(id.to_string()),
        }
    }

    /// Does a record for `store_id` fall inside this scope?
    pub fn includes_store(&self, store_id: &str, brands: &BrandDirectory) -> bool {
        match self {
            Scope::AllStores => true,
            Scope::Store(id) => id == store_id,
            Scope::Brand(brand) => brands.brand_of(store_id) == Some(brand.as_str()),
        }
    }

    /// Store id when this is a single-store scope.
    pub fn store_id(&self) -> Option<&str> {
        match self {
            Scope::Store(id) => Some(id),
            _ => None,
        }
    }
}

/// `all`, `brand:<id>`, `store:<id>`.
impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::AllStores => f.write_str(ALL_STORES),
            Scope::Brand(id) => write!(f, "brand:{id}"),
            Scope::Store(id) => write!(f, "store:{id}"),
        }
    }
}

/// Parses the `Display` form. A bare id is read as a store id.
impl FromStr for Scope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let non_empty = |id: &str| {
            if id.is_empty() {
                Err(ValidationError::Required {
                    field: "scope".to_string(),
                })
            } else {
                Ok(id.to_string())
            }
        };

        if s.is_empty() || s == ALL_STORES {
            Ok(Scope::AllStores)
        } else if let Some(id) = s.strip_prefix("brand:") {
            non_empty(id).map(Scope::Brand)
        } else if let Some(id) = s.strip_prefix("store:") {
            non_empty(id).map(Scope::Store)
        } else if s.contains(':') {
            Err(ValidationError::InvalidFormat {
                field: "scope".to_string(),
                reason: format!("unknown scope prefix in '{s}'"),
            })
        } else {
            Ok(Scope::Store(s.to_string()))
        }
    }
}

// =============================================================================
// Brand Directory
// =============================================================================

/// Store → brand mapping, supplied by the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandDirectory {
    brand_by_store: HashMap<String, String>,
}

impl BrandDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a store to a brand, replacing any earlier assignment.
    pub fn assign(&mut self, store_id: impl Into<String>, brand_id: impl Into<String>) {
        self.brand_by_store.insert(store_id.into(), brand_id.into());
    }

    pub fn brand_of(&self, store_id: &str) -> Option<&str> {
        self.brand_by_store.get(store_id).map(String::as_str)
    }

    /// Stores belonging to `brand_id`, sorted.
    pub fn stores_of(&self, brand_id: &str) -> BTreeSet<&str> {
        self.brand_by_store
            .iter()
            .filter(|(_, brand)| brand.as_str() == brand_id)
            .map(|(store, _)| store.as_str())
            .collect()
    }

    /// True if the store belongs to any of `brand_ids`.
    pub fn in_any_brand(&self, store_id: &str, brand_ids: &[String]) -> bool {
        self.brand_of(store_id)
            .map(|brand| brand_ids.iter().any(|b| b == brand))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.brand_by_store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brand_by_store.is_empty()
    }
}

impl<S: Into<String>, B: Into<String>> FromIterator<(S, B)> for BrandDirectory {
    fn from_iter<I: IntoIterator<Item = (S, B)>>(iter: I) -> Self {
        let mut directory = BrandDirectory::new();
        for (store, brand) in iter {
            directory.assign(store, brand);
        }
        directory
    }
}

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive date bounds; either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        DateRange { from, to }
    }

    /// Closed range `[from, to]`.
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange {
            from: Some(from),
            to: Some(to),
        }
    }

    /// No bounds at all.
    pub fn unbounded() -> Self {
        DateRange::default()
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Number of days in a closed range; `None` if either end is open.
    pub fn len_days(&self) -> Option<i64> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if to >= from => Some((to - from).num_days() + 1),
            (Some(_), Some(_)) => Some(0),
            _ => None,
        }
    }

    /// The range of equal length ending the day before `from`.
    ///
    /// Used as the growth comparison window. `None` for open or empty ranges.
    pub fn preceding(&self) -> Option<DateRange> {
        let from = self.from?;
        let len = self.len_days().filter(|len| *len > 0)?;
        let to = from - Duration::days(1);
        Some(DateRange::between(to - Duration::days(len - 1), to))
    }
}

// =============================================================================
// Filter
// =============================================================================

/// Record filter; every absent field means "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScopeFilter {
    /// A store id, or the `"all"` sentinel.
    pub store_id: Option<String>,
    pub brand_ids: Option<Vec<String>>,
    #[ts(as = "Option<String>")]
    pub date_from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub date_to: Option<NaiveDate>,
}

impl ScopeFilter {
    /// Filter matching a scope over a date range.
    pub fn for_scope(scope: &Scope, range: DateRange) -> Self {
        let (store_id, brand_ids) = match scope {
            Scope::AllStores => (None, None),
            Scope::Store(id) => (Some(id.clone()), None),
            Scope::Brand(id) => (None, Some(vec![id.clone()])),
        };
        ScopeFilter {
            store_id,
            brand_ids,
            date_from: range.from,
            date_to: range.to,
        }
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.date_from, self.date_to)
    }

    /// The concrete store restriction, with `"all"` treated as none.
    pub fn store_restriction(&self) -> Option<&str> {
        self.store_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != ALL_STORES)
    }

    /// Does a single record pass every restriction?
    pub fn matches(&self, record: &DailyRecord, brands: &BrandDirectory) -> bool {
        if let Some(store) = self.store_restriction() {
            if record.store_id != store {
                return false;
            }
        }
        if let Some(brand_ids) = &self.brand_ids {
            if !brands.in_any_brand(&record.store_id, brand_ids) {
                return false;
            }
        }
        self.date_range().contains(record.date)
    }
}

/// Keeps the records that pass `filter`, preserving order.
pub fn filter_records(records: &[DailyRecord], filter: &ScopeFilter, brands: &BrandDirectory) -> Vec<DailyRecord> {
    records
        .iter()
        .filter(|record| filter.matches(record, brands))
        .cloned()
        .collect()
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
            sales: Some(1_000),
            ..Default::default()
        })
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> (Vec<DailyRecord>, BrandDirectory) {
        let records = vec![
            record("a", "2025-12-01"),
            record("b", "2025-12-02"),
            record("c", "2025-12-03"),
            record("a", "2025-12-04"),
        ];
        let brands: BrandDirectory = [("a", "ramen"), ("b", "ramen"), ("c", "cafe")].into_iter().collect();
        (records, brands)
    }

    fn ids(records: &[DailyRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_all_sentinel_means_no_store_restriction() {
        let (records, brands) = sample();
        let filter = ScopeFilter {
            store_id: Some(ALL_STORES.to_string()),
            ..Default::default()
        };
        assert_eq!(filter_records(&records, &filter, &brands).len(), 4);
    }

    #[test]
    fn test_store_and_brand_filters() {
        let (records, brands) = sample();

        let by_store = ScopeFilter {
            store_id: Some("a".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_records(&records, &by_store, &brands)), vec!["a-2025-12-01", "a-2025-12-04"]);

        let by_brand = ScopeFilter {
            brand_ids: Some(vec!["ramen".into()]),
            ..Default::default()
        };
        assert_eq!(filter_records(&records, &by_brand, &brands).len(), 3);
    }

    #[test]
    fn test_date_bounds_are_inclusive_and_optional() {
        let (records, brands) = sample();
        let filter = ScopeFilter {
            date_from: Some(date("2025-12-02")),
            date_to: Some(date("2025-12-03")),
            ..Default::default()
        };
        assert_eq!(ids(&filter_records(&records, &filter, &brands)), vec!["b-2025-12-02", "c-2025-12-03"]);

        let open_ended = ScopeFilter {
            date_from: Some(date("2025-12-03")),
            ..Default::default()
        };
        assert_eq!(filter_records(&records, &open_ended, &brands).len(), 2);
    }

    #[test]
    fn test_unknown_store_has_no_brand() {
        let (_, brands) = sample();
        let filter = ScopeFilter::for_scope(&Scope::Brand("ramen".into()), DateRange::unbounded());
        assert!(filter_records(&[record("z", "2025-12-01")], &filter, &brands).is_empty());
    }

    #[test]
    fn test_scope_parse_and_display() {
        assert_eq!("all".parse::<Scope>().unwrap(), Scope::AllStores);
        assert_eq!("brand:ramen".parse::<Scope>().unwrap(), Scope::Brand("ramen".into()));
        assert_eq!("store-1".parse::<Scope>().unwrap(), Scope::Store("store-1".into()));
        assert!("brand:".parse::<Scope>().is_err());
        assert!("region:x".parse::<Scope>().is_err());

        let scope = Scope::Store("a".into());
        assert_eq!(scope.to_string().parse::<Scope>().unwrap(), scope);
        assert_eq!(Scope::from_store_id(Some("all")), Scope::AllStores);
    }

    #[test]
    fn test_scope_serde_shape() {
        let json = serde_json::to_string(&Scope::Brand("cafe".into())).unwrap();
        assert_eq!(json, r#"{"kind":"brand","id":"cafe"}"#);
        let json = serde_json::to_string(&Scope::AllStores).unwrap();
        assert_eq!(json, r#"{"kind":"all_stores"}"#);
    }

    #[test]
    fn test_preceding_range() {
        let december = DateRange::between(date("2025-12-01"), date("2025-12-31"));
        assert_eq!(december.len_days(), Some(31));

        let previous = december.preceding().unwrap();
        assert_eq!(previous, DateRange::between(date("2025-10-31"), date("2025-11-30")));

        assert!(DateRange::new(Some(date("2025-12-01")), None).preceding().is_none());
    }
}
