//! # Target Repository
//!
//! Monthly store targets and per-day sales targets.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tenpo_core::validation::parse_date;
use tenpo_core::{DailyTarget, DateRange, Money, TargetSpec, YearMonth, ALL_STORES};

/// Filter for `list_targets`; absent fields mean no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetFilter {
    /// A store id, or `"all"`.
    pub store_id: Option<String>,
    pub period: Option<YearMonth>,
}

impl TargetFilter {
    /// Every store's target for one month.
    pub fn for_period(period: YearMonth) -> Self {
        TargetFilter {
            store_id: None,
            period: Some(period),
        }
    }

    fn store_restriction(&self) -> Option<&str> {
        self.store_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != ALL_STORES)
    }
}

#[derive(sqlx::FromRow)]
struct TargetRow {
    store_id: String,
    period: String,
    target_sales: i64,
    target_profit: i64,
    target_profit_margin_pct: f64,
    target_cost_rate_pct: f64,
    target_labor_rate_pct: f64,
}

impl TargetRow {
    fn into_target(self) -> DbResult<TargetSpec> {
        let period = self.period.parse().map_err(|e| DbError::invalid_row("targets", e))?;
        Ok(TargetSpec {
            store_id: self.store_id,
            period,
            target_sales: Money::from_units(self.target_sales),
            target_profit: Money::from_units(self.target_profit),
            target_profit_margin_pct: self.target_profit_margin_pct,
            target_cost_rate_pct: self.target_cost_rate_pct,
            target_labor_rate_pct: self.target_labor_rate_pct,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DailyTargetRow {
    store_id: String,
    date: String,
    target_sales: i64,
}

impl DailyTargetRow {
    fn into_target(self) -> DbResult<DailyTarget> {
        let date = parse_date("date", &self.date).map_err(|e| DbError::invalid_row("daily_targets", e))?;
        Ok(DailyTarget {
            store_id: self.store_id,
            date,
            target_sales: Money::from_units(self.target_sales),
        })
    }
}

/// Repository for targets.
#[derive(Debug, Clone)]
pub struct TargetRepository {
    pool: SqlitePool,
}

impl TargetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TargetRepository { pool }
    }

    /// Monthly targets matching `filter`, ordered by period then store.
    pub async fn list_targets(&self, filter: &TargetFilter) -> DbResult<Vec<TargetSpec>> {
        debug!(store_id = ?filter.store_id, period = ?filter.period.map(|p| p.to_string()), "Listing targets");

        let rows: Vec<TargetRow> = sqlx::query_as(
            r#"
            SELECT
                store_id, period, target_sales, target_profit,
                target_profit_margin_pct, target_cost_rate_pct, target_labor_rate_pct
            FROM targets
            WHERE (?1 IS NULL OR store_id = ?1)
              AND (?2 IS NULL OR period = ?2)
            ORDER BY period, store_id
            "#,
        )
        .bind(filter.store_restriction())
        .bind(filter.period.map(|p| p.to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TargetRow::into_target).collect()
    }

    /// One target per `(store_id, period)`; later writes replace earlier ones.
    pub async fn upsert(&self, target: &TargetSpec) -> DbResult<()> {
        debug!(
            store_id = %target.store_id,
            period = %target.period,
            target_sales = %target.target_sales,
            "Upserting target"
        );

        sqlx::query(
            r#"
            INSERT INTO targets (
                store_id, period, target_sales, target_profit,
                target_profit_margin_pct, target_cost_rate_pct, target_labor_rate_pct,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
            ON CONFLICT(store_id, period) DO UPDATE SET
                target_sales = excluded.target_sales,
                target_profit = excluded.target_profit,
                target_profit_margin_pct = excluded.target_profit_margin_pct,
                target_cost_rate_pct = excluded.target_cost_rate_pct,
                target_labor_rate_pct = excluded.target_labor_rate_pct,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&target.store_id)
        .bind(target.period.to_string())
        .bind(target.target_sales.units())
        .bind(target.target_profit.units())
        .bind(target.target_profit_margin_pct)
        .bind(target.target_cost_rate_pct)
        .bind(target.target_labor_rate_pct)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Daily targets inside `range`, optionally for one store.
    pub async fn list_daily_targets(&self, store_id: Option<&str>, range: DateRange) -> DbResult<Vec<DailyTarget>> {
        let store_id = store_id.filter(|id| *id != ALL_STORES);
        debug!(store_id = ?store_id, from = ?range.from, to = ?range.to, "Listing daily targets");

        let rows: Vec<DailyTargetRow> = sqlx::query_as(
            r#"
            SELECT store_id, date, target_sales
            FROM daily_targets
            WHERE (?1 IS NULL OR store_id = ?1)
              AND (?2 IS NULL OR date >= ?2)
              AND (?3 IS NULL OR date <= ?3)
            ORDER BY date, store_id
            "#,
        )
        .bind(store_id)
        .bind(range.from.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(range.to.map(|d| d.format("%Y-%m-%d").to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DailyTargetRow::into_target).collect()
    }

    pub async fn upsert_daily(&self, target: &DailyTarget) -> DbResult<()> {
        debug!(store_id = %target.store_id, date = %target.date, "Upserting daily target");

        sqlx::query(
            r#"
            INSERT INTO daily_targets (store_id, date, target_sales, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(store_id, date) DO UPDATE SET
                target_sales = excluded.target_sales,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&target.store_id)
        .bind(target.date.format("%Y-%m-%d").to_string())
        .bind(target.target_sales.units())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
