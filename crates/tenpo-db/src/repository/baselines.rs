//! # Baseline Repository
//!
//! Per-store, per-month daily overhead estimates.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tenpo_core::expense::MonthlyExpenseBaseline;
use tenpo_core::{BaselineBook, ExpenseBaseline, Money, YearMonth};

#[derive(sqlx::FromRow)]
struct BaselineRow {
    store_id: String,
    year_month: String,
    daily_overhead_estimate: i64,
}

impl BaselineRow {
    fn into_baseline(self) -> DbResult<ExpenseBaseline> {
        let year_month = self
            .year_month
            .parse()
            .map_err(|e| DbError::invalid_row("expense_baselines", e))?;

        Ok(ExpenseBaseline {
            store_id: self.store_id,
            year_month,
            daily_overhead_estimate: Money::from_units(self.daily_overhead_estimate),
        })
    }
}

/// Repository for expense baselines.
#[derive(Debug, Clone)]
pub struct BaselineRepository {
    pool: SqlitePool,
}

impl BaselineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BaselineRepository { pool }
    }

    /// Baseline for one store-month, if any.
    pub async fn get_expense_baseline(&self, store_id: &str, year_month: YearMonth) -> DbResult<Option<ExpenseBaseline>> {
        let row: Option<BaselineRow> = sqlx::query_as(
            r#"
            SELECT store_id, year_month, daily_overhead_estimate
            FROM expense_baselines
            WHERE store_id = ?1 AND year_month = ?2
            "#,
        )
        .bind(store_id)
        .bind(year_month.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(BaselineRow::into_baseline).transpose()
    }

    /// Every store's baseline for one month.
    pub async fn baselines_for_month(&self, year_month: YearMonth) -> DbResult<Vec<ExpenseBaseline>> {
        self.baselines_between(year_month, year_month).await
    }

    /// Baselines for every month in `[from, to]`, ordered by month then store.
    pub async fn baselines_between(&self, from: YearMonth, to: YearMonth) -> DbResult<Vec<ExpenseBaseline>> {
        debug!(from = %from, to = %to, "Listing expense baselines");

        let rows: Vec<BaselineRow> = sqlx::query_as(
            r#"
            SELECT store_id, year_month, daily_overhead_estimate
            FROM expense_baselines
            WHERE year_month BETWEEN ?1 AND ?2
            ORDER BY year_month, store_id
            "#,
        )
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BaselineRow::into_baseline).collect()
    }

    /// `baselines_between` collected into a lookup book.
    pub async fn book_between(&self, from: YearMonth, to: YearMonth) -> DbResult<BaselineBook> {
        Ok(self.baselines_between(from, to).await?.into_iter().collect())
    }

    pub async fn upsert(&self, baseline: &ExpenseBaseline) -> DbResult<()> {
        debug!(
            store_id = %baseline.store_id,
            year_month = %baseline.year_month,
            estimate = %baseline.daily_overhead_estimate,
            "Upserting expense baseline"
        );

        sqlx::query(
            r#"
            INSERT INTO expense_baselines (store_id, year_month, daily_overhead_estimate, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(store_id, year_month) DO UPDATE SET
                daily_overhead_estimate = excluded.daily_overhead_estimate,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&baseline.store_id)
        .bind(baseline.year_month.to_string())
        .bind(baseline.daily_overhead_estimate.units())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Derives the daily baseline from monthly totals and stores it.
    pub async fn upsert_monthly(&self, monthly: &MonthlyExpenseBaseline) -> DbResult<ExpenseBaseline> {
        let baseline = monthly.daily_baseline();
        self.upsert(&baseline).await?;
        Ok(baseline)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
