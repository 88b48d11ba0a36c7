//! # Record Repository
//!
//! Daily operational records, queried by scope filter.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ScopeFilter { store_id?, brand_ids?, date_from?, date_to? }           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT ... WHERE (?1 IS NULL OR store_id = ?1)                        │
//! │               AND (?2 IS NULL OR store_id IN brand stores of ?2)       │
//! │               AND (?3 IS NULL OR date >= ?3)                           │
//! │               AND (?4 IS NULL OR date <= ?4)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RecordRow ──► RawDailyRecord ──► normalize() ──► DailyRecord          │
//! │                                        │                                │
//! │                                        └── fails ⇒ DbError::InvalidRow │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows come back ordered by `(date, store_id, operation_slice)`.

use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tenpo_core::validation::normalize;
use tenpo_core::{DailyRecord, RawDailyRecord, ScopeFilter};

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, store_id, date, operation_slice,
        sales, sales_cash_10, sales_cash_8, sales_credit_10, sales_credit_8,
        customers, lunch_customers, dinner_customers,
        purchase, labor_cost,
        utilities, rent, consumables, promotion, cleaning, misc, communication, others,
        notes
    FROM daily_records
"#;

/// One `daily_records` row, before re-validation.
#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    id: String,
    store_id: String,
    date: String,
    operation_slice: String,
    sales: i64,
    sales_cash_10: Option<i64>,
    sales_cash_8: Option<i64>,
    sales_credit_10: Option<i64>,
    sales_credit_8: Option<i64>,
    customers: i64,
    lunch_customers: Option<i64>,
    dinner_customers: Option<i64>,
    purchase: i64,
    labor_cost: i64,
    utilities: i64,
    rent: i64,
    consumables: i64,
    promotion: i64,
    cleaning: i64,
    misc: i64,
    communication: i64,
    others: i64,
    notes: String,
}

impl RecordRow {
    fn into_record(self) -> DbResult<DailyRecord> {
        let raw = RawDailyRecord {
            id: self.id,
            store_id: self.store_id,
            date: self.date,
            operation_slice: self.operation_slice,
            sales: Some(self.sales),
            sales_cash_10: self.sales_cash_10,
            sales_cash_8: self.sales_cash_8,
            sales_credit_10: self.sales_credit_10,
            sales_credit_8: self.sales_credit_8,
            customers: Some(self.customers),
            lunch_customers: self.lunch_customers,
            dinner_customers: self.dinner_customers,
            purchase: self.purchase,
            labor_cost: self.labor_cost,
            utilities: self.utilities,
            rent: self.rent,
            consumables: self.consumables,
            promotion: self.promotion,
            cleaning: self.cleaning,
            misc: self.misc,
            communication: self.communication,
            others: self.others,
            notes: Some(self.notes),
        };
        normalize(&raw).map_err(|e| DbError::invalid_row("daily_records", e))
    }
}

/// Repository for daily record operations.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecordRepository { pool }
    }

    /// Records matching `filter`.
    ///
    /// A `store_id` of `"all"` means no store restriction. Brand ids are
    /// resolved through the `stores` table.
    pub async fn list_records(&self, filter: &ScopeFilter) -> DbResult<Vec<DailyRecord>> {
        debug!(
            store_id = ?filter.store_restriction(),
            brand_ids = ?filter.brand_ids,
            date_from = ?filter.date_from,
            date_to = ?filter.date_to,
            "Listing records"
        );

        let brand_ids = filter
            .brand_ids
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let sql = format!(
            r#"{SELECT_COLUMNS}
            WHERE (?1 IS NULL OR store_id = ?1)
              AND (?2 IS NULL OR store_id IN (
                    SELECT id FROM stores
                    WHERE brand_id IN (SELECT value FROM json_each(?2))))
              AND (?3 IS NULL OR date >= ?3)
              AND (?4 IS NULL OR date <= ?4)
            ORDER BY date, store_id, operation_slice
            "#
        );

        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(filter.store_restriction())
            .bind(brand_ids)
            .bind(filter.date_from.map(|d| d.format("%Y-%m-%d").to_string()))
            .bind(filter.date_to.map(|d| d.format("%Y-%m-%d").to_string()))
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .into_iter()
            .map(RecordRow::into_record)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<DailyRecord> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DbError::not_found("DailyRecord", id))?
            .into_record()
    }

    /// Writes a record, replacing any earlier snapshot for the same
    /// `(store_id, date, operation_slice)`. Re-saving an existing id under a
    /// different date or slice moves the record there.
    pub async fn upsert(&self, record: &DailyRecord) -> DbResult<()> {
        debug!(
            id = %record.id,
            store_id = %record.store_id,
            date = %record.date,
            slice = %record.operation_slice,
            "Upserting record"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        write_record(&mut *tx, record).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Writes a batch in one transaction; nothing is written if any fails.
    pub async fn upsert_many(&self, records: &[DailyRecord]) -> DbResult<usize> {
        debug!(count = records.len(), "Upserting record batch");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for record in records {
            write_record(&mut *tx, record).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(records.len())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting record");

        let result = sqlx::query("DELETE FROM daily_records WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DailyRecord", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM daily_records")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Drops the row holding `record.id` under another key, then upserts.
async fn write_record(conn: &mut SqliteConnection, record: &DailyRecord) -> DbResult<()> {
    sqlx::query(
        r#"
        DELETE FROM daily_records
        WHERE id = ?1
          AND NOT (store_id = ?2 AND date = ?3 AND operation_slice = ?4)
        "#,
    )
    .bind(record.id.as_str())
    .bind(record.store_id.as_str())
    .bind(record.date.format("%Y-%m-%d").to_string())
    .bind(record.operation_slice)
    .execute(&mut *conn)
    .await?;

    upsert_query(record).execute(&mut *conn).await?;
    Ok(())
}

fn upsert_query(record: &DailyRecord) -> sqlx::query::Query<'_, Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    let breakdown = record.sales_breakdown;
    let overhead = &record.overhead;

    sqlx::query(
        r#"
        INSERT INTO daily_records (
            id, store_id, date, operation_slice,
            sales, sales_cash_10, sales_cash_8, sales_credit_10, sales_credit_8,
            customers, lunch_customers, dinner_customers,
            purchase, labor_cost,
            utilities, rent, consumables, promotion, cleaning, misc, communication, others,
            notes, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8, ?9,
            ?10, ?11, ?12,
            ?13, ?14,
            ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
            ?23, datetime('now')
        )
        ON CONFLICT(store_id, date, operation_slice) DO UPDATE SET
            id = excluded.id,
            sales = excluded.sales,
            sales_cash_10 = excluded.sales_cash_10,
            sales_cash_8 = excluded.sales_cash_8,
            sales_credit_10 = excluded.sales_credit_10,
            sales_credit_8 = excluded.sales_credit_8,
            customers = excluded.customers,
            lunch_customers = excluded.lunch_customers,
            dinner_customers = excluded.dinner_customers,
            purchase = excluded.purchase,
            labor_cost = excluded.labor_cost,
            utilities = excluded.utilities,
            rent = excluded.rent,
            consumables = excluded.consumables,
            promotion = excluded.promotion,
            cleaning = excluded.cleaning,
            misc = excluded.misc,
            communication = excluded.communication,
            others = excluded.others,
            notes = excluded.notes,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(record.id.as_str())
    .bind(record.store_id.as_str())
    .bind(record.date.format("%Y-%m-%d").to_string())
    .bind(record.operation_slice)
    .bind(record.sales.units())
    .bind(breakdown.map(|b| b.cash_10.units()))
    .bind(breakdown.map(|b| b.cash_8.units()))
    .bind(breakdown.map(|b| b.credit_10.units()))
    .bind(breakdown.map(|b| b.credit_8.units()))
    .bind(record.customer_count as i64)
    .bind(record.lunch_customers.map(|c| c as i64))
    .bind(record.dinner_customers.map(|c| c as i64))
    .bind(record.purchase.units())
    .bind(record.labor_cost.units())
    .bind(overhead.utilities.units())
    .bind(overhead.rent.units())
    .bind(overhead.consumables.units())
    .bind(overhead.promotion.units())
    .bind(overhead.cleaning.units())
    .bind(overhead.misc.units())
    .bind(overhead.communication.units())
    .bind(overhead.others.units())
    .bind(record.notes.as_str())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::stores::{Brand, Store};
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;
    use tenpo_core::templates::BrandType;
    use tenpo_core::OperationSlice;

    async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stores = db.stores();
        stores
            .upsert_brand(&Brand {
                id: "cafe-co".into(),
                name: "Cafe Co".into(),
                brand_type: BrandType::Cafe,
            })
            .await
            .unwrap();
        for (id, brand) in [("a", Some("cafe-co")), ("b", None)] {
            stores
                .upsert(&Store {
                    id: id.into(),
                    name: id.to_uppercase(),
                    brand_id: brand.map(Into::into),
                })
                .await
                .unwrap();
        }
        db
    }

    fn record(id: &str, store: &str, date: &str, slice: &str, sales: i64) -> DailyRecord {
        normalize(&RawDailyRecord {
            id: id.into(),
            store_id: store.into(),
            date: date.into(),
            operation_slice: slice.into(),
            sales_cash_10: Some(sales / 2),
            sales_credit_10: Some(sales - sales / 2),
            lunch_customers: Some(4),
            purchase: 1_000,
            rent: 500,
            notes: Some("ok".into()),
            ..Default::default()
        })
        .unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_round_trip_preserves_record() {
        let db = seeded_db().await;
        let original = record("r1", "a", "2025-12-01", "lunch", 10_001);

        db.records().upsert(&original).await.unwrap();
        let loaded = db.records().get_by_id("r1").await.unwrap();

        assert_eq!(loaded, original);
        assert_eq!(loaded.operation_slice, OperationSlice::Lunch);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_slice() {
        let db = seeded_db().await;
        let repo = db.records();

        repo.upsert(&record("r1", "a", "2025-12-01", "dinner", 10_000)).await.unwrap();
        repo.upsert(&record("r2", "a", "2025-12-01", "dinner", 12_000)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.get_by_id("r2").await.unwrap().sales.units(), 12_000);
        assert!(matches!(repo.get_by_id("r1").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_resaving_id_under_new_slice_moves_record() {
        let db = seeded_db().await;
        let repo = db.records();

        repo.upsert(&record("r1", "a", "2025-12-01", "lunch", 10_000)).await.unwrap();
        repo.upsert(&record("r1", "a", "2025-12-02", "dinner", 15_000)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let moved = repo.get_by_id("r1").await.unwrap();
        assert_eq!(moved.date, date("2025-12-02"));
        assert_eq!(moved.operation_slice, OperationSlice::Dinner);
        assert_eq!(moved.sales.units(), 15_000);
    }

    #[tokio::test]
    async fn test_list_records_by_filter() {
        let db = seeded_db().await;
        let repo = db.records();
        repo.upsert_many(&[
            record("r1", "a", "2025-12-01", "full_day", 100),
            record("r2", "b", "2025-12-01", "full_day", 200),
            record("r3", "a", "2025-12-05", "full_day", 300),
            record("r4", "b", "2025-11-30", "full_day", 400),
        ])
        .await
        .unwrap();

        let all = repo
            .list_records(&ScopeFilter {
                store_id: Some("all".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r4", "r1", "r2", "r3"]);

        let store_a = repo
            .list_records(&ScopeFilter {
                store_id: Some("a".into()),
                date_to: Some(date("2025-12-04")),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(store_a.len(), 1);

        let brand = repo
            .list_records(&ScopeFilter {
                brand_ids: Some(vec!["cafe-co".into()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(brand.len(), 2);
        assert!(brand.iter().all(|r| r.store_id == "a"));

        let december = repo
            .list_records(&ScopeFilter {
                date_from: Some(date("2025-12-01")),
                date_to: Some(date("2025-12-31")),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(december.len(), 3);
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let db = seeded_db().await;
        let repo = db.records();

        let result = repo
            .upsert_many(&[
                record("r1", "a", "2025-12-01", "full_day", 100),
                record("r2", "unknown-store", "2025-12-01", "full_day", 100),
            ])
            .await;

        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_row_surfaces_as_invalid_row() {
        let db = seeded_db().await;
        db.records()
            .upsert(&record("r1", "a", "2025-12-01", "full_day", 100))
            .await
            .unwrap();

        sqlx::query("UPDATE daily_records SET rent = -5 WHERE id = 'r1'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.records().get_by_id("r1").await.unwrap_err();
        assert!(matches!(err, DbError::InvalidRow { table: "daily_records", .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = seeded_db().await;
        let repo = db.records();
        repo.upsert(&record("r1", "a", "2025-12-01", "full_day", 100)).await.unwrap();

        repo.delete("r1").await.unwrap();
        assert!(matches!(repo.delete("r1").await, Err(DbError::NotFound { .. })));
    }
}
