//! # Store Repository
//!
//! Stores, brands and the store → brand directory used by brand scopes.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tenpo_core::templates::BrandType;
use tenpo_core::BrandDirectory;

/// A store as stored in the `stores` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub brand_id: Option<String>,
}

/// A brand and its business type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub brand_type: BrandType,
}

#[derive(sqlx::FromRow)]
struct BrandRow {
    id: String,
    name: String,
    brand_type: String,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Brand {
            id: row.id,
            name: row.name,
            brand_type: BrandType::parse_lenient(Some(&row.brand_type)),
        }
    }
}

/// Repository for stores and brands.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Inserts or renames a brand.
    pub async fn upsert_brand(&self, brand: &Brand) -> DbResult<()> {
        debug!(id = %brand.id, brand_type = %brand.brand_type, "Upserting brand");

        sqlx::query(
            r#"
            INSERT INTO brands (id, name, brand_type)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                brand_type = excluded.brand_type
            "#,
        )
        .bind(&brand.id)
        .bind(&brand.name)
        .bind(brand.brand_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_brand(&self, id: &str) -> DbResult<Option<Brand>> {
        let row: Option<BrandRow> = sqlx::query_as("SELECT id, name, brand_type FROM brands WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Brand::from))
    }

    /// Inserts a store or updates its name and brand.
    pub async fn upsert(&self, store: &Store) -> DbResult<()> {
        debug!(id = %store.id, brand_id = ?store.brand_id, "Upserting store");

        sqlx::query(
            r#"
            INSERT INTO stores (id, name, brand_id)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                brand_id = excluded.brand_id
            "#,
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(&store.brand_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Store> {
        let store: Option<Store> = sqlx::query_as("SELECT id, name, brand_id FROM stores WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        store.ok_or_else(|| DbError::not_found("Store", id))
    }

    /// All stores, ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Store>> {
        let stores = sqlx::query_as("SELECT id, name, brand_id FROM stores ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(stores)
    }

    /// Store → brand mapping for every store that has a brand.
    pub async fn brand_directory(&self) -> DbResult<BrandDirectory> {
        let pairs: Vec<(String, String)> =
            sqlx::query_as("SELECT id, brand_id FROM stores WHERE brand_id IS NOT NULL")
                .fetch_all(&self.pool)
                .await?;

        debug!(count = pairs.len(), "Loaded brand directory");
        Ok(pairs.into_iter().collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn store(id: &str, brand: Option<&str>) -> Store {
        Store {
            id: id.into(),
            name: format!("Store {id}"),
            brand_id: brand.map(Into::into),
        }
    }

    #[tokio::test]
    async fn test_brand_directory() {
        let db = db().await;
        let repo = db.stores();

        repo.upsert_brand(&Brand {
            id: "ramen-co".into(),
            name: "Ramen Co".into(),
            brand_type: BrandType::Ramen,
        })
        .await
        .unwrap();
        repo.upsert(&store("a", Some("ramen-co"))).await.unwrap();
        repo.upsert(&store("b", Some("ramen-co"))).await.unwrap();
        repo.upsert(&store("c", None)).await.unwrap();

        let directory = repo.brand_directory().await.unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.brand_of("a"), Some("ramen-co"));
        assert_eq!(directory.brand_of("c"), None);
        assert_eq!(repo.count().await.unwrap(), 3);

        let brand = repo.get_brand("ramen-co").await.unwrap().unwrap();
        assert_eq!(brand.brand_type, BrandType::Ramen);
    }

    #[tokio::test]
    async fn test_unknown_brand_is_foreign_key_violation() {
        let db = db().await;
        let err = db.stores().upsert(&store("a", Some("missing"))).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_upsert_updates_and_get_missing() {
        let db = db().await;
        let repo = db.stores();

        repo.upsert(&store("a", None)).await.unwrap();
        repo.upsert(&Store {
            name: "Renamed".into(),
            ..store("a", None)
        })
        .await
        .unwrap();

        assert_eq!(repo.get_by_id("a").await.unwrap().name, "Renamed");
        assert!(matches!(repo.get_by_id("zzz").await, Err(DbError::NotFound { .. })));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }
}
