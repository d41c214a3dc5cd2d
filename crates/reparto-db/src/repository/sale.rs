//! # Sale Buckets
//!
//! Database operations for the daily and weekly sale records.
//!
//! ```text
//!   APPEND      record() here, or the stock/rendition repositories;
//!               a consummated sale inserts into daily_sales
//!   ACCUMULATE  daily_sales grows through the day, records never mutate
//!   ROLL OVER   archive_to_weekly(): copy all + clear, one transaction
//!                 daily_sales:  [s1, s2, s3]  ─►  []
//!                 weekly_sales: [...]         ─►  [..., s1, s2, s3]
//! ```
//!
//! A failed roll-over leaves both buckets untouched; an empty daily
//! bucket rolls over as a successful no-op.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use reparto_core::{validation, DomainError, Sale, WeeklySale};

/// Repository for sale bucket operations.
///
/// Direct sales append through [`SaleRepository::record`]; `sale` stock
/// actions and rendition creation append inside their own commit units
/// in [`super::stock::StockRepository`] and
/// [`super::rendition::RenditionRepository`]. This repository also reads
/// the buckets and runs the roll-over.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists the daily bucket, oldest first.
    pub async fn list_daily(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, product, quantity, user_id, created_at
            FROM daily_sales
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists the weekly archive, oldest first.
    pub async fn list_weekly(&self) -> DbResult<Vec<WeeklySale>> {
        let sales = sqlx::query_as::<_, WeeklySale>(
            r#"
            SELECT id, product, quantity, user_id, created_at, archived_at
            FROM weekly_sales
            ORDER BY archived_at, created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Records a direct sale: decrements stock and appends to the daily
    /// bucket, both in one transaction.
    ///
    /// The guarded `WHERE quantity >= ?` decrement is the same discipline
    /// as the `sale` action on the stock ledger; a product that is absent
    /// or short on stock rejects the whole sale and nothing is written.
    ///
    /// ## Returns
    /// The appended [`Sale`] record.
    pub async fn record(&self, product: &str, quantity: i64, user_id: &str) -> DbResult<Sale> {
        validation::validate_product_name(product).map_err(DomainError::from)?;
        validation::validate_quantity(quantity).map_err(DomainError::from)?;

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            product: product.to_string(),
            quantity,
            user_id: user_id.to_string(),
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity = quantity - ?2, updated_at = ?3
            WHERE product = ?1 AND quantity >= ?2
            "#,
        )
        .bind(product)
        .bind(quantity)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT quantity FROM stock_items WHERE product = ?1")
                    .bind(product)
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(DomainError::InsufficientStock {
                product: product.to_string(),
                available: available.unwrap_or(0),
                requested: quantity,
            }
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO daily_sales (id, product, quantity, user_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.product)
        .bind(sale.quantity)
        .bind(&sale.user_id)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(product, quantity, user_id, "Direct sale recorded");
        Ok(sale)
    }

    /// Rolls the daily bucket over into the weekly archive.
    ///
    /// ## What This Does
    /// 1. Copies every daily record into `weekly_sales`, stamping all of
    ///    them with the same `archived_at`
    /// 2. Clears `daily_sales`
    ///
    /// Both steps run in one transaction: a mid-flight failure leaves the
    /// daily bucket intact and the archive unchanged. Records keep their
    /// id, attribution and original timestamp.
    ///
    /// ## Returns
    /// The number of records archived. An empty daily bucket returns
    /// `Ok(0)` without touching anything.
    pub async fn archive_to_weekly(&self) -> DbResult<u64> {
        let now = Utc::now();

        debug!("Rolling daily sales into the weekly archive");

        let mut tx = self.pool.begin().await?;

        let copied = sqlx::query(
            r#"
            INSERT INTO weekly_sales (id, product, quantity, user_id, created_at, archived_at)
            SELECT id, product, quantity, user_id, created_at, ?1
            FROM daily_sales
            "#,
        )
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM daily_sales")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(archived = copied, "Daily sales rolled over");
        Ok(copied)
    }

    /// Counts records in the daily bucket (for diagnostics).
    pub async fn count_daily(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM daily_sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts records in the weekly archive (for diagnostics).
    pub async fn count_weekly(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weekly_sales")
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
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use reparto_core::StockAction;
    use std::collections::HashSet;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_archive_moves_all_records() {
        let db = test_db().await;
        let stocks = db.stocks();
        let sales = db.sales();

        stocks.apply("Sifón 1.5L", StockAction::Add, 20, "u-1").await.unwrap();
        stocks.apply("Sifón 1.5L", StockAction::Sale, 3, "u-1").await.unwrap();
        stocks.apply("Sifón 1.5L", StockAction::Sale, 2, "u-2").await.unwrap();

        let daily = sales.list_daily().await.unwrap();
        assert_eq!(daily.len(), 2);
        let daily_ids: HashSet<String> = daily.iter().map(|s| s.id.clone()).collect();

        let archived = sales.archive_to_weekly().await.unwrap();
        assert_eq!(archived, 2);

        // Daily bucket is empty, archive holds everything verbatim
        assert!(sales.list_daily().await.unwrap().is_empty());
        let weekly = sales.list_weekly().await.unwrap();
        assert_eq!(weekly.len(), 2);

        let weekly_ids: HashSet<String> = weekly.iter().map(|s| s.id.clone()).collect();
        assert_eq!(daily_ids, weekly_ids);

        let by_user: Vec<&str> = weekly.iter().map(|s| s.user_id.as_str()).collect();
        assert!(by_user.contains(&"u-1"));
        assert!(by_user.contains(&"u-2"));
    }

    #[tokio::test]
    async fn test_archive_empty_bucket_is_noop() {
        let db = test_db().await;

        let archived = db.sales().archive_to_weekly().await.unwrap();
        assert_eq!(archived, 0);
        assert!(db.sales().list_weekly().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_archive_twice_archives_once() {
        let db = test_db().await;
        let stocks = db.stocks();
        let sales = db.sales();

        stocks.apply("Bidón 6L", StockAction::Add, 5, "u-1").await.unwrap();
        stocks.apply("Bidón 6L", StockAction::Sale, 1, "u-1").await.unwrap();

        assert_eq!(sales.archive_to_weekly().await.unwrap(), 1);
        assert_eq!(sales.archive_to_weekly().await.unwrap(), 0);
        assert_eq!(sales.count_weekly().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_archive_accumulates_across_rollovers() {
        let db = test_db().await;
        let stocks = db.stocks();
        let sales = db.sales();

        stocks.apply("Soda 2L", StockAction::Add, 10, "u-1").await.unwrap();

        stocks.apply("Soda 2L", StockAction::Sale, 1, "u-1").await.unwrap();
        sales.archive_to_weekly().await.unwrap();

        stocks.apply("Soda 2L", StockAction::Sale, 2, "u-1").await.unwrap();
        sales.archive_to_weekly().await.unwrap();

        // Two roll-overs append, they never replace
        assert_eq!(sales.count_weekly().await.unwrap(), 2);
        assert_eq!(sales.count_daily().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_decrements_stock_and_appends() {
        let db = test_db().await;
        db.stocks()
            .apply("Sifón 1.5L", StockAction::Add, 10, "u-1")
            .await
            .unwrap();

        let sale = db.sales().record("Sifón 1.5L", 4, "u-2").await.unwrap();
        assert_eq!(sale.product, "Sifón 1.5L");
        assert_eq!(sale.quantity, 4);
        assert_eq!(sale.user_id, "u-2");

        let item = db.stocks().get("Sifón 1.5L").await.unwrap().unwrap();
        assert_eq!(item.quantity, 6);

        let daily = db.sales().list_daily().await.unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].id, sale.id);
    }

    #[tokio::test]
    async fn test_record_insufficient_stock_writes_nothing() {
        let db = test_db().await;
        db.stocks()
            .apply("Bidón 6L", StockAction::Add, 3, "u-1")
            .await
            .unwrap();

        let err = db.sales().record("Bidón 6L", 5, "u-1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::InsufficientStock {
                available: 3,
                requested: 5,
                ..
            })
        ));

        // Rejected sale leaves both the ledger and the bucket untouched
        let item = db.stocks().get("Bidón 6L").await.unwrap().unwrap();
        assert_eq!(item.quantity, 3);
        assert_eq!(db.sales().count_daily().await.unwrap(), 0);
    }
}
