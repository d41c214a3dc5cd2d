//! # Stock Repository
//!
//! Database operations for the per-product stock ledger.
//!
//! ## Mutation Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Ledger Mutations                               │
//! │                                                                         │
//! │  apply("Sifón 1.5L", action, 3, user)                                  │
//! │       │                                                                 │
//! │       ├── add / return ──► UPSERT                                      │
//! │       │     product absent?  create row at the given amount            │
//! │       │     product present? quantity += amount                        │
//! │       │                                                                 │
//! │       └── request / sale ──► guarded decrement                         │
//! │             UPDATE ... SET quantity = quantity - ?                     │
//! │             WHERE product = ? AND quantity >= ?                        │
//! │                  │                                                      │
//! │                  ├── 0 rows touched → insufficient stock, no write     │
//! │                  │   (absent products land here too)                   │
//! │                  │                                                      │
//! │                  └── 1 row touched → committed                         │
//! │                      sale additionally appends a daily sale record,    │
//! │                      in the same transaction                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guard condition makes the check and the write one statement, so two
//! racing decrements can never both succeed on the last box: SQLite's
//! single-writer lock orders them and the loser's guard finds the stock
//! already gone.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use reparto_core::{validation, DomainError, StockAction, StockItem};

/// Repository for stock ledger operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = StockRepository::new(pool);
///
/// // Receive merchandise
/// let item = repo.apply("Sifón 1.5L", StockAction::Add, 40, "user-1").await?;
///
/// // Consummated sale: decrements and records
/// let item = repo.apply("Sifón 1.5L", StockAction::Sale, 3, "user-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Applies a mutation to the stock ledger.
    ///
    /// ## Rules
    /// - `add` / `return`: increments; creates the product at `quantity`
    ///   when it has never been seen before
    /// - `request` / `sale`: decrements; rejected with insufficient stock
    ///   when the product is absent or holds fewer units than requested
    /// - `sale` additionally appends a record to the daily sale bucket,
    ///   attributed to `user_id`, atomically with the decrement
    ///
    /// ## Arguments
    /// * `product` - Product name, the ledger key
    /// * `action` - What kind of mutation this is
    /// * `quantity` - Units, strictly positive
    /// * `user_id` - Acting principal; recorded only for `sale`
    ///
    /// ## Returns
    /// The stock item after the mutation.
    pub async fn apply(
        &self,
        product: &str,
        action: StockAction,
        quantity: i64,
        user_id: &str,
    ) -> DbResult<StockItem> {
        validation::validate_product_name(product).map_err(DomainError::from)?;
        validation::validate_quantity(quantity).map_err(DomainError::from)?;

        debug!(product = %product, action = %action, quantity = %quantity, "Applying stock mutation");

        if action.is_decrement() {
            self.decrement(product, action, quantity, user_id).await
        } else {
            self.increment(product, quantity).await
        }
    }

    /// Increment path: `add` and `return`.
    ///
    /// A single UPSERT creates the row at `quantity` or adds to it, so the
    /// absent/present branch never races.
    async fn increment(&self, product: &str, quantity: i64) -> DbResult<StockItem> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO stock_items (product, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (product) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(product)
        .bind(quantity)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_required(product).await
    }

    /// Decrement path: `request` and `sale`.
    ///
    /// The decrement and the optional sale record are one transaction, so
    /// a mid-flight failure leaves neither in place.
    async fn decrement(
        &self,
        product: &str,
        action: StockAction,
        quantity: i64,
        user_id: &str,
    ) -> DbResult<StockItem> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // Guarded decrement: the WHERE clause IS the stock check.
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
            // Absent products and short stock both land here; report
            // whatever is actually on hand (0 when absent).
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

        if action.records_sale() {
            sqlx::query(
                r#"
                INSERT INTO daily_sales (id, product, quantity, user_id, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(product)
            .bind(quantity)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let item = sqlx::query_as::<_, StockItem>(
            r#"
            SELECT product, quantity, created_at, updated_at
            FROM stock_items
            WHERE product = ?1
            "#,
        )
        .bind(product)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(product = %product, quantity = item.quantity, "Stock mutation committed");
        Ok(item)
    }

    /// Gets a stock item by product name.
    ///
    /// ## Returns
    /// * `Ok(Some(StockItem))` - Product is in the ledger
    /// * `Ok(None)` - Product has never been stocked
    pub async fn get(&self, product: &str) -> DbResult<Option<StockItem>> {
        let item = sqlx::query_as::<_, StockItem>(
            r#"
            SELECT product, quantity, created_at, updated_at
            FROM stock_items
            WHERE product = ?1
            "#,
        )
        .bind(product)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets a stock item, failing when the product is unknown.
    async fn get_required(&self, product: &str) -> DbResult<StockItem> {
        self.get(product)
            .await?
            .ok_or_else(|| DbError::not_found("Stock item", product))
    }

    /// Lists the whole ledger, ordered by product name.
    pub async fn list(&self) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(
            r#"
            SELECT product, quantity, created_at, updated_at
            FROM stock_items
            ORDER BY product
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts ledger entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items")
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
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_creates_missing_product() {
        let db = test_db().await;

        let item = db
            .stocks()
            .apply("Sifón 1.5L", StockAction::Add, 40, "u-1")
            .await
            .unwrap();

        assert_eq!(item.product, "Sifón 1.5L");
        assert_eq!(item.quantity, 40);
    }

    #[tokio::test]
    async fn test_add_accumulates() {
        let db = test_db().await;
        let stocks = db.stocks();

        stocks.apply("Bidón 6L", StockAction::Add, 10, "u-1").await.unwrap();
        let item = stocks.apply("Bidón 6L", StockAction::Add, 5, "u-1").await.unwrap();

        assert_eq!(item.quantity, 15);
    }

    #[tokio::test]
    async fn test_return_increments_like_add() {
        let db = test_db().await;
        let stocks = db.stocks();

        // Returns against an unseen product create it, same as add
        let item = stocks
            .apply("Soda 2L", StockAction::Return, 7, "u-1")
            .await
            .unwrap();
        assert_eq!(item.quantity, 7);

        let item = stocks
            .apply("Soda 2L", StockAction::Return, 3, "u-1")
            .await
            .unwrap();
        assert_eq!(item.quantity, 10);
    }

    #[tokio::test]
    async fn test_sale_decrements_and_records() {
        let db = test_db().await;
        let stocks = db.stocks();

        stocks.apply("Sifón 1.5L", StockAction::Add, 10, "u-1").await.unwrap();
        let item = stocks
            .apply("Sifón 1.5L", StockAction::Sale, 3, "u-1")
            .await
            .unwrap();

        assert_eq!(item.quantity, 7);

        let sales = db.sales().list_daily().await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].product, "Sifón 1.5L");
        assert_eq!(sales[0].quantity, 3);
        assert_eq!(sales[0].user_id, "u-1");
    }

    #[tokio::test]
    async fn test_request_decrements_without_sale_record() {
        let db = test_db().await;
        let stocks = db.stocks();

        stocks.apply("Sifón 1.5L", StockAction::Add, 10, "u-1").await.unwrap();
        let item = stocks
            .apply("Sifón 1.5L", StockAction::Request, 4, "u-1")
            .await
            .unwrap();

        assert_eq!(item.quantity, 6);
        assert!(db.sales().list_daily().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decrement_unknown_product_rejected() {
        let db = test_db().await;

        let err = db
            .stocks()
            .apply("Nunca Visto", StockAction::Sale, 1, "u-1")
            .await
            .unwrap_err();

        match err {
            DbError::Domain(DomainError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 0);
                assert_eq!(requested, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decrement_beyond_stock_rejected() {
        let db = test_db().await;
        let stocks = db.stocks();

        stocks.apply("Sifón 1.5L", StockAction::Add, 5, "u-1").await.unwrap();
        let err = stocks
            .apply("Sifón 1.5L", StockAction::Sale, 10, "u-1")
            .await
            .unwrap_err();

        match err {
            DbError::Domain(DomainError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 5);
                assert_eq!(requested, 10);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The failed sale must leave no trace: no decrement, no record
        let item = stocks.get("Sifón 1.5L").await.unwrap().unwrap();
        assert_eq!(item.quantity, 5);
        assert!(db.sales().list_daily().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exact_drain_reaches_zero() {
        let db = test_db().await;
        let stocks = db.stocks();

        stocks.apply("Sifón 1.5L", StockAction::Add, 5, "u-1").await.unwrap();
        let item = stocks
            .apply("Sifón 1.5L", StockAction::Request, 5, "u-1")
            .await
            .unwrap();

        assert_eq!(item.quantity, 0);

        // Drained, not deleted: further decrements still say insufficient
        let err = stocks
            .apply("Sifón 1.5L", StockAction::Request, 1, "u-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::InsufficientStock { available: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let db = test_db().await;

        let err = db
            .stocks()
            .apply("Sifón 1.5L", StockAction::Add, 0, "u-1")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_ordered_by_product() {
        let db = test_db().await;
        let stocks = db.stocks();

        stocks.apply("Soda 2L", StockAction::Add, 1, "u-1").await.unwrap();
        stocks.apply("Bidón 6L", StockAction::Add, 2, "u-1").await.unwrap();

        let items = stocks.list().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product, "Bidón 6L");
        assert_eq!(items[1].product, "Soda 2L");
    }
}
