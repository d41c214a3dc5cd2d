//! # Rendition Repository
//!
//! Database operations for renditions (client reconciliations).
//!
//! ## Creation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Rendition Creation                                    │
//! │                                                                         │
//! │  input.validate()            (pure, no storage touched)                │
//! │   ├── 1. payment ≤ sale      hard reject, never clamped                │
//! │   └── 2. sold ≤ box capacity                                           │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │   ├── 3. client identity     first rendition binds clientDetails       │
//! │   ├── 4. delinquency         any open contrafactura blocks the client  │
//! │   ├── 5. stock               product exists, sold boxes covered        │
//! │   │                                                                     │
//! │   ├── decrement stock        (guarded UPDATE, skipped when sold = 0)   │
//! │   ├── insert rendition                                                 │
//! │   └── append daily sale      (skipped when sold = 0)                   │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  A failure at any point rolls the whole unit back: there is no         │
//! │  state where stock moved but the rendition or sale is missing.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The checks run in this exact order, so an input that is broken in
//! several ways always reports the same error.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use reparto_core::rendition::apply_payment;
use reparto_core::{DomainError, Money, Rendition, RenditionInput};

/// Repository for rendition database operations.
#[derive(Debug, Clone)]
pub struct RenditionRepository {
    pool: SqlitePool,
}

impl RenditionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RenditionRepository { pool }
    }

    /// Creates a rendition, decrementing stock and recording the sale in
    /// the same transaction.
    ///
    /// ## Rules
    /// Checks run in order; the first failure wins:
    /// 1. `payment_amount > sale_amount` → InvalidPayment
    /// 2. `sold_boxes > initial + recharge - return` → BoxOverrun
    /// 3. `client_details` differs from the client's registered details
    ///    → ClientIdentityConflict
    /// 4. the client has any rendition with balance > 0 → ClientDelinquent
    /// 5. `product_type` unknown → ProductNotFound; fewer boxes on hand
    ///    than `sold_boxes` → InsufficientStock
    ///
    /// ## Side Effects
    /// On success, and atomically: stock for `product_type` drops by
    /// `sold_boxes`, and a daily sale record for `sold_boxes` is appended.
    /// A rendition with `sold_boxes = 0` moves no stock and records no
    /// sale, but the product must still exist.
    ///
    /// ## Arguments
    /// * `input` - Caller-supplied rendition fields
    /// * `user_id` - Owning principal
    pub async fn create(&self, input: RenditionInput, user_id: &str) -> DbResult<Rendition> {
        // Checks 1-2 are pure and run before any storage is touched.
        let balance = input.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(
            client_id = %input.client_id,
            product = %input.product_type,
            sold = input.sold_boxes,
            "Creating rendition"
        );

        let mut tx = self.pool.begin().await?;

        // Check 3: the first rendition for a client binds its details;
        // every later one must carry the identical string.
        let registered: Option<String> = sqlx::query_scalar(
            r#"
            SELECT client_details FROM renditions
            WHERE client_id = ?1
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(&input.client_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(registered) = registered {
            if registered != input.client_details {
                return Err(DomainError::ClientIdentityConflict {
                    client_id: input.client_id.clone(),
                }
                .into());
            }
        }

        // Check 4: any open contrafactura blocks the client.
        let outstanding: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(balance_cents), 0) FROM renditions
            WHERE client_id = ?1 AND balance_cents > 0
            "#,
        )
        .bind(&input.client_id)
        .fetch_one(&mut *tx)
        .await?;

        if outstanding > 0 {
            return Err(DomainError::ClientDelinquent {
                client_id: input.client_id.clone(),
                outstanding_cents: outstanding,
            }
            .into());
        }

        // Check 5: product must exist even when no boxes move.
        let available: i64 =
            sqlx::query_scalar("SELECT quantity FROM stock_items WHERE product = ?1")
                .bind(&input.product_type)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DomainError::ProductNotFound(input.product_type.clone()))?;

        if input.sold_boxes > 0 {
            if available < input.sold_boxes {
                return Err(DomainError::InsufficientStock {
                    product: input.product_type.clone(),
                    available,
                    requested: input.sold_boxes,
                }
                .into());
            }

            // Guarded decrement: the SELECT above decided the error, this
            // WHERE clause is the check that actually holds at commit.
            let result = sqlx::query(
                r#"
                UPDATE stock_items
                SET quantity = quantity - ?2, updated_at = ?3
                WHERE product = ?1 AND quantity >= ?2
                "#,
            )
            .bind(&input.product_type)
            .bind(input.sold_boxes)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DomainError::InsufficientStock {
                    product: input.product_type.clone(),
                    available,
                    requested: input.sold_boxes,
                }
                .into());
            }
        }

        sqlx::query(
            r#"
            INSERT INTO renditions (
                id, user_id, product_type, client_id, client_details,
                initial_boxes, recharge_boxes, sold_boxes, return_boxes,
                sale_amount_cents, payment_amount_cents, payment_method,
                balance_cents, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14, ?15
            )
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&input.product_type)
        .bind(&input.client_id)
        .bind(&input.client_details)
        .bind(input.initial_boxes)
        .bind(input.recharge_boxes)
        .bind(input.sold_boxes)
        .bind(input.return_boxes)
        .bind(input.sale_amount.cents())
        .bind(input.payment_amount.cents())
        .bind(input.payment_method)
        .bind(balance.cents())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if input.sold_boxes > 0 {
            sqlx::query(
                r#"
                INSERT INTO daily_sales (id, product, quantity, user_id, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&input.product_type)
            .bind(input.sold_boxes)
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %id,
            client_id = %input.client_id,
            balance_cents = balance.cents(),
            "Rendition created"
        );

        Ok(Rendition {
            id,
            user_id: user_id.to_string(),
            product_type: input.product_type,
            client_id: input.client_id,
            client_details: input.client_details,
            initial_boxes: input.initial_boxes,
            recharge_boxes: input.recharge_boxes,
            sold_boxes: input.sold_boxes,
            return_boxes: input.return_boxes,
            sale_amount_cents: input.sale_amount.cents(),
            payment_amount_cents: input.payment_amount.cents(),
            payment_method: input.payment_method,
            balance_cents: balance.cents(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Posts a payment against a rendition.
    ///
    /// ## Rules
    /// - unknown id → RenditionNotFound
    /// - `amount <= 0` → InvalidAmount
    /// - `amount > balance` → OverPayment (settled renditions always
    ///   reject, their balance is 0)
    /// - otherwise the payment accumulates and the balance drops, clamped
    ///   at zero
    ///
    /// ## Returns
    /// The rendition after the posting.
    pub async fn post_payment(&self, id: &str, amount: Money) -> DbResult<Rendition> {
        let rendition = self
            .get(id)
            .await?
            .ok_or_else(|| DomainError::RenditionNotFound(id.to_string()))?;

        let outcome = apply_payment(&rendition, amount)?;

        let now = Utc::now();

        // Optimistic guard: when a concurrent posting lands between the
        // read and this write, touch nothing and report the conflict.
        let result = sqlx::query(
            r#"
            UPDATE renditions
            SET payment_amount_cents = ?2, balance_cents = ?3, updated_at = ?4
            WHERE id = ?1 AND payment_amount_cents = ?5
            "#,
        )
        .bind(id)
        .bind(outcome.payment_amount.cents())
        .bind(outcome.balance.cents())
        .bind(now)
        .bind(rendition.payment_amount_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::TransactionFailed(format!(
                "rendition {id} changed concurrently, retry the payment"
            )));
        }

        info!(
            id = %id,
            paid_cents = amount.cents(),
            balance_cents = outcome.balance.cents(),
            "Payment posted"
        );

        Ok(Rendition {
            payment_amount_cents: outcome.payment_amount.cents(),
            balance_cents: outcome.balance.cents(),
            updated_at: now,
            ..rendition
        })
    }

    /// Gets a rendition by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Rendition>> {
        let rendition = sqlx::query_as::<_, Rendition>(
            r#"
            SELECT
                id, user_id, product_type, client_id, client_details,
                initial_boxes, recharge_boxes, sold_boxes, return_boxes,
                sale_amount_cents, payment_amount_cents, payment_method,
                balance_cents, created_at, updated_at
            FROM renditions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(rendition)
    }

    /// Lists the renditions owned by a principal, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Rendition>> {
        let renditions = sqlx::query_as::<_, Rendition>(
            r#"
            SELECT
                id, user_id, product_type, client_id, client_details,
                initial_boxes, recharge_boxes, sold_boxes, return_boxes,
                sale_amount_cents, payment_amount_cents, payment_method,
                balance_cents, created_at, updated_at
            FROM renditions
            WHERE user_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(renditions)
    }

    /// Lists a client's full rendition history, newest first.
    pub async fn list_for_client(&self, client_id: &str) -> DbResult<Vec<Rendition>> {
        let renditions = sqlx::query_as::<_, Rendition>(
            r#"
            SELECT
                id, user_id, product_type, client_id, client_details,
                initial_boxes, recharge_boxes, sold_boxes, return_boxes,
                sale_amount_cents, payment_amount_cents, payment_method,
                balance_cents, created_at, updated_at
            FROM renditions
            WHERE client_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(renditions)
    }

    /// Lists renditions that still carry a contrafactura (balance > 0),
    /// optionally scoped to one client.
    pub async fn list_pending(&self, client_id: Option<&str>) -> DbResult<Vec<Rendition>> {
        let renditions = sqlx::query_as::<_, Rendition>(
            r#"
            SELECT
                id, user_id, product_type, client_id, client_details,
                initial_boxes, recharge_boxes, sold_boxes, return_boxes,
                sale_amount_cents, payment_amount_cents, payment_method,
                balance_cents, created_at, updated_at
            FROM renditions
            WHERE balance_cents > 0
              AND (?1 IS NULL OR client_id = ?1)
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(renditions)
    }

    /// Returns the details bound to a client by its first rendition.
    ///
    /// ## Returns
    /// * `Ok(Some(details))` - Client has at least one rendition
    /// * `Ok(None)` - Client has never been seen
    pub async fn client_details(&self, client_id: &str) -> DbResult<Option<String>> {
        let details: Option<String> = sqlx::query_scalar(
            r#"
            SELECT client_details FROM renditions
            WHERE client_id = ?1
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(details)
    }

    /// Sums a client's open contrafacturas, in cents.
    pub async fn outstanding_for_client(&self, client_id: &str) -> DbResult<i64> {
        let outstanding: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(balance_cents), 0) FROM renditions
            WHERE client_id = ?1 AND balance_cents > 0
            "#,
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(outstanding)
    }

    /// Deletes every rendition owned by a principal.
    ///
    /// Irreversible, and intentionally does NOT restore stock: boxes that
    /// left the warehouse stay gone. Sale records survive too, since the
    /// sales happened regardless of the bookkeeping being wiped.
    ///
    /// ## Returns
    /// The number of renditions deleted.
    pub async fn reset_for_user(&self, user_id: &str) -> DbResult<u64> {
        let deleted = sqlx::query("DELETE FROM renditions WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        info!(user_id = %user_id, deleted = deleted, "Renditions reset");
        Ok(deleted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use reparto_core::{PaymentMethod, StockAction};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Stocks 50 boxes of Sifón 1.5L under user u-1.
    async fn stocked_db() -> Database {
        let db = test_db().await;
        db.stocks()
            .apply("Sifón 1.5L", StockAction::Add, 50, "u-1")
            .await
            .unwrap();
        db
    }

    fn input(client_id: &str, sale_cents: i64, payment_cents: i64) -> RenditionInput {
        RenditionInput {
            product_type: "Sifón 1.5L".to_string(),
            client_id: client_id.to_string(),
            client_details: format!("Kiosco {client_id}"),
            initial_boxes: 10,
            recharge_boxes: 5,
            sold_boxes: 8,
            return_boxes: 2,
            sale_amount: Money::from_cents(sale_cents),
            payment_amount: Money::from_cents(payment_cents),
            payment_method: PaymentMethod::Cash,
        }
    }

    #[tokio::test]
    async fn test_create_commits_all_three_effects() {
        let db = stocked_db().await;

        let rendition = db
            .renditions()
            .create(input("C-01", 10_000, 4_000), "u-1")
            .await
            .unwrap();

        assert_eq!(rendition.balance_cents, 6_000);
        assert_eq!(rendition.user_id, "u-1");

        // Stock dropped by the sold boxes
        let stock = db.stocks().get("Sifón 1.5L").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 42);

        // A sale record for the sold boxes was appended
        let sales = db.sales().list_daily().await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].quantity, 8);
        assert_eq!(sales[0].user_id, "u-1");
    }

    #[tokio::test]
    async fn test_create_is_atomic_when_a_write_fails() {
        let db = stocked_db().await;

        // Sabotage the last write of the commit unit
        sqlx::query("DROP TABLE daily_sales")
            .execute(db.pool())
            .await
            .unwrap();

        let result = db
            .renditions()
            .create(input("C-01", 10_000, 4_000), "u-1")
            .await;
        assert!(result.is_err());

        // Nothing landed: stock untouched, no rendition row
        let stock = db.stocks().get("Sifón 1.5L").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 50);
        assert!(db.renditions().list_for_user("u-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_payment_wins_over_box_overrun() {
        let db = stocked_db().await;

        // Both broken: payment > sale AND sold > capacity. First check wins.
        let mut bad = input("C-01", 10_000, 12_000);
        bad.sold_boxes = 20;

        let err = db.renditions().create(bad, "u-1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::InvalidPayment { .. })
        ));
    }

    #[tokio::test]
    async fn test_box_overrun_rejected() {
        let db = stocked_db().await;

        let mut bad = input("C-01", 10_000, 4_000);
        bad.sold_boxes = 20; // capacity is 10 + 5 - 2 = 13

        let err = db.renditions().create(bad, "u-1").await.unwrap_err();
        match err {
            DbError::Domain(DomainError::BoxOverrun { sold, available }) => {
                assert_eq!(sold, 20);
                assert_eq!(available, 13);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_identity_binds_on_first_write() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        // Settled first rendition, so delinquency never interferes
        renditions
            .create(input("C-01", 10_000, 10_000), "u-1")
            .await
            .unwrap();

        // Same details: accepted
        renditions
            .create(input("C-01", 5_000, 5_000), "u-1")
            .await
            .unwrap();

        // Different details: rejected
        let mut conflicting = input("C-01", 5_000, 5_000);
        conflicting.client_details = "Otro Nombre".to_string();

        let err = renditions.create(conflicting, "u-1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::ClientIdentityConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_delinquent_client_blocked() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        // Leaves a 6000-cent contrafactura open
        renditions
            .create(input("C-01", 10_000, 4_000), "u-1")
            .await
            .unwrap();

        let err = renditions
            .create(input("C-01", 5_000, 5_000), "u-1")
            .await
            .unwrap_err();
        match err {
            DbError::Domain(DomainError::ClientDelinquent {
                outstanding_cents, ..
            }) => assert_eq!(outstanding_cents, 6_000),
            other => panic!("unexpected error: {other:?}"),
        }

        // A different client is unaffected
        renditions
            .create(input("C-02", 5_000, 5_000), "u-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delinquency_clears_after_settlement() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        let first = renditions
            .create(input("C-01", 10_000, 4_000), "u-1")
            .await
            .unwrap();

        renditions
            .post_payment(&first.id, Money::from_cents(6_000))
            .await
            .unwrap();

        // Paid down to zero: the client may submit again
        renditions
            .create(input("C-01", 5_000, 0), "u-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = test_db().await; // nothing stocked

        let err = db
            .renditions()
            .create(input("C-01", 10_000, 4_000), "u-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejected_without_side_effects() {
        let db = test_db().await;
        db.stocks()
            .apply("Sifón 1.5L", StockAction::Add, 5, "u-1")
            .await
            .unwrap();

        let err = db
            .renditions()
            .create(input("C-01", 10_000, 4_000), "u-1") // sold_boxes = 8
            .await
            .unwrap_err();
        match err {
            DbError::Domain(DomainError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 5);
                assert_eq!(requested, 8);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let stock = db.stocks().get("Sifón 1.5L").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 5);
        assert!(db.sales().list_daily().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_sold_moves_no_stock_and_records_no_sale() {
        let db = stocked_db().await;

        let mut zero = input("C-01", 0, 0);
        zero.sold_boxes = 0;

        let rendition = db.renditions().create(zero, "u-1").await.unwrap();
        assert_eq!(rendition.balance_cents, 0);

        let stock = db.stocks().get("Sifón 1.5L").await.unwrap().unwrap();
        assert_eq!(stock.quantity, 50);
        assert!(db.sales().list_daily().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_sold_still_requires_known_product() {
        let db = test_db().await;

        let mut zero = input("C-01", 0, 0);
        zero.sold_boxes = 0;

        let err = db.renditions().create(zero, "u-1").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_payment_lifecycle() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        let rendition = renditions
            .create(input("C-01", 10_000, 4_000), "u-1")
            .await
            .unwrap();
        assert_eq!(rendition.balance_cents, 6_000);

        // Over the balance: rejected, nothing recorded
        let err = renditions
            .post_payment(&rendition.id, Money::from_cents(7_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::OverPayment { .. })
        ));

        // Partial payment
        let updated = renditions
            .post_payment(&rendition.id, Money::from_cents(2_500))
            .await
            .unwrap();
        assert_eq!(updated.payment_amount_cents, 6_500);
        assert_eq!(updated.balance_cents, 3_500);

        // Settle exactly
        let settled = renditions
            .post_payment(&rendition.id, Money::from_cents(3_500))
            .await
            .unwrap();
        assert_eq!(settled.balance_cents, 0);
        assert!(settled.is_settled());

        // Settled is terminal: even one cent is an over-payment now
        let err = renditions
            .post_payment(&rendition.id, Money::from_cents(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::OverPayment {
                balance_cents: 0,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_payment_on_unknown_rendition() {
        let db = test_db().await;

        let err = db
            .renditions()
            .post_payment("no-such-id", Money::from_cents(100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::RenditionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_non_positive_payment_rejected() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        let rendition = renditions
            .create(input("C-01", 10_000, 4_000), "u-1")
            .await
            .unwrap();

        let err = renditions
            .post_payment(&rendition.id, Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(DomainError::InvalidAmount { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_pending_filters() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        renditions.create(input("C-01", 10_000, 4_000), "u-1").await.unwrap();
        renditions.create(input("C-02", 5_000, 5_000), "u-1").await.unwrap();
        renditions.create(input("C-03", 8_000, 1_000), "u-2").await.unwrap();

        // Only open contrafacturas show up
        let pending = renditions.list_pending(None).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|r| r.balance_cents > 0));

        // Scoped to one client
        let pending = renditions.list_pending(Some("C-03")).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].client_id, "C-03");

        // A settled client has nothing pending
        let pending = renditions.list_pending(Some("C-02")).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_client_identity_lookup() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        renditions.create(input("C-01", 10_000, 10_000), "u-1").await.unwrap();

        let details = renditions.client_details("C-01").await.unwrap();
        assert_eq!(details.as_deref(), Some("Kiosco C-01"));
        assert!(renditions.client_details("C-99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_for_client_spans_owners_and_settled() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        // Settled rendition by one principal, open one by another
        renditions.create(input("C-01", 10_000, 10_000), "u-1").await.unwrap();
        renditions.create(input("C-01", 5_000, 1_000), "u-2").await.unwrap();
        renditions.create(input("C-02", 5_000, 5_000), "u-1").await.unwrap();

        let history = renditions.list_for_client("C-01").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.client_id == "C-01"));

        assert!(renditions.list_for_client("C-99").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_scoped_to_principal_and_keeps_stock() {
        let db = stocked_db().await;
        let renditions = db.renditions();

        renditions.create(input("C-01", 10_000, 4_000), "u-1").await.unwrap();
        renditions.create(input("C-02", 5_000, 5_000), "u-2").await.unwrap();
        let stock_before = db.stocks().get("Sifón 1.5L").await.unwrap().unwrap();

        let deleted = renditions.reset_for_user("u-1").await.unwrap();
        assert_eq!(deleted, 1);

        // Other principals' renditions survive
        assert!(renditions.list_for_user("u-1").await.unwrap().is_empty());
        assert_eq!(renditions.list_for_user("u-2").await.unwrap().len(), 1);

        // No cascading un-decrement: stock and sales stay as they were
        let stock_after = db.stocks().get("Sifón 1.5L").await.unwrap().unwrap();
        assert_eq!(stock_after.quantity, stock_before.quantity);
        assert_eq!(db.sales().list_daily().await.unwrap().len(), 2);
    }
}
