//! # Rendition Rules
//!
//! Pure accounting rules for reconciliation records: box closure, the
//! creation-time payment check, and payment posting arithmetic. The
//! database layer calls into these; nothing here touches storage.
//!
//! ## Creation Check Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Rendition Creation - Validation Pipeline                   │
//! │                                                                         │
//! │  field validation (lengths, non-negative counts and amounts)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. payment <= sale            ── fails: InvalidPayment (hard reject)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. sold <= initial+recharge-returned ── fails: BoxOverrun             │
//! │       │                                                                 │
//! │       ▼                          (pure checks end here; the database   │
//! │  3. client identity binding       layer runs 3-6 inside one           │
//! │  4. delinquency gate              transaction)                         │
//! │  5. stock sufficiency                                                   │
//! │  6. atomic commit                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checks run strictly in this order; when several would fail, the earliest
//! one wins. All of them run before any state is written.

use crate::error::{DomainError, DomainResult};
use crate::money::Money;
use crate::types::{PaymentMethod, Rendition};
use crate::validation;

// =============================================================================
// Creation Input
// =============================================================================

/// The caller-supplied fields of a new rendition.
///
/// Everything except the derived balance and the owning principal, which
/// the server supplies.
#[derive(Debug, Clone)]
pub struct RenditionInput {
    pub product_type: String,
    pub client_id: String,
    pub client_details: String,
    pub initial_boxes: i64,
    pub recharge_boxes: i64,
    pub sold_boxes: i64,
    pub return_boxes: i64,
    pub sale_amount: Money,
    pub payment_amount: Money,
    pub payment_method: PaymentMethod,
}

impl RenditionInput {
    /// Boxes the client can account for:
    /// `initial_boxes + recharge_boxes - return_boxes`.
    ///
    /// May be negative when returns exceed deliveries; the closure check
    /// then rejects any submission, including one with zero sold boxes.
    #[inline]
    pub fn box_capacity(&self) -> i64 {
        self.initial_boxes + self.recharge_boxes - self.return_boxes
    }

    /// Runs field validation and the pure creation checks (1-2), returning
    /// the creation balance.
    ///
    /// ## Rules
    /// - `payment_amount > sale_amount` → [`DomainError::InvalidPayment`].
    ///   Creation never clamps; only the payment-posting path does.
    /// - `sold_boxes > box_capacity()` → [`DomainError::BoxOverrun`].
    ///
    /// The identity, delinquency and stock checks (3-5) need storage and
    /// live in the database layer, which runs them in the same order.
    pub fn validate(&self) -> DomainResult<Money> {
        validation::validate_product_name(&self.product_type)?;
        validation::validate_client_id(&self.client_id)?;
        validation::validate_client_details(&self.client_details)?;
        validation::validate_box_count("initialBoxes", self.initial_boxes)?;
        validation::validate_box_count("rechargeBoxes", self.recharge_boxes)?;
        validation::validate_box_count("soldBoxes", self.sold_boxes)?;
        validation::validate_box_count("returnBoxes", self.return_boxes)?;
        validation::validate_amount("saleAmountCents", self.sale_amount)?;
        validation::validate_amount("paymentAmountCents", self.payment_amount)?;

        // Check 1: payment may not exceed sale at submission time
        let balance = self.sale_amount - self.payment_amount;
        if balance.is_negative() {
            return Err(DomainError::InvalidPayment {
                sale_cents: self.sale_amount.cents(),
                payment_cents: self.payment_amount.cents(),
            });
        }

        // Check 2: box-accounting closure
        let capacity = self.box_capacity();
        if self.sold_boxes > capacity {
            return Err(DomainError::BoxOverrun {
                sold: self.sold_boxes,
                available: capacity,
            });
        }

        Ok(balance)
    }
}

// =============================================================================
// Payment Posting
// =============================================================================

/// The state a payment posting moves a rendition to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// New cumulative payment amount.
    pub payment_amount: Money,
    /// New outstanding balance, clamped at zero.
    pub balance: Money,
}

/// Computes the effect of posting `amount` against a rendition.
///
/// ## Rules
/// - `amount <= 0` → [`DomainError::InvalidAmount`]
/// - `amount > balance` → [`DomainError::OverPayment`]; a settled
///   rendition (balance 0) therefore rejects every further payment
/// - otherwise `payment_amount += amount` and
///   `balance = max(sale_amount - payment_amount, 0)`
///
/// Unlike creation, the balance here is clamped rather than rejected: the
/// over-payment guard makes the clamp unreachable in practice, but the
/// stored balance must never be negative even if the two drift.
pub fn apply_payment(rendition: &Rendition, amount: Money) -> DomainResult<PaymentOutcome> {
    if !amount.is_positive() {
        return Err(DomainError::InvalidAmount {
            amount_cents: amount.cents(),
        });
    }

    let balance = rendition.balance();
    if amount > balance {
        return Err(DomainError::OverPayment {
            amount_cents: amount.cents(),
            balance_cents: balance.cents(),
        });
    }

    let payment_amount = rendition.payment_amount() + amount;
    Ok(PaymentOutcome {
        payment_amount,
        balance: rendition.sale_amount().saturating_sub(payment_amount),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn input() -> RenditionInput {
        RenditionInput {
            product_type: "Sifón 1.5L".to_string(),
            client_id: "C-042".to_string(),
            client_details: "Kiosco La Esquina, Av. Mitre 1200".to_string(),
            initial_boxes: 10,
            recharge_boxes: 5,
            sold_boxes: 12,
            return_boxes: 0,
            sale_amount: Money::from_cents(10_000),
            payment_amount: Money::from_cents(4_000),
            payment_method: PaymentMethod::Cash,
        }
    }

    fn rendition(sale_cents: i64, payment_cents: i64, balance_cents: i64) -> Rendition {
        let now = Utc::now();
        Rendition {
            id: "r-1".to_string(),
            user_id: "u-1".to_string(),
            product_type: "Sifón 1.5L".to_string(),
            client_id: "C-042".to_string(),
            client_details: "Kiosco La Esquina".to_string(),
            initial_boxes: 10,
            recharge_boxes: 5,
            sold_boxes: 12,
            return_boxes: 0,
            sale_amount_cents: sale_cents,
            payment_amount_cents: payment_cents,
            payment_method: PaymentMethod::Cash,
            balance_cents,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_valid_input_returns_balance() {
        let balance = input().validate().unwrap();
        assert_eq!(balance, Money::from_cents(6_000));
    }

    #[test]
    fn test_payment_exceeding_sale_is_rejected_not_clamped() {
        let mut bad = input();
        bad.payment_amount = Money::from_cents(12_000);

        let err = bad.validate().unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidPayment {
                sale_cents: 10_000,
                payment_cents: 12_000,
            }
        ));
    }

    #[test]
    fn test_box_overrun() {
        // 20 sold against 10 + 5 - 0 = 15 available
        let mut bad = input();
        bad.sold_boxes = 20;

        let err = bad.validate().unwrap_err();
        assert!(matches!(
            err,
            DomainError::BoxOverrun {
                sold: 20,
                available: 15,
            }
        ));
    }

    #[test]
    fn test_box_closure_boundary_is_inclusive() {
        let mut exact = input();
        exact.sold_boxes = 15;
        assert!(exact.validate().is_ok());
    }

    #[test]
    fn test_returns_exceeding_deliveries_fail_closure() {
        let mut bad = input();
        bad.return_boxes = 20; // capacity = 10 + 5 - 20 = -5
        bad.sold_boxes = 0;
        assert!(matches!(
            bad.validate().unwrap_err(),
            DomainError::BoxOverrun { sold: 0, available: -5 }
        ));
    }

    #[test]
    fn test_payment_check_runs_before_box_check() {
        // Both violations present; InvalidPayment must win (check order)
        let mut bad = input();
        bad.payment_amount = Money::from_cents(12_000);
        bad.sold_boxes = 20;
        assert!(matches!(
            bad.validate().unwrap_err(),
            DomainError::InvalidPayment { .. }
        ));
    }

    #[test]
    fn test_field_validation_rejects_negative_boxes() {
        let mut bad = input();
        bad.initial_boxes = -1;
        assert!(matches!(
            bad.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn test_apply_payment_partial_then_settle() {
        // sale 100, paid 40 → balance 60
        let r = rendition(10_000, 4_000, 6_000);

        // 70 > 60 → over-payment
        let err = apply_payment(&r, Money::from_cents(7_000)).unwrap_err();
        assert!(matches!(
            err,
            DomainError::OverPayment {
                amount_cents: 7_000,
                balance_cents: 6_000,
            }
        ));

        // exactly 60 settles
        let outcome = apply_payment(&r, Money::from_cents(6_000)).unwrap();
        assert_eq!(outcome.payment_amount, Money::from_cents(10_000));
        assert_eq!(outcome.balance, Money::zero());
    }

    #[test]
    fn test_settled_rendition_rejects_all_payments() {
        let settled = rendition(10_000, 10_000, 0);
        let err = apply_payment(&settled, Money::from_cents(1)).unwrap_err();
        assert!(matches!(
            err,
            DomainError::OverPayment {
                amount_cents: 1,
                balance_cents: 0,
            }
        ));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let r = rendition(10_000, 0, 10_000);
        assert!(matches!(
            apply_payment(&r, Money::zero()).unwrap_err(),
            DomainError::InvalidAmount { amount_cents: 0 }
        ));
        assert!(matches!(
            apply_payment(&r, Money::from_cents(-500)).unwrap_err(),
            DomainError::InvalidAmount { amount_cents: -500 }
        ));
    }

    #[test]
    fn test_balance_clamp_invariant_after_each_posting() {
        let mut r = rendition(10_000, 0, 10_000);
        for amount in [3_000, 3_000, 4_000] {
            let outcome = apply_payment(&r, Money::from_cents(amount)).unwrap();
            assert_eq!(
                outcome.balance,
                r.sale_amount().saturating_sub(outcome.payment_amount)
            );
            assert!(!outcome.balance.is_negative());
            r.payment_amount_cents = outcome.payment_amount.cents();
            r.balance_cents = outcome.balance.cents();
        }
        assert!(r.is_settled());
    }
}
