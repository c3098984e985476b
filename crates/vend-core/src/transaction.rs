//! # Transaction
//!
//! One customer's purchase session: coins in, products selected, then
//! exactly one of `complete()` or `cancel()`.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                  insert_money / add_product / remove_product            │
//! │                              ┌──────────┐                               │
//! │                              ▼          │                               │
//! │                      ┌───────────────┐  │                               │
//! │   Transaction::new ─►│  IN_PROGRESS  │──┘                               │
//! │                      └───────┬───────┘                                  │
//! │                  complete()  │  cancel()                                │
//! │                ┌─────────────┴─────────────┐                            │
//! │                ▼                           ▼                            │
//! │        ┌───────────────┐           ┌───────────────┐                    │
//! │        │   COMPLETED   │           │   CANCELLED   │                    │
//! │        └───────────────┘           └───────────────┘                    │
//! │                                                                         │
//! │  Any operation on a terminal transaction fails with TransactionClosed. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transaction never touches inventory or the coin pool. `complete()`
//! reports the amounts; the caller asks the machine to settle them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::amount::Amount;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, ProductId, SelectedProduct, TransactionStatus};

// =============================================================================
// Funds Policy
// =============================================================================

/// How `add_product` decides whether the customer can afford a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundsPolicy {
    /// Price must fit in the inserted total minus prices already selected.
    #[default]
    Net,
    /// Price must fit in the inserted total, ignoring earlier selections.
    /// Overspending is then caught by `complete()`.
    Gross,
}

impl fmt::Display for FundsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundsPolicy::Net => write!(f, "net"),
            FundsPolicy::Gross => write!(f, "gross"),
        }
    }
}

impl FromStr for FundsPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "net" => Ok(FundsPolicy::Net),
            "gross" => Ok(FundsPolicy::Gross),
            other => Err(ValidationError::InvalidFormat {
                field: "funds_policy".to_string(),
                reason: format!("unknown policy '{other}', expected net or gross"),
            }),
        }
    }
}

// =============================================================================
// Transaction Result
// =============================================================================

/// Outcome of `complete()` or `cancel()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub transaction_id: String,
    pub status: TransactionStatus,
    /// Products to hand out. Empty on cancel.
    pub selected_products: Vec<SelectedProduct>,
    /// Every coin inserted, in insertion order. On cancel this is the refund.
    pub inserted_money: Vec<Money>,
    /// Sum of `price_at_selection` over `selected_products`.
    pub total_price: Amount,
    /// Products whose stock must be persisted after dispensing.
    pub update_products: BTreeSet<ProductId>,
}

impl TransactionResult {
    pub fn inserted_total(&self) -> Amount {
        Money::total(&self.inserted_money)
    }

    /// Amount the machine owes back after a completed sale.
    pub fn change_due(&self) -> Amount {
        self.inserted_total() - self.total_price
    }

    pub fn is_refund(&self) -> bool {
        self.status == TransactionStatus::Cancelled
    }

    /// Value handed back to the customer: every inserted coin on cancel,
    /// the change due on completion.
    pub fn refund_total(&self) -> Amount {
        if self.is_refund() {
            self.inserted_total()
        } else {
            self.change_due()
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A single-customer purchase session.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: String,
    inserted_money: Vec<Money>,
    selected_products: Vec<SelectedProduct>,
    touched: BTreeSet<ProductId>,
    status: TransactionStatus,
    funds_policy: FundsPolicy,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Opens a transaction with the default (net) funds policy.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_policy(id, FundsPolicy::default())
    }

    pub fn with_policy(id: impl Into<String>, funds_policy: FundsPolicy) -> Self {
        Transaction {
            id: id.into(),
            inserted_money: Vec::new(),
            selected_products: Vec::new(),
            touched: BTreeSet::new(),
            status: TransactionStatus::InProgress,
            funds_policy,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn funds_policy(&self) -> FundsPolicy {
        self.funds_policy
    }

    pub fn selected_products(&self) -> &[SelectedProduct] {
        &self.selected_products
    }

    pub fn inserted_money(&self) -> &[Money] {
        &self.inserted_money
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn total_inserted(&self) -> Amount {
        Money::total(&self.inserted_money)
    }

    pub fn total_selected_price(&self) -> Amount {
        self.selected_products
            .iter()
            .map(SelectedProduct::price_at_selection)
            .sum()
    }

    /// Inserted total minus selected total. Negative means the customer
    /// still owes money.
    pub fn net_balance(&self) -> Amount {
        self.total_inserted() - self.total_selected_price()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub fn insert_money(&mut self, coin: Money) -> CoreResult<()> {
        self.ensure_open("insert money")?;
        self.inserted_money.push(coin);
        Ok(())
    }

    /// Adds a snapshot of `product` to the selection.
    ///
    /// ## Errors
    /// - `TransactionClosed` on a terminal transaction
    /// - `InsufficientFunds` when the price exceeds what the funds policy
    ///   allows
    pub fn add_product(&mut self, product: &Product) -> CoreResult<()> {
        self.ensure_open("add product")?;

        let available = match self.funds_policy {
            FundsPolicy::Net => self.net_balance(),
            FundsPolicy::Gross => self.total_inserted(),
        };
        if product.price() > available {
            return Err(CoreError::InsufficientFunds {
                required: product.price(),
                available,
            });
        }

        self.selected_products
            .push(SelectedProduct::from_product(product));
        self.touched.insert(product.id());
        Ok(())
    }

    /// Removes the first selection of `product`, if any.
    pub fn remove_product(&mut self, product: &Product) -> CoreResult<()> {
        self.ensure_open("remove product")?;

        let id = product.id();
        if let Some(index) = self
            .selected_products
            .iter()
            .position(|line| line.product_id() == id)
        {
            self.selected_products.remove(index);
        }
        self.touched.insert(id);
        Ok(())
    }

    /// Computes what `complete()` would return, without changing state.
    ///
    /// ## Errors
    /// - `TransactionClosed` on a terminal transaction
    /// - `InsufficientFunds` when the net balance is negative
    pub fn checkout(&self) -> CoreResult<TransactionResult> {
        self.ensure_open("complete")?;

        if self.net_balance().is_negative() {
            return Err(CoreError::InsufficientFunds {
                required: self.total_selected_price(),
                available: self.total_inserted(),
            });
        }

        Ok(TransactionResult {
            transaction_id: self.id.clone(),
            status: TransactionStatus::Completed,
            selected_products: self.selected_products.clone(),
            inserted_money: self.inserted_money.clone(),
            total_price: self.total_selected_price(),
            update_products: self.touched.clone(),
        })
    }

    /// Closes the sale. Change is not computed here; the machine pays
    /// `result.change_due()`.
    pub fn complete(&mut self) -> CoreResult<TransactionResult> {
        let result = self.checkout()?;
        self.close(TransactionStatus::Completed);
        Ok(result)
    }

    /// Abandons the sale and refunds every inserted coin.
    pub fn cancel(&mut self) -> CoreResult<TransactionResult> {
        self.ensure_open("cancel")?;
        self.close(TransactionStatus::Cancelled);

        Ok(TransactionResult {
            transaction_id: self.id.clone(),
            status: TransactionStatus::Cancelled,
            selected_products: Vec::new(),
            inserted_money: self.inserted_money.clone(),
            total_price: Amount::zero(),
            update_products: BTreeSet::new(),
        })
    }

    fn ensure_open(&self, operation: &'static str) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::TransactionClosed {
                transaction_id: self.id.clone(),
                status: self.status,
                operation,
            });
        }
        Ok(())
    }

    fn close(&mut self, status: TransactionStatus) {
        self.status = status;
        self.closed_at = Some(Utc::now());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Denomination;

    fn coin(value: f64) -> Money {
        Money::new(value).unwrap()
    }

    fn product(name: &str, cents: i64) -> Product {
        Product::new(ProductId::new(), name, Amount::from_cents(cents), 5).unwrap()
    }

    fn closed_transactions() -> Vec<Transaction> {
        let mut completed = Transaction::new("completed");
        completed.insert_money(coin(5.0)).unwrap();
        completed.add_product(&product("Soda", 200)).unwrap();
        completed.complete().unwrap();

        let mut cancelled = Transaction::new("cancelled");
        cancelled.insert_money(coin(1.0)).unwrap();
        cancelled.cancel().unwrap();

        vec![completed, cancelled]
    }

    #[test]
    fn test_initial_state() {
        let tx = Transaction::new("tx-1");
        assert_eq!(tx.id(), "tx-1");
        assert_eq!(tx.status(), TransactionStatus::InProgress);
        assert!(tx.selected_products().is_empty());
        assert!(tx.inserted_money().is_empty());
        assert!(tx.closed_at().is_none());
        assert_eq!(tx.funds_policy(), FundsPolicy::Net);
    }

    #[test]
    fn test_insert_money_preserves_order() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(2.0)).unwrap();
        tx.insert_money(coin(0.5)).unwrap();
        tx.insert_money(coin(2.0)).unwrap();

        assert_eq!(tx.inserted_money(), &[coin(2.0), coin(0.5), coin(2.0)]);
        assert_eq!(tx.total_inserted().cents(), 450);
    }

    #[test]
    fn test_complete_with_change_due() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(5.0)).unwrap();
        tx.add_product(&product("Soda", 200)).unwrap();

        let result = tx.complete().unwrap();

        assert_eq!(tx.status(), TransactionStatus::Completed);
        assert!(tx.closed_at().is_some());
        assert_eq!(result.status, TransactionStatus::Completed);
        assert_eq!(result.total_price.cents(), 200);
        assert_eq!(result.selected_products.len(), 1);
        assert_eq!(result.inserted_money, vec![coin(5.0)]);
        assert_eq!(result.change_due().cents(), 300);
        assert_eq!(result.refund_total().cents(), 300);
    }

    #[test]
    fn test_add_product_with_insufficient_funds() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(1.0)).unwrap();

        let err = tx.add_product(&product("Soda", 200)).unwrap_err();

        assert_eq!(
            err,
            CoreError::InsufficientFunds {
                required: Amount::from_cents(200),
                available: Amount::from_cents(100),
            }
        );
        assert!(tx.selected_products().is_empty());
    }

    #[test]
    fn test_add_product_without_any_money() {
        let mut tx = Transaction::new("tx");
        assert!(matches!(
            tx.add_product(&product("Soda", 200)),
            Err(CoreError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_net_policy_counts_earlier_selections() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(1.0)).unwrap();
        let gum = product("Gum", 50);

        tx.add_product(&gum).unwrap();
        tx.add_product(&gum).unwrap();
        assert!(matches!(
            tx.add_product(&gum),
            Err(CoreError::InsufficientFunds { .. })
        ));
        assert_eq!(tx.selected_products().len(), 2);
        assert!(tx.net_balance().is_zero());
    }

    #[test]
    fn test_gross_policy_defers_to_complete() {
        let mut tx = Transaction::with_policy("tx", FundsPolicy::Gross);
        tx.insert_money(coin(1.0)).unwrap();
        let gum = product("Gum", 50);

        tx.add_product(&gum).unwrap();
        tx.add_product(&gum).unwrap();
        tx.add_product(&gum).unwrap();

        let err = tx.complete().unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientFunds {
                required: Amount::from_cents(150),
                available: Amount::from_cents(100),
            }
        );
        assert_eq!(tx.status(), TransactionStatus::InProgress);
    }

    #[test]
    fn test_each_selection_keeps_its_own_price() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(5.0)).unwrap();
        let soda = product("Soda", 200);
        tx.add_product(&soda).unwrap();

        let repriced = Product::new(soda.id(), "Soda", Amount::from_cents(250), 5).unwrap();
        tx.add_product(&repriced).unwrap();

        let prices: Vec<i64> = tx
            .selected_products()
            .iter()
            .map(|p| p.price_at_selection().cents())
            .collect();
        assert_eq!(prices, vec![200, 250]);

        let result = tx.complete().unwrap();
        assert_eq!(result.total_price.cents(), 450);
        assert_eq!(result.update_products.len(), 1);
    }

    #[test]
    fn test_remove_product_removes_first_match_only() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(5.0)).unwrap();
        let soda = product("Soda", 100);
        let chips = product("Chips", 150);

        tx.add_product(&soda).unwrap();
        tx.add_product(&chips).unwrap();
        tx.add_product(&soda).unwrap();
        tx.remove_product(&soda).unwrap();

        let names: Vec<&str> = tx.selected_products().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Chips", "Soda"]);
    }

    #[test]
    fn test_remove_unselected_product_is_recorded() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(5.0)).unwrap();
        let ghost = product("Ghost", 100);

        tx.remove_product(&ghost).unwrap();
        assert!(tx.selected_products().is_empty());

        let result = tx.complete().unwrap();
        assert!(result.update_products.contains(&ghost.id()));
    }

    #[test]
    fn test_complete_reports_touched_products() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(10.0)).unwrap();
        let soda = product("Soda", 200);
        let chips = product("Chips", 150);
        tx.add_product(&soda).unwrap();
        tx.add_product(&chips).unwrap();
        tx.add_product(&soda).unwrap();

        let result = tx.complete().unwrap();
        assert_eq!(result.update_products.len(), 2);
        assert_eq!(result.total_price.cents(), 550);
    }

    #[test]
    fn test_checkout_does_not_close() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(2.0)).unwrap();

        let preview = tx.checkout().unwrap();
        assert_eq!(tx.status(), TransactionStatus::InProgress);
        assert_eq!(preview, tx.complete().unwrap());
    }

    #[test]
    fn test_cancel_refunds_everything() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(coin(2.0)).unwrap();
        tx.insert_money(coin(1.0)).unwrap();

        let result = tx.cancel().unwrap();

        assert_eq!(tx.status(), TransactionStatus::Cancelled);
        assert!(result.is_refund());
        assert!(result.selected_products.is_empty());
        assert_eq!(result.inserted_money, vec![coin(2.0), coin(1.0)]);
        assert!(result.total_price.is_zero());
        assert!(result.update_products.is_empty());
        assert_eq!(result.refund_total().cents(), 300);
    }

    #[test]
    fn test_cancel_with_selection_still_refunds_all() {
        let mut tx = Transaction::new("tx");
        tx.insert_money(Money::of(Denomination::Five)).unwrap();
        tx.add_product(&product("Soda", 200)).unwrap();

        let result = tx.cancel().unwrap();
        assert!(result.selected_products.is_empty());
        assert_eq!(result.inserted_total().cents(), 500);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let soda = product("Soda", 100);

        for mut tx in closed_transactions() {
            let status = tx.status();
            let closed = |err: CoreError| {
                matches!(err, CoreError::TransactionClosed { status: s, .. } if s == status)
            };

            assert!(closed(tx.insert_money(coin(1.0)).unwrap_err()));
            assert!(closed(tx.add_product(&soda).unwrap_err()));
            assert!(closed(tx.remove_product(&soda).unwrap_err()));
            assert!(closed(tx.complete().unwrap_err()));
            assert!(closed(tx.cancel().unwrap_err()));
            assert_eq!(tx.status(), status);
        }
    }

    #[test]
    fn test_funds_policy_parsing() {
        assert_eq!("net".parse::<FundsPolicy>().unwrap(), FundsPolicy::Net);
        assert_eq!(" Gross ".parse::<FundsPolicy>().unwrap(), FundsPolicy::Gross);
        assert!("half".parse::<FundsPolicy>().is_err());
    }
}
