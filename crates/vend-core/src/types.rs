//! # Domain Types
//!
//! Catalog and selection types shared by the machine and the transaction.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   snapshot   ┌─────────────────────┐              │
//! │  │    Product      │ ───────────► │   SelectedProduct   │              │
//! │  │  ─────────────  │  at select   │  ─────────────────  │              │
//! │  │  id (UUID)      │              │  product_id         │              │
//! │  │  name           │              │  name               │              │
//! │  │  price          │              │  price_at_selection │              │
//! │  │  quantity (mut) │              │  (immutable)        │              │
//! │  └─────────────────┘              └─────────────────────┘              │
//! │                                                                         │
//! │  ┌──────────────────────┐                                               │
//! │  │  TransactionStatus   │  IN_PROGRESS ──► COMPLETED                   │
//! │  │                      │       └────────► CANCELLED                   │
//! │  └──────────────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::amount::Amount;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{validate_price, validate_product_name};

// =============================================================================
// Product Id
// =============================================================================

/// Opaque product identifier (UUID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        ProductId(Uuid::new_v4())
    }

    #[inline]
    pub const fn from_uuid(id: Uuid) -> Self {
        ProductId(id)
    }

    #[inline]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        ProductId::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProductId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(ProductId)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "product_id".to_string(),
                reason: e.to_string(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product stocked in the machine.
///
/// Fields are private so the invariants hold for the lifetime of the value:
/// the name is non-empty, the price is positive, and the quantity can only
/// go down one unit at a time through [`Product::decrease_quantity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Amount,
    quantity: u32,
}

impl Product {
    /// Creates a product after validating name and price.
    ///
    /// ## Example
    /// ```rust
    /// use vend_core::{Amount, Product, ProductId};
    ///
    /// let water = Product::new(ProductId::new(), "Water Bottle", Amount::from_cents(150), 10).unwrap();
    /// assert!(water.is_available());
    /// assert!(Product::new(ProductId::new(), "  ", Amount::from_cents(150), 1).is_err());
    /// ```
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Amount,
        quantity: u32,
    ) -> CoreResult<Self> {
        let name = name.into();
        validate_product_name(&name)?;
        validate_price(price)?;

        Ok(Product {
            id,
            name: name.trim().to_string(),
            price,
            quantity,
        })
    }

    #[inline]
    pub fn id(&self) -> ProductId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn price(&self) -> Amount {
        self.price
    }

    #[inline]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// True iff at least one unit is in stock.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }

    /// Removes one unit from stock.
    ///
    /// ## Errors
    /// `CoreError::OutOfStock` when the quantity is already zero; the
    /// product is left unchanged.
    pub fn decrease_quantity(&mut self) -> CoreResult<()> {
        if self.quantity == 0 {
            return Err(CoreError::OutOfStock {
                product_id: self.id,
                name: self.name.clone(),
                available: 0,
                requested: 1,
            });
        }
        self.quantity -= 1;
        Ok(())
    }

    /// Adds units to stock (saturating).
    pub fn increase_quantity(&mut self, units: u32) {
        self.quantity = self.quantity.saturating_add(units);
    }
}

// =============================================================================
// Selected Product
// =============================================================================

/// Frozen copy of a product taken when it is added to a transaction.
///
/// A later price change on the live [`Product`] does not reach an
/// in-flight transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedProduct {
    product_id: ProductId,
    name: String,
    price_at_selection: Amount,
}

impl SelectedProduct {
    pub fn new(product_id: ProductId, name: impl Into<String>, price_at_selection: Amount) -> Self {
        SelectedProduct {
            product_id,
            name: name.into(),
            price_at_selection,
        }
    }

    /// Takes the snapshot.
    pub fn from_product(product: &Product) -> Self {
        SelectedProduct {
            product_id: product.id(),
            name: product.name().to_string(),
            price_at_selection: product.price(),
        }
    }

    #[inline]
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn price_at_selection(&self) -> Amount {
        self.price_at_selection
    }
}

impl From<&Product> for SelectedProduct {
    fn from(product: &Product) -> Self {
        SelectedProduct::from_product(product)
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Accepting coins and selections. Initial state.
    #[default]
    InProgress,
    /// Products dispensed and change returned. Terminal.
    Completed,
    /// All inserted coins refunded. Terminal.
    Cancelled,
}

impl TransactionStatus {
    /// True for `Completed` and `Cancelled`; no transition leaves them.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::InProgress)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::InProgress => write!(f, "IN_PROGRESS"),
            TransactionStatus::Completed => write!(f, "COMPLETED"),
            TransactionStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: u32) -> Product {
        Product::new(ProductId::new(), "Sandwich", Amount::from_cents(400), quantity).unwrap()
    }

    #[test]
    fn test_product_availability() {
        assert!(product(1).is_available());
        assert!(!product(0).is_available());
    }

    #[test]
    fn test_decrease_quantity() {
        let mut p = product(2);
        p.decrease_quantity().unwrap();
        assert_eq!(p.quantity(), 1);
        p.decrease_quantity().unwrap();
        assert_eq!(p.quantity(), 0);
    }

    #[test]
    fn test_decrease_quantity_at_zero_fails() {
        let mut p = product(0);
        let err = p.decrease_quantity().unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { available: 0, .. }));
        assert_eq!(p.quantity(), 0);
    }

    #[test]
    fn test_product_validation() {
        let id = ProductId::new();
        assert!(Product::new(id, "", Amount::from_cents(100), 1).is_err());
        assert!(Product::new(id, "Gum", Amount::zero(), 1).is_err());
        assert!(Product::new(id, "Gum", Amount::from_cents(-5), 1).is_err());
        // Price does not have to be a coin denomination.
        assert!(Product::new(id, "Gum", Amount::from_cents(130), 1).is_ok());
    }

    #[test]
    fn test_snapshot_is_frozen() {
        let p = product(3);
        let snapshot = SelectedProduct::from_product(&p);

        let repriced =
            Product::new(p.id(), p.name(), Amount::from_cents(999), p.quantity()).unwrap();

        assert_eq!(snapshot.price_at_selection().cents(), 400);
        assert_eq!(snapshot.product_id(), repriced.id());
        assert_eq!(snapshot.name(), "Sandwich");
    }

    #[test]
    fn test_product_id_parsing() {
        let id = ProductId::new();
        let parsed: ProductId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_status_terminality() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::InProgress);
        assert!(!TransactionStatus::InProgress.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
    }
}
