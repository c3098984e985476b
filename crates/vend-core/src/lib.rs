//! # vend-core: Pure Purchase Logic for the Vending Machine
//!
//! Coins, products, the per-customer transaction state machine and the
//! machine's change engine. No I/O, no locks, no logging.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vending Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vend-demo (binary)                           │   │
//! │  │    scenarios ──► concurrent sessions ──► JSON orders            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vend-service                                 │   │
//! │  │    sessions, machine lock, repository, config, tracing          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vend-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   money   │  │   types   │  │ transaction │  │ machine  │  │   │
//! │  │   │   Money   │  │  Product  │  │ Transaction │  │ settle   │  │   │
//! │  │   │  Amount   │  │ Selected  │  │   Result    │  │ CoinPool │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOCKS • NO LOGGING • DETERMINISTIC                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`amount`] - Integer-cent amounts
//! - [`money`] - Accepted coin denominations
//! - [`types`] - Product, SelectedProduct, TransactionStatus
//! - [`transaction`] - One customer's purchase session
//! - [`change`] - Coin pool and greedy change-making
//! - [`machine`] - Inventory plus coin pool, atomic settlement
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use vend_core::{Amount, Money, Product, ProductId, Transaction, VendingMachine};
//!
//! let water = Product::new(ProductId::new(), "Water Bottle", Amount::from_cents(150), 10).unwrap();
//! let mut machine = VendingMachine::new(
//!     vec![water.clone()],
//!     vec![Money::new(0.5).unwrap(), Money::new(2.0).unwrap()],
//! )
//! .unwrap();
//!
//! let mut tx = Transaction::new("tx-1");
//! tx.insert_money(Money::new(2.0).unwrap()).unwrap();
//! tx.add_product(&water).unwrap();
//!
//! let result = tx.complete().unwrap();
//! let settlement = machine
//!     .settle(&result.selected_products, result.change_due())
//!     .unwrap();
//!
//! assert_eq!(settlement.change, vec![Money::new(0.5).unwrap()]);
//! assert_eq!(machine.get_product(&water.id()).unwrap().quantity(), 9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod amount;
pub mod change;
pub mod error;
pub mod machine;
pub mod money;
pub mod transaction;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use amount::Amount;
pub use change::{ChangePlan, CoinPool};
pub use error::{CoreError, CoreResult, ValidationError};
pub use machine::{Settlement, VendingMachine};
pub use money::{Denomination, Money};
pub use transaction::{FundsPolicy, Transaction, TransactionResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a product name, in characters.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// Maximum units a single restock may add.
///
/// Guards against a typo like 1000 instead of 10.
pub const MAX_PRODUCT_QUANTITY: u32 = 999;
