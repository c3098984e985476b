//! # Vending Service
//!
//! Drives the domain on behalf of concurrent customers.
//!
//! ## Order Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  insert_money ──► session tx (created on first use)                     │
//! │  select_product ─► machine: available? snapshot ─► tx.add_product       │
//! │                                                                         │
//! │  complete_order                                                         │
//! │   1. lock session tx                                                    │
//! │   2. tx.checkout()              funds check, no state change            │
//! │   3. lock machine                                                       │
//! │   4. machine.settle(...)        stock + change, all or nothing          │
//! │        └── Err ──► tx stays IN_PROGRESS, customer may cancel            │
//! │   5. tx.complete()                                                      │
//! │   6. forget the session         a new coin starts a new transaction     │
//! │   7. repository.update_product  for every touched product, still under  │
//! │                                 the machine lock                        │
//! │                                                                         │
//! │  cancel_order ──► tx.cancel() ──► refund every inserted coin            │
//! │                                                                         │
//! │  reclaim_idle_sessions ──► cancel transactions nobody touched lately   │
//! │                                                                         │
//! │  Lock order is always session tx, then machine, then session map.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use vend_core::{
    Amount, CoreError, Denomination, FundsPolicy, Money, Product, ProductId, SelectedProduct,
    TransactionResult, TransactionStatus, VendingMachine,
};

use crate::config::MachineConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::repository::ProductRepository;
use crate::session::{SessionId, SessionStore};

// =============================================================================
// Order
// =============================================================================

/// What the customer walks away with after completing or cancelling.
///
/// ## Serialization
/// ```json
/// {
///   "transactionId": "5b0f…",
///   "status": "COMPLETED",
///   "selectedProducts": [{ "productId": "…", "name": "Sandwich", "priceAtSelection": 400 }],
///   "returnedMoney": [5.0, 1.0],
///   "totalPrice": 400
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub selected_products: Vec<SelectedProduct>,
    pub returned_money: Vec<Money>,
    pub total_price: Amount,
}

impl Order {
    fn completed(result: TransactionResult, change: Vec<Money>) -> Self {
        Order {
            transaction_id: result.transaction_id,
            status: result.status,
            selected_products: result.selected_products,
            returned_money: change,
            total_price: result.total_price,
        }
    }

    fn cancelled(result: TransactionResult) -> Self {
        Order {
            transaction_id: result.transaction_id,
            status: result.status,
            selected_products: Vec::new(),
            returned_money: result.inserted_money,
            total_price: Amount::zero(),
        }
    }

    pub fn returned_total(&self) -> Amount {
        Money::total(&self.returned_money)
    }
}

// =============================================================================
// Vending Service
// =============================================================================

pub struct VendingService {
    name: String,
    funds_policy: FundsPolicy,
    machine: Mutex<VendingMachine>,
    sessions: SessionStore,
    repository: Arc<dyn ProductRepository>,
}

impl VendingService {
    /// Wraps an already stocked machine.
    pub fn new(
        machine: VendingMachine,
        repository: Arc<dyn ProductRepository>,
        funds_policy: FundsPolicy,
    ) -> Self {
        VendingService {
            name: "Vending Machine".to_string(),
            funds_policy,
            machine: Mutex::new(machine),
            sessions: SessionStore::new(),
            repository,
        }
    }

    /// Builds the service from configuration.
    ///
    /// An empty repository is seeded with the configured products first.
    /// The catalog is then read back from the repository so stock persisted
    /// by an earlier run wins over the configured quantities.
    pub async fn bootstrap(
        config: &MachineConfig,
        repository: Arc<dyn ProductRepository>,
    ) -> ServiceResult<Self> {
        config.validate()?;

        if repository.find_all().await?.is_empty() {
            let catalog = config.catalog()?;
            info!(count = catalog.len(), "Seeding empty product repository");
            for product in &catalog {
                repository.save_product(product).await?;
            }
        }

        let products = repository.find_all().await?;
        let machine = VendingMachine::new(products, config.coins()?)?;

        info!(
            machine = config.machine_name(),
            products = machine.all_products().len(),
            change = %machine.change_pool().total(),
            funds_policy = %config.funds_policy(),
            "Vending machine ready"
        );

        Ok(VendingService {
            name: config.machine_name().to_string(),
            funds_policy: config.funds_policy(),
            machine: Mutex::new(machine),
            sessions: SessionStore::new(),
            repository,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn funds_policy(&self) -> FundsPolicy {
        self.funds_policy
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Hands out a new session id. The transaction is created by the first
    /// coin or selection.
    pub fn open_session(&self) -> SessionId {
        let session = SessionId::new();
        debug!(session_id = %session, "Session opened");
        session
    }

    /// Number of sessions with an open transaction.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }

    /// Adds a coin to the session's transaction. Returns the new total.
    pub async fn insert_money(&self, session: SessionId, coin: Money) -> ServiceResult<Amount> {
        let handle = self.sessions.get_or_create(session, self.funds_policy).await;
        let mut tx = handle.lock().await;
        tx.insert_money(coin)?;

        let total = tx.total_inserted();
        debug!(session_id = %session, coin = %coin, total = %total, "Coin inserted");
        Ok(total)
    }

    /// Selects one unit of a product.
    ///
    /// ## Errors
    /// - `ProductNotFound` when the product is unknown or out of stock
    /// - `InsufficientFunds` per the configured funds policy
    pub async fn select_product(&self, session: SessionId, product_id: ProductId) -> ServiceResult<()> {
        let product = self.available_product(product_id).await?;

        let handle = self.sessions.get_or_create(session, self.funds_policy).await;
        let mut tx = handle.lock().await;
        tx.add_product(&product).map_err(|e| {
            debug!(session_id = %session, product_id = %product_id, error = %e, "Selection refused");
            e
        })?;

        debug!(
            session_id = %session,
            product_id = %product_id,
            price = %product.price(),
            "Product selected"
        );
        Ok(())
    }

    /// Removes one selection of a product. A product that was never
    /// selected is a no-op.
    pub async fn unselect_product(&self, session: SessionId, product_id: ProductId) -> ServiceResult<()> {
        let product = {
            let machine = self.machine.lock().await;
            machine.get_product(&product_id)?.clone()
        };

        let handle = self
            .sessions
            .get(session)
            .await
            .ok_or(ServiceError::NoActiveTransaction { session_id: session })?;
        handle.lock().await.remove_product(&product)?;

        debug!(session_id = %session, product_id = %product_id, "Product unselected");
        Ok(())
    }

    /// Current selection. Empty when the session has no transaction.
    pub async fn selected_products(&self, session: SessionId) -> Vec<SelectedProduct> {
        match self.sessions.get(session).await {
            Some(handle) => handle.lock().await.selected_products().to_vec(),
            None => Vec::new(),
        }
    }

    /// Total inserted so far. Zero when the session has no transaction.
    pub async fn total_inserted(&self, session: SessionId) -> Amount {
        match self.sessions.get(session).await {
            Some(handle) => handle.lock().await.total_inserted(),
            None => Amount::zero(),
        }
    }

    /// Dispenses the selection and returns change.
    ///
    /// Settlement is all or nothing. When the machine is short on stock or
    /// cannot make exact change the error is returned, nothing is dispensed
    /// and the transaction stays open.
    pub async fn complete_order(&self, session: SessionId) -> ServiceResult<Order> {
        let handle = self
            .sessions
            .get(session)
            .await
            .ok_or(ServiceError::NoActiveTransaction { session_id: session })?;
        let mut tx = handle.lock().await;

        let preview = tx.checkout()?;

        let mut machine = self.machine.lock().await;
        let settlement = machine
            .settle(&preview.selected_products, preview.change_due())
            .map_err(|e| {
                warn!(
                    session_id = %session,
                    transaction_id = %preview.transaction_id,
                    error = %e,
                    "Settlement refused"
                );
                e
            })?;
        let result = tx.complete()?;
        self.sessions.remove(session).await;
        drop(tx);

        info!(
            session_id = %session,
            transaction_id = %result.transaction_id,
            items = result.selected_products.len(),
            total = %result.total_price,
            change = %Money::total(&settlement.change),
            "Order completed"
        );

        // Stored stock must follow settlement order, so the machine stays
        // locked until every touched product is written.
        let touched: Vec<Product> = result
            .update_products
            .iter()
            .filter_map(|id| machine.get_product(id).ok().cloned())
            .collect();
        self.persist(&touched).await;
        drop(machine);

        Ok(Order::completed(result, settlement.change))
    }

    /// Abandons the order and refunds every inserted coin.
    pub async fn cancel_order(&self, session: SessionId) -> ServiceResult<Order> {
        let handle = self
            .sessions
            .get(session)
            .await
            .ok_or(ServiceError::NoActiveTransaction { session_id: session })?;

        let result = handle.lock().await.cancel()?;
        self.sessions.remove(session).await;

        info!(
            session_id = %session,
            transaction_id = %result.transaction_id,
            refund = %result.refund_total(),
            "Order cancelled"
        );
        Ok(Order::cancelled(result))
    }

    /// Cancels every transaction left untouched for longer than `max_idle`
    /// and returns the refunds owed.
    pub async fn reclaim_idle_sessions(&self, max_idle: Duration) -> Vec<Order> {
        let mut refunds = Vec::new();
        for (session, handle) in self.sessions.reclaim_idle(max_idle).await {
            match handle.lock().await.cancel() {
                Ok(result) => {
                    info!(
                        session_id = %session,
                        transaction_id = %result.transaction_id,
                        refund = %result.refund_total(),
                        "Idle session reclaimed"
                    );
                    refunds.push(Order::cancelled(result));
                }
                Err(e) => debug!(session_id = %session, error = %e, "Idle session already closed"),
            }
        }
        refunds
    }

    // =========================================================================
    // Catalog & Maintenance
    // =========================================================================

    /// Every product as persisted, ordered by name.
    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get_product(&self, product_id: ProductId) -> ServiceResult<Product> {
        self.repository
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id).into())
    }

    pub async fn coin_counts(&self) -> BTreeMap<Denomination, u32> {
        self.machine.lock().await.coin_counts()
    }

    /// Adds stock to a product and persists it.
    pub async fn restock(&self, product_id: ProductId, units: u32) -> ServiceResult<Product> {
        let mut machine = self.machine.lock().await;
        let product = machine.restock(&product_id, units)?.clone();
        self.repository.update_product(&product).await?;
        drop(machine);

        info!(product_id = %product_id, units, quantity = product.quantity(), "Product restocked");
        Ok(product)
    }

    /// Refills the change pool.
    pub async fn load_coins(&self, coins: Vec<Money>) -> Amount {
        let mut machine = self.machine.lock().await;
        let added = Money::total(&coins);
        machine.load_coins(coins);

        info!(added = %added, total = %machine.change_pool().total(), "Coins loaded");
        machine.change_pool().total()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn available_product(&self, product_id: ProductId) -> ServiceResult<Product> {
        let machine = self.machine.lock().await;
        if !machine.is_product_available(&product_id) {
            return Err(CoreError::ProductNotFound(product_id).into());
        }
        Ok(machine.get_product(&product_id)?.clone())
    }

    /// Writes dispensed stock back. The goods and change are already out,
    /// so a failure is logged and the sale stands.
    async fn persist(&self, products: &[Product]) {
        for product in products {
            if let Err(e) = self.repository.update_product(product).await {
                error!(
                    product_id = %product.id(),
                    quantity = product.quantity(),
                    error = %e,
                    "Failed to persist product stock"
                );
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
