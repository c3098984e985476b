//! # Vending Machine
//!
//! Owns the product catalog and the coin pool.
//!
//! ## Settlement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    settle(selected, change_due)                         │
//! │                                                                         │
//! │  Phase 1: verify (no mutation)                                          │
//! │  ├── every selected product exists                                      │
//! │  ├── stock covers the number of times each product was selected        │
//! │  └── the coin pool can pay change_due exactly (ChangePlan)             │
//! │           │                                                             │
//! │           ├── any check fails ──► Err, catalog and pool untouched      │
//! │           ▼                                                             │
//! │  Phase 2: commit                                                        │
//! │  ├── decrement stock once per selected line                            │
//! │  └── remove the planned coins from the pool                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine never holds a reference to a transaction; the service layer
//! passes it the selection and the amount owed.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::amount::Amount;
use crate::change::{ChangePlan, CoinPool};
use crate::error::{CoreError, CoreResult};
use crate::money::{Denomination, Money};
use crate::types::{Product, ProductId, SelectedProduct};
use crate::validation::validate_restock_quantity;

/// What a successful settlement handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// One entry per unit dispensed, in selection order.
    pub dispensed: Vec<ProductId>,
    /// Change paid, largest coin first.
    pub change: Vec<Money>,
}

/// Catalog plus change engine.
#[derive(Debug, Clone, Default)]
pub struct VendingMachine {
    products: HashMap<ProductId, Product>,
    change: CoinPool,
}

impl VendingMachine {
    /// Stocks a machine with products and a starting set of coins.
    ///
    /// ## Errors
    /// `DuplicateProduct` when two products share an identifier.
    pub fn new<P, C>(products: P, coins: C) -> CoreResult<Self>
    where
        P: IntoIterator<Item = Product>,
        C: IntoIterator<Item = Money>,
    {
        Self::with_pool(products, CoinPool::from_coins(coins))
    }

    /// Stocks a machine with products and a prepared coin pool.
    pub fn with_pool<P>(products: P, change: CoinPool) -> CoreResult<Self>
    where
        P: IntoIterator<Item = Product>,
    {
        let mut catalog = HashMap::new();
        for product in products {
            let id = product.id();
            if catalog.insert(id, product).is_some() {
                return Err(CoreError::DuplicateProduct(id));
            }
        }

        Ok(VendingMachine {
            products: catalog,
            change,
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// True iff the product exists and has stock.
    pub fn is_product_available(&self, id: &ProductId) -> bool {
        self.products.get(id).is_some_and(Product::is_available)
    }

    pub fn get_product(&self, id: &ProductId) -> CoreResult<&Product> {
        self.products
            .get(id)
            .ok_or(CoreError::ProductNotFound(*id))
    }

    /// Snapshot of the catalog, ordered by name.
    pub fn all_products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.values().cloned().collect();
        products.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        products
    }

    /// Removes one unit of a product from stock.
    ///
    /// ## Errors
    /// - `ProductNotFound` when the id is not in the catalog
    /// - `OutOfStock` when its quantity is zero
    pub fn dispense_product(&mut self, id: &ProductId) -> CoreResult<()> {
        self.products
            .get_mut(id)
            .ok_or(CoreError::ProductNotFound(*id))?
            .decrease_quantity()
    }

    /// Adds units to an existing product.
    pub fn restock(&mut self, id: &ProductId, units: u32) -> CoreResult<&Product> {
        validate_restock_quantity(units)?;
        let product = self
            .products
            .get_mut(id)
            .ok_or(CoreError::ProductNotFound(*id))?;
        product.increase_quantity(units);
        Ok(product)
    }

    // =========================================================================
    // Change
    // =========================================================================

    /// Computes change against the current pool without consuming coins.
    pub fn plan_change(&self, amount: Amount) -> CoreResult<ChangePlan> {
        self.change.plan(amount)
    }

    /// Pays `amount` out of the pool, largest coins first.
    ///
    /// `Ok(vec![])` means nothing was owed. When exact change is impossible
    /// the error is returned and no coin leaves the pool.
    pub fn calculate_change(&mut self, amount: Amount) -> CoreResult<Vec<Money>> {
        self.change.pay(amount)
    }

    /// Dry run of [`calculate_change`](Self::calculate_change).
    pub fn can_dispense_change(&self, amount: Amount) -> bool {
        self.change.plan(amount).is_ok()
    }

    /// Adds coins to the pool (service refill).
    pub fn load_coins<I>(&mut self, coins: I)
    where
        I: IntoIterator<Item = Money>,
    {
        for coin in coins {
            self.change.deposit(coin);
        }
    }

    pub fn coin_counts(&self) -> BTreeMap<Denomination, u32> {
        self.change.snapshot()
    }

    pub fn change_pool(&self) -> &CoinPool {
        &self.change
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Dispenses every selected product and pays `change_due`, or does
    /// neither.
    pub fn settle(
        &mut self,
        selected: &[SelectedProduct],
        change_due: Amount,
    ) -> CoreResult<Settlement> {
        let mut demand: BTreeMap<ProductId, u32> = BTreeMap::new();
        for line in selected {
            *demand.entry(line.product_id()).or_insert(0) += 1;
        }

        for (id, requested) in &demand {
            let product = self.get_product(id)?;
            if product.quantity() < *requested {
                return Err(CoreError::OutOfStock {
                    product_id: *id,
                    name: product.name().to_string(),
                    available: product.quantity(),
                    requested: *requested,
                });
            }
        }

        let plan = self.change.plan(change_due)?;

        // Commit. Every check above covers the operations below.
        for line in selected {
            self.dispense_product(&line.product_id())?;
        }
        self.change.commit(&plan)?;

        Ok(Settlement {
            dispensed: selected.iter().map(SelectedProduct::product_id).collect(),
            change: plan.into_coins(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn coins(denomination: Denomination, count: usize) -> Vec<Money> {
        vec![Money::of(denomination); count]
    }

    fn standard_coins() -> Vec<Money> {
        [
            coins(Denomination::Ten, 3),
            coins(Denomination::Five, 4),
            coins(Denomination::Two, 5),
            coins(Denomination::One, 5),
            coins(Denomination::Half, 5),
        ]
        .concat()
    }

    fn product(name: &str, cents: i64, quantity: u32) -> Product {
        Product::new(ProductId::new(), name, Amount::from_cents(cents), quantity).unwrap()
    }

    fn machine_with(products: Vec<Product>) -> VendingMachine {
        VendingMachine::new(products, standard_coins()).unwrap()
    }

    #[test]
    fn test_all_products() {
        let water = product("Water Bottle", 150, 10);
        let sandwich = product("Sandwich", 400, 5);
        let machine = machine_with(vec![water.clone(), sandwich.clone()]);

        let all = machine.all_products();
        assert_eq!(all, vec![sandwich, water]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let water = product("Water Bottle", 150, 10);
        let err = VendingMachine::new(vec![water.clone(), water.clone()], vec![]).unwrap_err();
        assert_eq!(err, CoreError::DuplicateProduct(water.id()));
    }

    #[test]
    fn test_get_product() {
        let water = product("Water Bottle", 150, 10);
        let machine = machine_with(vec![water.clone()]);

        assert_eq!(machine.get_product(&water.id()).unwrap(), &water);

        let missing = ProductId::new();
        assert_eq!(
            machine.get_product(&missing).unwrap_err(),
            CoreError::ProductNotFound(missing)
        );
    }

    #[test]
    fn test_availability() {
        let water = product("Water Bottle", 150, 10);
        let empty = product("Gum", 100, 0);
        let machine = machine_with(vec![water.clone(), empty.clone()]);

        assert!(machine.is_product_available(&water.id()));
        assert!(!machine.is_product_available(&empty.id()));
        assert!(!machine.is_product_available(&ProductId::new()));
    }

    #[test]
    fn test_dispense_product() {
        let water = product("Water Bottle", 150, 1);
        let mut machine = machine_with(vec![water.clone()]);

        machine.dispense_product(&water.id()).unwrap();
        assert_eq!(machine.get_product(&water.id()).unwrap().quantity(), 0);

        assert!(matches!(
            machine.dispense_product(&water.id()),
            Err(CoreError::OutOfStock { .. })
        ));
        assert!(matches!(
            machine.dispense_product(&ProductId::new()),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_calculate_change_scenario() {
        let mut machine = machine_with(vec![]);
        let change = machine.calculate_change(Amount::from_cents(750)).unwrap();

        assert_eq!(
            change,
            vec![
                Money::of(Denomination::Five),
                Money::of(Denomination::Two),
                Money::of(Denomination::Half),
            ]
        );

        let counts = machine.coin_counts();
        assert_eq!(counts[&Denomination::Ten], 3);
        assert_eq!(counts[&Denomination::Five], 3);
        assert_eq!(counts[&Denomination::Two], 4);
        assert_eq!(counts[&Denomination::One], 5);
        assert_eq!(counts[&Denomination::Half], 4);
    }

    #[test]
    fn test_calculate_change_sums_exactly() {
        let mut machine = machine_with(vec![]);
        let change = machine.calculate_change(Amount::from_cents(350)).unwrap();
        assert_eq!(Money::total(&change).cents(), 350);
    }

    #[test]
    fn test_infeasible_change() {
        let mut machine = machine_with(vec![]);
        let before = machine.coin_counts();

        assert!(matches!(
            machine.calculate_change(Amount::from_cents(30)),
            Err(CoreError::ExactChangeUnavailable { .. })
        ));
        assert_eq!(machine.coin_counts(), before);
    }

    #[test]
    fn test_zero_change_is_distinct_from_failure() {
        let mut machine = VendingMachine::default();
        assert_eq!(machine.calculate_change(Amount::zero()).unwrap(), vec![]);
        assert!(machine.calculate_change(Amount::from_cents(50)).is_err());
    }

    #[test]
    fn test_can_dispense_change_is_dry_run() {
        let machine = machine_with(vec![]);
        let before = machine.coin_counts();

        assert!(machine.can_dispense_change(Amount::from_cents(350)));
        assert!(!machine.can_dispense_change(Amount::from_cents(30)));
        assert_eq!(machine.coin_counts(), before);
    }

    #[test]
    fn test_settle_dispenses_and_pays() {
        let water = product("Water Bottle", 150, 10);
        let mut machine = machine_with(vec![water.clone()]);
        let line = SelectedProduct::from_product(&water);

        let settlement = machine
            .settle(&[line.clone(), line], Amount::from_cents(200))
            .unwrap();

        assert_eq!(settlement.dispensed, vec![water.id(), water.id()]);
        assert_eq!(settlement.change, vec![Money::of(Denomination::Two)]);
        assert_eq!(machine.get_product(&water.id()).unwrap().quantity(), 8);
        assert_eq!(machine.coin_counts()[&Denomination::Two], 4);
    }

    #[test]
    fn test_settle_is_atomic_when_change_is_impossible() {
        let water = product("Water Bottle", 150, 10);
        let mut machine = VendingMachine::new(vec![water.clone()], vec![]).unwrap();
        let line = SelectedProduct::from_product(&water);

        let err = machine.settle(&[line], Amount::from_cents(50)).unwrap_err();

        assert!(matches!(err, CoreError::ExactChangeUnavailable { .. }));
        assert_eq!(machine.get_product(&water.id()).unwrap().quantity(), 10);
    }

    #[test]
    fn test_settle_is_atomic_when_stock_is_short() {
        let gum = product("Gum", 100, 1);
        let mut machine = machine_with(vec![gum.clone()]);
        let before = machine.coin_counts();
        let line = SelectedProduct::from_product(&gum);

        let err = machine
            .settle(&[line.clone(), line], Amount::from_cents(100))
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::OutOfStock {
                available: 1,
                requested: 2,
                ..
            }
        ));
        assert_eq!(machine.get_product(&gum.id()).unwrap().quantity(), 1);
        assert_eq!(machine.coin_counts(), before);
    }

    #[test]
    fn test_restock_and_load_coins() {
        let gum = product("Gum", 100, 0);
        let mut machine = VendingMachine::new(vec![gum.clone()], vec![]).unwrap();

        machine.restock(&gum.id(), 5).unwrap();
        assert!(machine.is_product_available(&gum.id()));
        assert!(machine.restock(&gum.id(), 0).is_err());

        machine.load_coins(coins(Denomination::Half, 2));
        assert!(machine.can_dispense_change(Amount::from_cents(100)));
        assert_eq!(machine.change_pool().coin_count(), 2);
    }
}
