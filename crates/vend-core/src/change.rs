//! # Change Engine
//!
//! The machine's finite pool of coins and the greedy algorithm that pays
//! change out of it.
//!
//! ## Plan, Then Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  plan(7.50)                      pool unchanged                         │
//! │     │                                                                   │
//! │     │  10.00 × 3  → 7.50 < 10.00, skip                                  │
//! │     │   5.00 × 4  → take 1, remaining 2.50                              │
//! │     │   2.00 × 5  → take 1, remaining 0.50                              │
//! │     │   1.00 × 5  → 0.50 < 1.00, skip                                   │
//! │     │   0.50 × 5  → take 1, remaining 0.00  ✅                          │
//! │     ▼                                                                   │
//! │  ChangePlan [5.00, 2.00, 0.50]                                          │
//! │     │                                                                   │
//! │  commit(&plan)                   pool: 5.00 × 3, 2.00 × 4, 0.50 × 4     │
//! │                                                                         │
//! │  A remainder that cannot reach 0 is an error and the pool is never     │
//! │  touched. Dry runs (can the machine pay?) call plan() only.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

use crate::amount::Amount;
use crate::error::{CoreError, CoreResult};
use crate::money::{Denomination, Money};

// =============================================================================
// Change Plan
// =============================================================================

/// Coins the pool would pay out, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangePlan {
    coins: Vec<Money>,
}

impl ChangePlan {
    pub fn coins(&self) -> &[Money] {
        &self.coins
    }

    pub fn into_coins(self) -> Vec<Money> {
        self.coins
    }

    pub fn total(&self) -> Amount {
        Money::total(&self.coins)
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// How many coins of each denomination the plan uses.
    pub fn counts(&self) -> BTreeMap<Denomination, u32> {
        let mut counts = BTreeMap::new();
        for coin in &self.coins {
            *counts.entry(coin.denomination()).or_insert(0) += 1;
        }
        counts
    }
}

// =============================================================================
// Coin Pool
// =============================================================================

/// Remaining coins per denomination. Counts never go negative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinPool {
    counts: BTreeMap<Denomination, u32>,
}

impl CoinPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a pool holding one unit per coin given.
    pub fn from_coins<I>(coins: I) -> Self
    where
        I: IntoIterator<Item = Money>,
    {
        let mut pool = CoinPool::new();
        for coin in coins {
            pool.deposit(coin);
        }
        pool
    }

    /// Adds one coin to the pool.
    pub fn deposit(&mut self, coin: Money) {
        self.deposit_many(coin.denomination(), 1);
    }

    /// Adds `count` coins of one denomination.
    pub fn deposit_many(&mut self, denomination: Denomination, count: u32) {
        let slot = self.counts.entry(denomination).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    pub fn count(&self, denomination: Denomination) -> u32 {
        self.counts.get(&denomination).copied().unwrap_or(0)
    }

    /// Total number of coins held.
    pub fn coin_count(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Total value held.
    pub fn total(&self) -> Amount {
        self.counts
            .iter()
            .map(|(denomination, count)| denomination.amount() * *count)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.coin_count() == 0
    }

    /// Copy of the per-denomination counts, including empty slots.
    pub fn snapshot(&self) -> BTreeMap<Denomination, u32> {
        Denomination::ALL
            .into_iter()
            .map(|d| (d, self.count(d)))
            .collect()
    }

    /// Computes change for `amount` without touching the pool.
    ///
    /// Walks the denominations largest first and takes as many coins of each
    /// as fit in the remainder and are available.
    ///
    /// ## Errors
    /// - `NegativeAmount` when `amount < 0`
    /// - `ExactChangeUnavailable` when the remainder cannot reach zero
    ///
    /// ## Example
    /// ```rust
    /// use vend_core::{Amount, CoinPool, Denomination};
    ///
    /// let mut pool = CoinPool::new();
    /// pool.deposit_many(Denomination::Two, 2);
    ///
    /// assert_eq!(pool.plan(Amount::from_cents(400)).unwrap().coins().len(), 2);
    /// assert!(pool.plan(Amount::from_cents(300)).is_err());
    /// assert!(pool.plan(Amount::zero()).unwrap().is_empty());
    /// ```
    pub fn plan(&self, amount: Amount) -> CoreResult<ChangePlan> {
        if amount.is_negative() {
            return Err(CoreError::NegativeAmount(amount));
        }

        let mut remaining = amount.cents();
        let mut coins = Vec::new();

        for denomination in Denomination::DESCENDING {
            let wanted = remaining / denomination.cents();
            let take = wanted.min(i64::from(self.count(denomination)));
            if take == 0 {
                continue;
            }
            remaining -= take * denomination.cents();
            coins.extend(std::iter::repeat(Money::of(denomination)).take(take as usize));
        }

        if remaining != 0 {
            return Err(CoreError::ExactChangeUnavailable {
                amount,
                shortfall: Amount::from_cents(remaining),
            });
        }

        Ok(ChangePlan { coins })
    }

    /// Removes the plan's coins from the pool.
    ///
    /// All counts are checked before any is decremented, so a plan made
    /// against an older state of the pool fails without partial removal.
    pub fn commit(&mut self, plan: &ChangePlan) -> CoreResult<()> {
        let needed = plan.counts();

        let missing: Amount = needed
            .iter()
            .map(|(denomination, count)| {
                let short = count.saturating_sub(self.count(*denomination));
                denomination.amount() * short
            })
            .sum();

        if missing.is_positive() {
            return Err(CoreError::ExactChangeUnavailable {
                amount: plan.total(),
                shortfall: missing,
            });
        }

        for (denomination, count) in needed {
            if let Some(slot) = self.counts.get_mut(&denomination) {
                *slot -= count;
            }
        }
        Ok(())
    }

    /// Plans and commits in one step.
    pub fn pay(&mut self, amount: Amount) -> CoreResult<Vec<Money>> {
        let plan = self.plan(amount)?;
        self.commit(&plan)?;
        Ok(plan.into_coins())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Pool from the machine's factory configuration.
    fn standard_pool() -> CoinPool {
        let mut pool = CoinPool::new();
        pool.deposit_many(Denomination::Ten, 3);
        pool.deposit_many(Denomination::Five, 4);
        pool.deposit_many(Denomination::Two, 5);
        pool.deposit_many(Denomination::One, 5);
        pool.deposit_many(Denomination::Half, 5);
        pool
    }

    #[test]
    fn test_greedy_prefers_largest_coins() {
        let pool = standard_pool();
        let plan = pool.plan(Amount::from_cents(750)).unwrap();

        assert_eq!(
            plan.coins(),
            &[
                Money::of(Denomination::Five),
                Money::of(Denomination::Two),
                Money::of(Denomination::Half),
            ]
        );
        assert_eq!(plan.total().cents(), 750);
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let pool = standard_pool();
        let before = pool.snapshot();
        pool.plan(Amount::from_cents(1850)).unwrap();
        assert_eq!(pool.snapshot(), before);
    }

    #[test]
    fn test_commit_decrements_each_used_denomination() {
        let mut pool = standard_pool();
        let coins = pool.pay(Amount::from_cents(750)).unwrap();

        assert_eq!(coins.len(), 3);
        assert_eq!(pool.count(Denomination::Ten), 3);
        assert_eq!(pool.count(Denomination::Five), 3);
        assert_eq!(pool.count(Denomination::Two), 4);
        assert_eq!(pool.count(Denomination::One), 5);
        assert_eq!(pool.count(Denomination::Half), 4);
    }

    #[test]
    fn test_infeasible_amount_leaves_pool_intact() {
        let mut pool = standard_pool();
        let before = pool.snapshot();

        let err = pool.pay(Amount::from_cents(30)).unwrap_err();
        assert_eq!(
            err,
            CoreError::ExactChangeUnavailable {
                amount: Amount::from_cents(30),
                shortfall: Amount::from_cents(30),
            }
        );
        assert_eq!(pool.snapshot(), before);
    }

    /// 13.00 from {10 × 1, 5 × 1, 2 × 0, 1 × 0, 0.5 × 0} consumes the 10,
    /// then cannot finish. Nothing may be removed.
    #[test]
    fn test_partial_progress_is_not_committed() {
        let mut pool = CoinPool::new();
        pool.deposit_many(Denomination::Ten, 1);
        pool.deposit_many(Denomination::Five, 1);
        let before = pool.snapshot();

        assert!(pool.pay(Amount::from_cents(1300)).is_err());
        assert_eq!(pool.snapshot(), before);
    }

    #[test]
    fn test_zero_amount_is_exact_and_empty() {
        let pool = CoinPool::new();
        let plan = pool.plan(Amount::zero()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let pool = standard_pool();
        assert!(matches!(
            pool.plan(Amount::from_cents(-50)),
            Err(CoreError::NegativeAmount(_))
        ));
    }

    #[test]
    fn test_stale_plan_cannot_commit() {
        let mut pool = CoinPool::new();
        pool.deposit_many(Denomination::One, 1);
        let plan = pool.plan(Amount::from_cents(100)).unwrap();

        pool.commit(&plan).unwrap();
        assert!(pool.commit(&plan).is_err());
        assert_eq!(pool.count(Denomination::One), 0);
    }

    #[test]
    fn test_totals() {
        let pool = standard_pool();
        assert_eq!(pool.coin_count(), 22);
        assert_eq!(pool.total().cents(), 3000 + 2000 + 1000 + 500 + 250);
    }

    fn arb_pool() -> impl Strategy<Value = CoinPool> {
        proptest::collection::vec(0u32..6, 5).prop_map(|counts| {
            let mut pool = CoinPool::new();
            for (denomination, count) in Denomination::ALL.into_iter().zip(counts) {
                pool.deposit_many(denomination, count);
            }
            pool
        })
    }

    proptest! {
        #[test]
        fn prop_plan_sums_to_requested_amount(pool in arb_pool(), halves in 0i64..200) {
            let amount = Amount::from_cents(halves * 50);
            let before = pool.snapshot();

            if let Ok(plan) = pool.plan(amount) {
                prop_assert_eq!(plan.total(), amount);
                for (denomination, used) in plan.counts() {
                    prop_assert!(used <= pool.count(denomination));
                }
            }
            prop_assert_eq!(pool.snapshot(), before);
        }

        #[test]
        fn prop_failed_pay_is_atomic(pool in arb_pool(), cents in 0i64..10_000) {
            let mut pool = pool;
            let before = pool.snapshot();
            let amount = Amount::from_cents(cents);

            match pool.pay(amount) {
                Ok(coins) => {
                    prop_assert_eq!(Money::total(&coins), amount);
                    prop_assert_eq!(pool.total(), Amount::from_cents(
                        before.iter().map(|(d, c)| d.cents() * i64::from(*c)).sum::<i64>() - cents,
                    ));
                }
                Err(_) => prop_assert_eq!(pool.snapshot(), before),
            }
        }
    }
}
