//! The wallet ledger.
//!
//! Balance, transaction history (newest first) and the per-bucket
//! investment accumulators. `unlock` is the one atomic unit combining
//! the debit with the allocation credit: either every field mutates and
//! persists, or none does.
//!
//! Money is ordinary f64 arithmetic throughout. Splits are computed as
//! `price * pct / 100.0` per bucket; tests pin the 1e-9 tolerance on
//! the sum.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::{Result, StoreError, ValidationError};
use crate::storage::{keys, SharedStore};
use crate::wallet::{Transaction, TransactionKind, UnlockOption};

/// Minimum balance below which the app steers the user to deposit.
const DEFAULT_MINIMUM_BALANCE: f64 = 1.0;

fn default_buckets() -> HashMap<String, f64> {
    HashMap::from([
        ("Bitcoin".to_string(), 0.0),
        ("Solana".to_string(), 0.0),
        ("S&P 500".to_string(), 0.0),
        ("T-Bills".to_string(), 0.0),
    ])
}

pub struct Wallet {
    store: SharedStore,
    balance: f64,
    transactions: Vec<Transaction>,
    total_invested: f64,
    investments_by_kind: HashMap<String, f64>,
    minimum_balance: f64,
}

impl Wallet {
    /// Load wallet state from the shared store. Missing or undecodable
    /// records read as zero balance, empty history and default buckets.
    pub fn load(store: SharedStore) -> Self {
        let balance = store.get_f64(keys::WALLET_BALANCE);
        let total_invested = store.get_f64(keys::TOTAL_INVESTED);
        let transactions = store
            .get_json::<Vec<Transaction>>(keys::WALLET_TRANSACTIONS)
            .ok()
            .flatten()
            .unwrap_or_default();
        let investments_by_kind = store
            .get_json::<HashMap<String, f64>>(keys::WALLET_INVESTMENTS)
            .ok()
            .flatten()
            .unwrap_or_else(default_buckets);

        Self {
            store,
            balance,
            transactions,
            total_invested,
            investments_by_kind,
            minimum_balance: DEFAULT_MINIMUM_BALANCE,
        }
    }

    pub fn with_minimum_balance(mut self, minimum: f64) -> Self {
        self.minimum_balance = minimum;
        self
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn total_invested(&self) -> f64 {
        self.total_invested
    }

    /// Newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn investments_by_kind(&self) -> &HashMap<String, f64> {
        &self.investments_by_kind
    }

    /// Onboarding gate, not a hard invariant.
    pub fn needs_deposit(&self) -> bool {
        self.balance < self.minimum_balance
    }

    /// Add credit. Rejects non-positive amounts before any mutation.
    pub fn deposit(&mut self, amount: f64) -> Result<Transaction> {
        if amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount { amount }.into());
        }

        self.balance += amount;
        let transaction = Transaction::deposit(amount, "Added credit");
        self.transactions.insert(0, transaction.clone());
        self.save()?;
        Ok(transaction)
    }

    /// Spend balance to lift a block.
    ///
    /// Returns `Ok(false)` without touching any state when the balance
    /// cannot cover the price. On success the debit, the
    /// `total_invested` credit, the per-bucket split and the breakdown
    /// transaction land together.
    pub fn unlock(
        &mut self,
        option: &UnlockOption,
        target_label: &str,
        allocations: &HashMap<String, f64>,
    ) -> Result<bool> {
        if self.balance < option.price {
            return Ok(false);
        }

        self.balance -= option.price;
        self.total_invested += option.price;

        let mut breakdown = HashMap::new();
        for (bucket, percentage) in allocations {
            let amount = option.price * (percentage / 100.0);
            *self
                .investments_by_kind
                .entry(bucket.clone())
                .or_insert(0.0) += amount;
            breakdown.insert(bucket.clone(), amount);
        }

        let transaction = Transaction::unlock(
            option.price,
            format!("Unlocked {target_label} for {}", option.duration_text()),
            breakdown,
        );
        self.transactions.insert(0, transaction);
        self.save()?;
        Ok(true)
    }

    /// Sum of unlock spending since `cutoff`.
    pub fn invested_since(&self, cutoff: DateTime<Utc>) -> f64 {
        self.transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Unlock && t.date >= cutoff)
            .map(|t| t.amount)
            .sum()
    }

    pub fn this_week_invested(&self) -> f64 {
        self.invested_since(Utc::now() - Duration::days(7))
    }

    pub fn this_month_invested(&self) -> f64 {
        self.invested_since(Utc::now() - Duration::days(30))
    }

    /// Zero everything and restore the default buckets.
    pub fn reset(&mut self) -> Result<()> {
        self.balance = 0.0;
        self.total_invested = 0.0;
        self.transactions.clear();
        self.investments_by_kind = default_buckets();
        self.save()?;
        Ok(())
    }

    /// Re-read persisted state. The foreground calls this on resume in
    /// case the block-screen context spent money while we were away.
    pub fn reload(&mut self) {
        self.balance = self.store.get_f64(keys::WALLET_BALANCE);
        self.total_invested = self.store.get_f64(keys::TOTAL_INVESTED);
        self.transactions = self
            .store
            .get_json::<Vec<Transaction>>(keys::WALLET_TRANSACTIONS)
            .ok()
            .flatten()
            .unwrap_or_default();
        self.investments_by_kind = self
            .store
            .get_json::<HashMap<String, f64>>(keys::WALLET_INVESTMENTS)
            .ok()
            .flatten()
            .unwrap_or_else(default_buckets);
    }

    fn save(&self) -> Result<(), StoreError> {
        self.store.put_json(keys::WALLET_BALANCE, &self.balance)?;
        self.store
            .put_json(keys::TOTAL_INVESTED, &self.total_invested)?;
        self.store
            .put_json(keys::WALLET_TRANSACTIONS, &self.transactions)?;
        self.store
            .put_json(keys::WALLET_INVESTMENTS, &self.investments_by_kind)?;
        Ok(())
    }
}
