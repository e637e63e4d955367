//! Wallet, transactions and investment allocations.

mod allocations;
mod ledger;
mod model;

pub use allocations::{AllocationSettings, InvestmentAllocation};
pub use ledger::Wallet;
pub use model::{Transaction, TransactionKind, UnlockOption};
