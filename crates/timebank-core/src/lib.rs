//! # Timebank Core Library
//!
//! Core business logic for Timebank: daily time budgets on monitored
//! targets, a shield that blocks them once usage crosses the budget,
//! and a wallet the user spends to temporarily lift the block, with the
//! spent money allocated across investment buckets.
//!
//! ## Architecture
//!
//! Three independent execution contexts converge over shared persisted
//! state, with no central coordinator:
//!
//! - the foreground app ([`LimitRegistry`], [`Wallet`],
//!   [`UnlockCoordinator`]) mutates limits and the ledger;
//! - the background monitor ([`ActivityWatcher`]) is spawned by the OS
//!   per accounting-service callback and works from a fresh read of the
//!   persisted limits;
//! - the block-screen handler ([`ShieldController::handle_action`])
//!   answers button presses and must respond before teardown.
//!
//! The shared state lives in [`SharedStore`] (a versioned key-value
//! store every context opens its own handle to) and in the singleton
//! shield resource (a [`ShieldResource`] handle injected into every
//! component that touches it).
//!
//! ## Key Components
//!
//! - [`LimitRegistry`]: owns the limit set, keeps shield and monitoring
//!   consistent with it
//! - [`MonitoringScheduler`]: maps active limits to accounting-service
//!   registrations
//! - [`ShieldController`]: transitions on the single blocked-target slot
//! - [`Wallet`]: balance, transactions, proportional investment splits
//! - [`UnlockCoordinator`]: paid unlocks and the delayed re-block

pub mod error;
pub mod events;
#[cfg(test)]
mod lifecycle_tests;
pub mod limits;
pub mod monitor;
pub mod notify;
pub mod shield;
pub mod storage;
pub mod unlock;
pub mod wallet;

pub use error::{CoreError, SchedulingError, StoreError, ValidationError};
pub use events::{Event, ShieldClearReason};
pub use limits::{AppLimit, LimitRegistry, TargetSet};
pub use monitor::{ActivityEvent, ActivityWatcher, DailyWindow, MonitoringScheduler, UsageAccounting};
pub use notify::{WakeupDelivery, WakeupRequest};
pub use shield::{InProcessShield, ShieldButton, ShieldController, ShieldResource, ShieldVerdict};
pub use storage::{Config, SharedStore};
pub use unlock::{ReblockScheduler, ReblockToken, UnlockCoordinator, UnlockReceipt};
pub use wallet::{AllocationSettings, InvestmentAllocation, Transaction, TransactionKind, UnlockOption, Wallet};
