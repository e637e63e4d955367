//! Record names in the shared store.
//!
//! These are wire names: the monitor and block-screen contexts read the
//! same rows, so renaming one is a schema migration, not a refactor.

/// Ordered list of saved limits (JSON array of `AppLimit`).
pub const SAVED_LIMITS: &str = "savedLimits";

/// Wallet balance (JSON number).
pub const WALLET_BALANCE: &str = "walletBalance";

/// Lifetime amount routed into investment buckets (JSON number).
pub const TOTAL_INVESTED: &str = "totalInvested";

/// Transaction history, newest first (JSON array of `Transaction`).
pub const WALLET_TRANSACTIONS: &str = "walletTransactions";

/// Accumulated amount per investment bucket (JSON object).
pub const WALLET_INVESTMENTS: &str = "walletInvestments";

/// Ordered allocation config (JSON array of `InvestmentAllocation`).
pub const INVESTMENT_ALLOCATIONS: &str = "investmentAllocations";

/// Id of the limit whose shield was applied last. Diagnostic only.
pub const ACTIVE_SHIELD_STORE_NAME: &str = "activeShieldStoreName";

/// Flag set by the background monitor, consumed by the foreground
/// context on next resume.
pub const PENDING_UNLOCK: &str = "pendingUnlock";

/// What kind of target tripped the pending unlock.
pub const PENDING_UNLOCK_TYPE: &str = "pendingUnlockType";
