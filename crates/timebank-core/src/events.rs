use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why the shield was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShieldClearReason {
    /// A paid unlock lifted the block.
    Unlock,
    /// The monitoring window ended.
    IntervalEnd,
    /// The limit was toggled off.
    Disabled,
    /// The limit was deleted.
    Removed,
}

/// State changes surfaced to the UI layer.
/// The CLI prints these; a GUI would subscribe to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    LimitToggled {
        id: Uuid,
        active: bool,
        at: DateTime<Utc>,
    },
    LimitRemoved {
        id: Uuid,
        at: DateTime<Utc>,
    },
    /// A limit's usage crossed its threshold; the shield is up.
    ThresholdReached {
        limit_id: Uuid,
        at: DateTime<Utc>,
    },
    ShieldCleared {
        reason: ShieldClearReason,
        at: DateTime<Utc>,
    },
    /// Balance was spent to lift the block for a priced duration.
    UnlockPurchased {
        duration_minutes: u32,
        price: f64,
        at: DateTime<Utc>,
    },
    /// The purchased duration elapsed; active limits re-enforce.
    ReblockFired {
        at: DateTime<Utc>,
    },
}
