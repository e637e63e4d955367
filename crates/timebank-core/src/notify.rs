//! Wake-up delivery to the foreground context.
//!
//! When the background monitor raises a shield it also asks the host to
//! nudge the user toward the unlock flow. Delivery is fire-and-forget;
//! the durable half of the handshake is the `pendingUnlock` record the
//! foreground polls on resume.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload for the wake-up signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeupRequest {
    /// The limit whose threshold fired.
    pub limit_id: Uuid,
    /// Deep link the host should open when the user responds.
    pub deep_link: String,
}

impl WakeupRequest {
    pub fn for_limit(limit_id: Uuid) -> Self {
        Self {
            limit_id,
            deep_link: "timebank://unlock".to_string(),
        }
    }
}

/// Host capability that delivers the wake-up signal.
pub trait WakeupDelivery: Send + Sync {
    /// Fire and forget. Failures are the host's problem; the pending
    /// flag in the store is the reliable path.
    fn deliver(&self, request: &WakeupRequest);
}
