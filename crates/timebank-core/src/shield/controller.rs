//! Shield state transitions.
//!
//! Per target set the machine is:
//!
//! ```text
//! Unshielded -> (threshold fired) -> Shielded
//! Shielded   -> (unlock paid | interval end | limit off/removed) -> Unshielded
//! ```
//!
//! There are no intermediate states. `apply` replaces the blocked set
//! wholesale -- two simultaneously tripped limits leave only the most
//! recent apply enforced.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::resource::ShieldResource;
use crate::limits::TargetSet;

/// Buttons on the block screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShieldButton {
    /// "Unlock"
    Primary,
    /// "Close"
    Secondary,
}

/// What the block-screen context reports back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShieldVerdict {
    /// Shield was cleared; the blocked app may resume.
    DeferAndUnblock,
    /// Shield stays; the blocked app is closed.
    CloseAndKeepBlocked,
}

/// Owns transitions on the shared shield slot.
///
/// Cheap to clone; clones share the same underlying resource handle.
#[derive(Clone)]
pub struct ShieldController {
    resource: Arc<dyn ShieldResource>,
}

impl ShieldController {
    pub fn new(resource: Arc<dyn ShieldResource>) -> Self {
        Self { resource }
    }

    /// The shared handle, for components that need their own controller.
    pub fn resource(&self) -> Arc<dyn ShieldResource> {
        Arc::clone(&self.resource)
    }

    /// Block exactly `targets`. Last writer wins.
    pub fn apply(&self, targets: &TargetSet) {
        self.resource.set_blocked(targets);
    }

    /// Clear the blocked set, unconditionally.
    pub fn remove(&self) {
        self.resource.clear();
    }

    /// End-of-window cleanup. Clears whatever is blocked, regardless of
    /// which limit applied it.
    pub fn cleanup_on_interval_end(&self) {
        self.resource.clear();
    }

    /// Currently blocked set.
    pub fn blocked(&self) -> TargetSet {
        self.resource.blocked()
    }

    /// Block-screen button handler. Runs in a short-lived context that
    /// must report its verdict through `respond` before teardown.
    ///
    /// Primary clears the shield through the same shared handle that
    /// applied it and lets the app resume; secondary leaves the shield
    /// in place.
    pub fn handle_action<F>(&self, button: ShieldButton, respond: F)
    where
        F: FnOnce(ShieldVerdict),
    {
        match button {
            ShieldButton::Primary => {
                self.resource.clear();
                respond(ShieldVerdict::DeferAndUnblock);
            }
            ShieldButton::Secondary => {
                respond(ShieldVerdict::CloseAndKeepBlocked);
            }
        }
    }
}
