//! Block-screen content.
//!
//! The shield renderer runs out of process and only asks us what to
//! show. Building the copy is a pure function of the tripped target
//! kind and the current wallet balance, so the renderer context can
//! call [`ShieldScreen::from_store`] with nothing but a store handle.

use serde::{Deserialize, Serialize};

use crate::limits::TargetSet;
use crate::storage::{keys, SharedStore};

/// Which kind of target tripped the shield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Application,
    Category,
    WebDomain,
}

impl TargetKind {
    /// Wire name stored under `pendingUnlockType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Application => "application",
            TargetKind::Category => "category",
            TargetKind::WebDomain => "webDomain",
        }
    }

    /// The dominant kind of a target set, applications first.
    pub fn of(targets: &TargetSet) -> TargetKind {
        if !targets.applications.is_empty() {
            TargetKind::Application
        } else if !targets.categories.is_empty() {
            TargetKind::Category
        } else {
            TargetKind::WebDomain
        }
    }
}

/// Everything the renderer needs to draw the block screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldScreen {
    pub title: String,
    pub subtitle: String,
    pub primary_button: String,
    pub secondary_button: String,
}

impl ShieldScreen {
    /// Build the screen copy for a given balance.
    pub fn build(kind: TargetKind, balance: f64) -> Self {
        let title = match kind {
            TargetKind::Application | TargetKind::Category => "Time's up",
            TargetKind::WebDomain => "Site blocked",
        };
        Self {
            title: title.to_string(),
            subtitle: format!("Balance: ${balance:.2}\n\nTap Unlock to add time"),
            primary_button: "Unlock".to_string(),
            secondary_button: "Close".to_string(),
        }
    }

    /// Build the screen from the shared store, reading the live balance.
    pub fn from_store(kind: TargetKind, store: &SharedStore) -> Self {
        Self::build(kind, store.get_f64(keys::WALLET_BALANCE))
    }
}
