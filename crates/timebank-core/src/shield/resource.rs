use std::sync::{Arc, Mutex};

use crate::limits::TargetSet;

/// The OS-managed blocking slot.
///
/// There is exactly one slot per device; whoever writes it last wins.
/// Every component that touches the shield must be handed the *same*
/// handle -- clearing through a second instance of the underlying
/// resource would silently do nothing on the real host, so construction
/// happens once and the handle is cloned from there.
pub trait ShieldResource: Send + Sync {
    /// Replace the blocked set wholesale.
    fn set_blocked(&self, targets: &TargetSet);

    /// Empty the blocked set.
    fn clear(&self);

    /// Current blocked set, for inspection.
    fn blocked(&self) -> TargetSet;
}

/// Process-local shield slot.
///
/// Stands in for the OS resource in tests and on hosts without one.
#[derive(Default)]
pub struct InProcessShield {
    blocked: Mutex<TargetSet>,
}

impl InProcessShield {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl ShieldResource for InProcessShield {
    fn set_blocked(&self, targets: &TargetSet) {
        *self.blocked.lock().unwrap() = targets.clone();
    }

    fn clear(&self) {
        *self.blocked.lock().unwrap() = TargetSet::default();
    }

    fn blocked(&self) -> TargetSet {
        self.blocked.lock().unwrap().clone()
    }
}
