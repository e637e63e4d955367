//! The background execution context.
//!
//! The OS spawns this context per accounting-service callback, with no
//! ordering guarantee relative to the foreground app. It shares nothing
//! in memory with the registry: every decision starts from a fresh read
//! of the persisted limits.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::events::{Event, ShieldClearReason};
use crate::limits::AppLimit;
use crate::notify::{WakeupDelivery, WakeupRequest};
use crate::shield::{ShieldController, TargetKind};
use crate::storage::{keys, SharedStore};

/// Callback delivered by the usage accounting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    /// Usage of the event's targets reached the threshold.
    ThresholdReached { activity_id: String },
    /// The daily window opened.
    IntervalStart { activity_id: String },
    /// The daily window closed.
    IntervalEnd { activity_id: String },
    /// Advance warning before a threshold. Ignored.
    ThresholdWarning { activity_id: String },
}

/// Handles accounting-service callbacks against persisted state.
pub struct ActivityWatcher {
    store: SharedStore,
    shield: ShieldController,
    wakeup: Arc<dyn WakeupDelivery>,
}

impl ActivityWatcher {
    pub fn new(
        store: SharedStore,
        shield: ShieldController,
        wakeup: Arc<dyn WakeupDelivery>,
    ) -> Self {
        Self {
            store,
            shield,
            wakeup,
        }
    }

    /// Process one callback. Returns the resulting event, or `None`
    /// when the callback is a no-op (unknown limit, ignored variant).
    pub fn handle(&self, event: ActivityEvent) -> Result<Option<Event>, StoreError> {
        match event {
            ActivityEvent::ThresholdReached { activity_id } => {
                self.on_threshold_reached(&activity_id)
            }
            ActivityEvent::IntervalEnd { .. } => {
                self.shield.cleanup_on_interval_end();
                Ok(Some(Event::ShieldCleared {
                    reason: ShieldClearReason::IntervalEnd,
                    at: Utc::now(),
                }))
            }
            ActivityEvent::IntervalStart { .. } | ActivityEvent::ThresholdWarning { .. } => {
                Ok(None)
            }
        }
    }

    fn on_threshold_reached(&self, activity_id: &str) -> Result<Option<Event>, StoreError> {
        // The limit may have been deleted since registration, and the
        // record may fail to decode; both read as "not found" and the
        // callback is a no-op.
        let Some(limit) = self.load_limit(activity_id)? else {
            return Ok(None);
        };

        self.store
            .put_json(keys::ACTIVE_SHIELD_STORE_NAME, &activity_id)?;
        self.shield.apply(&limit.targets);

        self.store.put_json(keys::PENDING_UNLOCK, &true)?;
        self.store.put_json(
            keys::PENDING_UNLOCK_TYPE,
            &TargetKind::of(&limit.targets).as_str(),
        )?;
        self.wakeup.deliver(&WakeupRequest::for_limit(limit.id));

        Ok(Some(Event::ThresholdReached {
            limit_id: limit.id,
            at: Utc::now(),
        }))
    }

    fn load_limit(&self, activity_id: &str) -> Result<Option<AppLimit>, StoreError> {
        let Ok(wanted) = Uuid::parse_str(activity_id) else {
            return Ok(None);
        };
        let limits: Vec<AppLimit> = self
            .store
            .get_json(keys::SAVED_LIMITS)?
            .unwrap_or_default();
        Ok(limits.into_iter().find(|l| l.id == wanted))
    }
}
