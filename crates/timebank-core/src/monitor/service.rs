//! Registration with the external usage accounting service.
//!
//! The service measures usage out of process and calls back into the
//! background context when a threshold or window boundary is crossed.
//! We only subscribe and unsubscribe here.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;
use crate::limits::{AppLimit, TargetSet};

/// A recurring daily observation window, `(hour, minute)` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWindow {
    pub start: (u8, u8),
    pub end: (u8, u8),
    pub repeats: bool,
}

impl Default for DailyWindow {
    fn default() -> Self {
        Self {
            start: (0, 0),
            end: (23, 59),
            repeats: true,
        }
    }
}

/// Fires once usage of `targets` within the window reaches the
/// threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdEvent {
    pub targets: TargetSet,
    pub threshold_minutes: u32,
}

/// The external accounting service's subscribe/unsubscribe API.
///
/// Callbacks arrive asynchronously in the background context as
/// [`super::ActivityEvent`]s; they are not part of this trait.
pub trait UsageAccounting: Send + Sync {
    /// Register a window and its threshold events under `activity_id`.
    /// Registering an already-registered id replaces the prior
    /// registration.
    fn start_monitoring(
        &self,
        activity_id: &str,
        window: &DailyWindow,
        events: &HashMap<String, ThresholdEvent>,
    ) -> Result<(), SchedulingError>;

    /// Unregister. Unknown ids are ignored.
    fn stop_monitoring(&self, activity_ids: &[String]);
}

/// Maps active limits onto accounting-service registrations.
///
/// One registration per limit, keyed by the limit id, so starting an
/// already-started limit replaces its window rather than stacking a
/// second one.
#[derive(Clone)]
pub struct MonitoringScheduler {
    service: Arc<dyn UsageAccounting>,
    window: DailyWindow,
}

impl MonitoringScheduler {
    pub fn new(service: Arc<dyn UsageAccounting>, window: DailyWindow) -> Self {
        Self { service, window }
    }

    /// Register the limit's window and threshold event.
    ///
    /// A registration failure is logged and swallowed: the limit stays
    /// active with degraded enforcement. One attempt, no retry.
    pub fn start(&self, limit: &AppLimit) {
        let activity_id = limit.id.to_string();
        let events = HashMap::from([(
            activity_id.clone(),
            ThresholdEvent {
                targets: limit.targets.clone(),
                threshold_minutes: limit.threshold_minutes,
            },
        )]);

        if let Err(err) = self
            .service
            .start_monitoring(&activity_id, &self.window, &events)
        {
            tracing::warn!(%activity_id, %err, "monitoring registration failed");
        }
    }

    /// Unregister the limit. No-op if it was never registered.
    pub fn stop(&self, limit: &AppLimit) {
        self.service.stop_monitoring(&[limit.id.to_string()]);
    }
}
