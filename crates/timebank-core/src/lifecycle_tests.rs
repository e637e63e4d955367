//! End-to-end lifecycle across the three execution contexts.
//!
//! Each context opens its own store handle against the same file and
//! shares only the persisted rows and the singleton shield resource,
//! the way the real host processes do.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::SchedulingError;
use crate::events::Event;
use crate::limits::{LimitRegistry, TargetSet};
use crate::monitor::{
    ActivityEvent, ActivityWatcher, DailyWindow, MonitoringScheduler, ThresholdEvent,
    UsageAccounting,
};
use crate::notify::{WakeupDelivery, WakeupRequest};
use crate::shield::{InProcessShield, ShieldController, ShieldResource};
use crate::storage::SharedStore;
use crate::unlock::{ReblockScheduler, UnlockCoordinator};
use crate::wallet::{UnlockOption, Wallet};

#[derive(Default)]
struct FakeAccounting {
    registered: Mutex<HashMap<String, ThresholdEvent>>,
}

impl UsageAccounting for FakeAccounting {
    fn start_monitoring(
        &self,
        activity_id: &str,
        _window: &DailyWindow,
        events: &HashMap<String, ThresholdEvent>,
    ) -> Result<(), SchedulingError> {
        let event = events.get(activity_id).cloned().unwrap();
        self.registered
            .lock()
            .unwrap()
            .insert(activity_id.to_string(), event);
        Ok(())
    }

    fn stop_monitoring(&self, activity_ids: &[String]) {
        let mut registered = self.registered.lock().unwrap();
        for id in activity_ids {
            registered.remove(id);
        }
    }
}

#[derive(Default)]
struct RecordingWakeup {
    delivered: Mutex<Vec<WakeupRequest>>,
}

impl WakeupDelivery for RecordingWakeup {
    fn deliver(&self, request: &WakeupRequest) {
        self.delivered.lock().unwrap().push(request.clone());
    }
}

#[tokio::test(start_paused = true)]
async fn threshold_to_paid_unlock_to_reblock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timebank.db");

    // The one OS shield slot, shared by every context.
    let slot = InProcessShield::new();
    let service = Arc::new(FakeAccounting::default());

    // Foreground: create the limit.
    let mut registry = LimitRegistry::new(
        SharedStore::open_at(&path).unwrap(),
        ShieldController::new(slot.clone()),
        MonitoringScheduler::new(service.clone(), DailyWindow::default()),
    );
    let limit = registry
        .add(TargetSet::applications(["app.one"]), 30)
        .unwrap();
    assert!(service
        .registered
        .lock()
        .unwrap()
        .contains_key(&limit.id.to_string()));

    // The fresh limit is enforced immediately; the interval-end cleanup
    // then clears the slot before any usage happens.
    let wakeup = Arc::new(RecordingWakeup::default());
    let watcher = ActivityWatcher::new(
        SharedStore::open_at(&path).unwrap(),
        ShieldController::new(slot.clone()),
        wakeup.clone(),
    );
    watcher
        .handle(ActivityEvent::IntervalEnd {
            activity_id: limit.id.to_string(),
        })
        .unwrap();
    assert!(slot.blocked().is_empty());

    // Background: the threshold fires. The watcher works from the
    // persisted list, not the registry's memory.
    let event = watcher
        .handle(ActivityEvent::ThresholdReached {
            activity_id: limit.id.to_string(),
        })
        .unwrap();
    assert!(matches!(event, Some(Event::ThresholdReached { .. })));
    assert_eq!(slot.blocked().applications, vec!["app.one"]);
    assert_eq!(wakeup.delivered.lock().unwrap().len(), 1);

    // Foreground, on resume: the pending flag is visible, the user pays.
    let (reblock, mut rx) = ReblockScheduler::new();
    let coordinator = UnlockCoordinator::new(
        SharedStore::open_at(&path).unwrap(),
        ShieldController::new(slot.clone()),
        reblock,
    );
    assert!(coordinator.has_pending_unlock());
    assert_eq!(
        coordinator.pending_unlock_type().as_deref(),
        Some("application")
    );

    let mut wallet = Wallet::load(SharedStore::open_at(&path).unwrap());
    wallet.deposit(5.0).unwrap();
    let allocations = HashMap::from([("A".to_string(), 60.0), ("B".to_string(), 40.0)]);
    let receipt = coordinator
        .purchase(&mut wallet, &UnlockOption::new(15, 0.50), "App", &allocations)
        .unwrap()
        .expect("funds were sufficient");

    assert!(slot.blocked().is_empty());
    assert!(!coordinator.has_pending_unlock());
    assert!((wallet.balance() - 4.50).abs() < 1e-9);

    // The bought time runs out; the re-block signal routes back into
    // the registry and enforcement returns.
    tokio::time::advance(Duration::from_secs(15 * 60 + 1)).await;
    assert_eq!(rx.recv().await, Some(receipt.token));
    registry.reapply_all().unwrap();
    assert_eq!(slot.blocked().applications, vec!["app.one"]);
}
