//! Host stubs and wiring shared by every subcommand.
//!
//! A desktop host has no OS shield slot and no usage accounting
//! service, so the CLI substitutes store-backed stand-ins: the blocked
//! set and the registered windows are persisted under CLI-only records,
//! which lets separate invocations observe each other the same way the
//! real extensions would. These records are host state, not part of the
//! shared schema the core owns.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use timebank_core::{
    Config, DailyWindow, LimitRegistry, MonitoringScheduler, SchedulingError, SharedStore,
    ShieldController, ShieldResource, TargetSet, UsageAccounting, WakeupDelivery, WakeupRequest,
};
use timebank_core::monitor::ThresholdEvent;

/// Blocked target set, CLI host record.
pub const SHIELD_STATE_KEY: &str = "cliShieldState";
/// Registered monitoring windows, CLI host record.
pub const MONITOR_STATE_KEY: &str = "cliMonitoringWindows";

pub fn open_store() -> Result<SharedStore, Box<dyn Error>> {
    Ok(SharedStore::open()?)
}

/// Shield slot persisted in the store so `status` in a later process
/// sees what `simulate threshold` blocked in an earlier one.
pub struct StoreShield {
    store: SharedStore,
}

impl ShieldResource for StoreShield {
    fn set_blocked(&self, targets: &TargetSet) {
        let _ = self.store.put_json(SHIELD_STATE_KEY, targets);
    }

    fn clear(&self) {
        let _ = self.store.put_json(SHIELD_STATE_KEY, &TargetSet::default());
    }

    fn blocked(&self) -> TargetSet {
        self.store
            .get_json(SHIELD_STATE_KEY)
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

/// Accounting-service stand-in that records registrations.
pub struct StoreAccounting {
    store: SharedStore,
}

impl StoreAccounting {
    pub fn registered(&self) -> HashMap<String, ThresholdEvent> {
        self.store
            .get_json(MONITOR_STATE_KEY)
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

impl UsageAccounting for StoreAccounting {
    fn start_monitoring(
        &self,
        activity_id: &str,
        _window: &DailyWindow,
        events: &HashMap<String, ThresholdEvent>,
    ) -> Result<(), SchedulingError> {
        let mut registered = self.registered();
        if let Some(event) = events.get(activity_id) {
            registered.insert(activity_id.to_string(), event.clone());
        }
        self.store
            .put_json(MONITOR_STATE_KEY, &registered)
            .map_err(|e| SchedulingError::Unavailable(e.to_string()))
    }

    fn stop_monitoring(&self, activity_ids: &[String]) {
        let mut registered = self.registered();
        for id in activity_ids {
            registered.remove(id);
        }
        let _ = self.store.put_json(MONITOR_STATE_KEY, &registered);
    }
}

/// Prints the wake-up the real host would deliver as a notification.
pub struct PrintWakeup;

impl WakeupDelivery for PrintWakeup {
    fn deliver(&self, request: &WakeupRequest) {
        println!(
            "wake-up: limit {} tripped, open {}",
            request.limit_id, request.deep_link
        );
    }
}

pub fn shield_controller() -> Result<ShieldController, Box<dyn Error>> {
    let store = open_store()?;
    Ok(ShieldController::new(Arc::new(StoreShield { store })))
}

pub fn accounting() -> Result<Arc<StoreAccounting>, Box<dyn Error>> {
    let store = open_store()?;
    Ok(Arc::new(StoreAccounting { store }))
}

pub fn scheduler(config: &Config) -> Result<MonitoringScheduler, Box<dyn Error>> {
    Ok(MonitoringScheduler::new(
        accounting()?,
        config.monitoring_window(),
    ))
}

/// Registry wired to the host stubs, with persisted limits loaded and
/// re-enforced.
pub fn registry() -> Result<LimitRegistry, Box<dyn Error>> {
    let config = Config::load_or_default();
    let mut registry = LimitRegistry::new(open_store()?, shield_controller()?, scheduler(&config)?);
    registry.load()?;
    Ok(registry)
}
