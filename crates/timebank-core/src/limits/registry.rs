//! Owns the limit list and keeps shield and monitoring in step with it.
//!
//! The registry is the only writer of a limit's fields. The scheduler
//! and shield controller receive copies; the background contexts read
//! the persisted list, never this struct.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Result, StoreError, ValidationError};
use crate::events::Event;
use crate::limits::{AppLimit, TargetSet};
use crate::monitor::MonitoringScheduler;
use crate::shield::ShieldController;
use crate::storage::{keys, SharedStore};

pub struct LimitRegistry {
    store: SharedStore,
    shield: ShieldController,
    scheduler: MonitoringScheduler,
    limits: Vec<AppLimit>,
    /// Version of `savedLimits` this registry last read or wrote.
    version: i64,
}

impl LimitRegistry {
    /// An empty registry. Call [`LimitRegistry::load`] to pick up
    /// persisted limits and re-enforce them.
    pub fn new(store: SharedStore, shield: ShieldController, scheduler: MonitoringScheduler) -> Self {
        Self {
            store,
            shield,
            scheduler,
            limits: Vec::new(),
            version: 0,
        }
    }

    pub fn limits(&self) -> &[AppLimit] {
        &self.limits
    }

    pub fn get(&self, id: Uuid) -> Option<&AppLimit> {
        self.limits.iter().find(|l| l.id == id)
    }

    /// Cold-start load: read the persisted list, then re-apply shields
    /// and restart monitoring for every active limit.
    ///
    /// A missing or undecodable record loads as an empty list.
    pub fn load(&mut self) -> Result<&[AppLimit]> {
        let (limits, version) = self
            .store
            .versioned_get::<Vec<AppLimit>>(keys::SAVED_LIMITS)?;
        self.limits = limits.unwrap_or_default();
        self.version = version;
        self.reapply_all()?;
        Ok(&self.limits)
    }

    /// Create a limit. New limits are active and enforced immediately:
    /// the shield is applied before the first monitoring window can
    /// fire.
    pub fn add(&mut self, targets: TargetSet, threshold_minutes: u32) -> Result<AppLimit> {
        if targets.is_empty() {
            return Err(ValidationError::EmptyTargetSet.into());
        }
        if threshold_minutes == 0 {
            return Err(ValidationError::NonPositiveThreshold {
                minutes: threshold_minutes as i64,
            }
            .into());
        }

        let limit = AppLimit::new(targets, threshold_minutes);
        self.limits.push(limit.clone());
        self.save()?;

        self.apply_shield(&limit)?;
        self.scheduler.start(&limit);
        Ok(limit)
    }

    /// Flip a limit's active flag. Unknown ids are a silent no-op.
    pub fn toggle(&mut self, id: Uuid) -> Result<Option<Event>> {
        let Some(index) = self.limits.iter().position(|l| l.id == id) else {
            return Ok(None);
        };

        self.limits[index].active = !self.limits[index].active;
        let limit = self.limits[index].clone();

        if limit.active {
            self.apply_shield(&limit)?;
            self.scheduler.start(&limit);
        } else {
            self.shield.remove();
            self.scheduler.stop(&limit);
        }

        self.save()?;
        Ok(Some(Event::LimitToggled {
            id,
            active: limit.active,
            at: Utc::now(),
        }))
    }

    /// Delete a limit. Unknown ids are a silent no-op, so deleting
    /// twice is safe.
    pub fn remove(&mut self, id: Uuid) -> Result<Option<Event>> {
        let Some(index) = self.limits.iter().position(|l| l.id == id) else {
            return Ok(None);
        };

        let limit = self.limits.remove(index);
        self.scheduler.stop(&limit);
        self.shield.remove();
        self.save()?;

        Ok(Some(Event::LimitRemoved {
            id,
            at: Utc::now(),
        }))
    }

    /// Re-apply shields and ensure monitoring for every active limit,
    /// in list order. Invoked on cold start and when a temporary unlock
    /// expires.
    pub fn reapply_all(&mut self) -> Result<usize> {
        let active: Vec<AppLimit> = self.limits.iter().filter(|l| l.active).cloned().collect();
        for limit in &active {
            self.apply_shield(limit)?;
            self.scheduler.start(limit);
        }
        Ok(active.len())
    }

    /// Empty the shield slot regardless of which limit filled it.
    pub fn clear_all_shields(&self) {
        self.shield.remove();
    }

    fn apply_shield(&self, limit: &AppLimit) -> Result<(), StoreError> {
        self.store
            .put_json(keys::ACTIVE_SHIELD_STORE_NAME, &limit.id.to_string())?;
        self.shield.apply(&limit.targets);
        Ok(())
    }

    /// Rewrite the whole list. A version conflict means another context
    /// wrote `savedLimits` since our last read; we log it and overwrite.
    /// Last writer still wins, but the lost update is observable.
    fn save(&mut self) -> Result<(), StoreError> {
        match self
            .store
            .compare_and_swap(keys::SAVED_LIMITS, self.version, &self.limits)
        {
            Ok(version) => {
                self.version = version;
                Ok(())
            }
            Err(StoreError::Conflict { .. }) => {
                tracing::warn!("savedLimits changed under us; overwriting");
                self.store.put_json(keys::SAVED_LIMITS, &self.limits)?;
                let (_, version) = self
                    .store
                    .versioned_get::<Vec<AppLimit>>(keys::SAVED_LIMITS)?;
                self.version = version;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, SchedulingError};
    use crate::monitor::{DailyWindow, ThresholdEvent, UsageAccounting};
    use crate::shield::InProcessShield;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeAccounting {
        registered: Mutex<HashMap<String, ThresholdEvent>>,
    }

    impl FakeAccounting {
        fn is_registered(&self, id: Uuid) -> bool {
            self.registered.lock().unwrap().contains_key(&id.to_string())
        }
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

    struct Rig {
        registry: LimitRegistry,
        shield: ShieldController,
        service: Arc<FakeAccounting>,
    }

    fn rig() -> Rig {
        rig_at(None)
    }

    fn rig_at(path: Option<&std::path::Path>) -> Rig {
        let store = match path {
            Some(p) => SharedStore::open_at(p).unwrap(),
            None => SharedStore::open_memory().unwrap(),
        };
        let shield = ShieldController::new(InProcessShield::new());
        let service = Arc::new(FakeAccounting::default());
        let scheduler = MonitoringScheduler::new(service.clone(), DailyWindow::default());
        Rig {
            registry: LimitRegistry::new(store, shield.clone(), scheduler),
            shield,
            service,
        }
    }

    fn targets() -> TargetSet {
        TargetSet::applications(["app.one"])
    }

    #[test]
    fn add_rejects_empty_targets() {
        let mut rig = rig();
        let err = rig.registry.add(TargetSet::default(), 30).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::EmptyTargetSet)
        ));
        assert!(rig.registry.limits().is_empty());
    }

    #[test]
    fn add_rejects_zero_threshold() {
        let mut rig = rig();
        let err = rig.registry.add(targets(), 0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::NonPositiveThreshold { .. })
        ));
    }

    #[test]
    fn add_enforces_immediately() {
        let mut rig = rig();
        let limit = rig.registry.add(targets(), 30).unwrap();

        // Active, shielded, monitored, persisted.
        assert!(limit.active);
        assert_eq!(rig.shield.blocked().applications, vec!["app.one"]);
        assert!(rig.service.is_registered(limit.id));
        let saved: Vec<AppLimit> = rig
            .registry
            .store
            .get_json(keys::SAVED_LIMITS)
            .unwrap()
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, limit.id);
    }

    #[test]
    fn active_iff_registered_and_shielded() {
        let mut rig = rig();
        let limit = rig.registry.add(targets(), 30).unwrap();
        assert!(rig.service.is_registered(limit.id));
        assert_eq!(rig.shield.blocked(), limit.targets);

        rig.registry.toggle(limit.id).unwrap();
        assert!(!rig.registry.get(limit.id).unwrap().active);
        assert!(!rig.service.is_registered(limit.id));
        assert!(rig.shield.blocked().is_empty());
    }

    #[test]
    fn toggle_unknown_is_silent_noop() {
        let mut rig = rig();
        assert!(rig.registry.toggle(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn toggle_twice_is_identity() {
        let mut rig = rig();
        let limit = rig.registry.add(targets(), 30).unwrap();

        rig.registry.toggle(limit.id).unwrap();
        rig.registry.toggle(limit.id).unwrap();

        let after = rig.registry.get(limit.id).unwrap();
        assert!(after.active);
        assert_eq!(after.targets, limit.targets);
        assert_eq!(after.threshold_minutes, limit.threshold_minutes);
        assert!(rig.service.is_registered(limit.id));
        assert_eq!(rig.shield.blocked(), limit.targets);
    }

    #[test]
    fn remove_tears_down_and_is_idempotent() {
        let mut rig = rig();
        let limit = rig.registry.add(targets(), 30).unwrap();

        let first = rig.registry.remove(limit.id).unwrap();
        assert!(first.is_some());
        assert!(rig.registry.limits().is_empty());
        assert!(!rig.service.is_registered(limit.id));
        assert!(rig.shield.blocked().is_empty());

        let raw_after_first = rig.registry.store.get_raw(keys::SAVED_LIMITS).unwrap();
        let second = rig.registry.remove(limit.id).unwrap();
        assert!(second.is_none());
        assert_eq!(
            rig.registry.store.get_raw(keys::SAVED_LIMITS).unwrap(),
            raw_after_first
        );
    }

    #[test]
    fn corrupted_saved_limits_loads_empty() {
        let mut rig = rig();
        rig.registry
            .store
            .put_json(keys::SAVED_LIMITS, &"definitely not a limit list")
            .unwrap();
        let limits = rig.registry.load().unwrap();
        assert!(limits.is_empty());
    }

    #[test]
    fn cold_start_reapplies_active_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timebank.db");

        let (active_id, inactive_id) = {
            let mut rig = rig_at(Some(path.as_path()));
            let active = rig.registry.add(targets(), 30).unwrap();
            let inactive = rig
                .registry
                .add(TargetSet::applications(["app.two"]), 45)
                .unwrap();
            rig.registry.toggle(inactive.id).unwrap();
            (active.id, inactive.id)
        };

        // A fresh process loads and re-enforces only the active limit.
        let mut rig = rig_at(Some(path.as_path()));
        rig.registry.load().unwrap();

        assert_eq!(rig.registry.limits().len(), 2);
        assert!(rig.service.is_registered(active_id));
        assert!(!rig.service.is_registered(inactive_id));
        assert_eq!(rig.shield.blocked().applications, vec!["app.one"]);
    }

    #[test]
    fn reapply_all_counts_active_only() {
        let mut rig = rig();
        let a = rig.registry.add(targets(), 30).unwrap();
        rig.registry
            .add(TargetSet::applications(["app.two"]), 45)
            .unwrap();
        rig.registry.toggle(a.id).unwrap();

        assert_eq!(rig.registry.reapply_all().unwrap(), 1);
    }

    #[test]
    fn clear_all_shields_empties_the_slot() {
        let mut rig = rig();
        rig.registry.add(targets(), 30).unwrap();
        assert!(!rig.shield.blocked().is_empty());
        rig.registry.clear_all_shields();
        assert!(rig.shield.blocked().is_empty());
    }

    #[test]
    fn concurrent_writer_is_overwritten_with_warning() {
        let mut rig = rig();
        let limit = rig.registry.add(targets(), 30).unwrap();

        // Another context rewrites the list behind our back.
        rig.registry
            .store
            .put_json(keys::SAVED_LIMITS, &Vec::<AppLimit>::new())
            .unwrap();

        // Our next mutation still lands (last writer wins).
        rig.registry.toggle(limit.id).unwrap();
        let saved: Vec<AppLimit> = rig
            .registry
            .store
            .get_json(keys::SAVED_LIMITS)
            .unwrap()
            .unwrap();
        assert_eq!(saved.len(), 1);
        assert!(!saved[0].active);
    }
}
