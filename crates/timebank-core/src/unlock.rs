//! The paid-unlock flow and the delayed re-block.
//!
//! A successful purchase clears the shield, consumes the pending-unlock
//! flag and schedules a re-block once the bought duration elapses. The
//! re-block is best effort: if the process dies before the delay runs
//! out, the next cold-start `reapply_all` restores enforcement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::{Result, StoreError};
use crate::events::Event;
use crate::shield::ShieldController;
use crate::storage::{keys, SharedStore};
use crate::wallet::{UnlockOption, Wallet};

/// Handle to one scheduled re-block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReblockToken(u64);

/// Delayed re-block tasks, keyed by token.
///
/// Requires a tokio runtime. Fired tokens arrive on the receiver
/// returned by [`ReblockScheduler::new`]; the foreground routes each
/// one to `LimitRegistry::reapply_all`.
pub struct ReblockScheduler {
    tx: mpsc::UnboundedSender<ReblockToken>,
    tasks: Arc<Mutex<HashMap<u64, AbortHandle>>>,
    next_id: AtomicU64,
}

impl ReblockScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReblockToken>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                tasks: Arc::new(Mutex::new(HashMap::new())),
                next_id: AtomicU64::new(1),
            },
            rx,
        )
    }

    /// Arrange a re-block signal after `delay`.
    pub fn schedule(&self, delay: Duration) -> ReblockToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tx = self.tx.clone();
        let tasks = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tasks.lock().unwrap().remove(&id);
            let _ = tx.send(ReblockToken(id));
        });
        self.tasks.lock().unwrap().insert(id, handle.abort_handle());
        ReblockToken(id)
    }

    /// Abort a pending re-block. Returns false if it already fired or
    /// was never scheduled.
    pub fn cancel(&self, token: ReblockToken) -> bool {
        match self.tasks.lock().unwrap().remove(&token.0) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of re-blocks still pending.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

/// A completed purchase.
#[derive(Debug, Clone)]
pub struct UnlockReceipt {
    pub token: ReblockToken,
    pub event: Event,
}

/// Foreground-side unlock flow: the pending flag raised by the monitor,
/// the purchase itself, and the re-block that follows.
pub struct UnlockCoordinator {
    store: SharedStore,
    shield: ShieldController,
    reblock: ReblockScheduler,
}

impl UnlockCoordinator {
    pub fn new(store: SharedStore, shield: ShieldController, reblock: ReblockScheduler) -> Self {
        Self {
            store,
            shield,
            reblock,
        }
    }

    /// Did the background monitor raise the unlock flow since we last
    /// looked?
    pub fn has_pending_unlock(&self) -> bool {
        self.store.get_bool(keys::PENDING_UNLOCK)
    }

    /// What kind of target tripped it, if recorded.
    pub fn pending_unlock_type(&self) -> Option<String> {
        self.store
            .get_json::<String>(keys::PENDING_UNLOCK_TYPE)
            .ok()
            .flatten()
    }

    pub fn clear_pending_unlock(&self) -> Result<(), StoreError> {
        self.store.put_json(keys::PENDING_UNLOCK, &false)?;
        self.store.delete(keys::PENDING_UNLOCK_TYPE)?;
        Ok(())
    }

    /// Lift the shield for `duration_minutes` and schedule the re-block.
    /// The shield is cleared through the same shared handle that applied
    /// it.
    pub fn perform_unlock(&self, duration_minutes: u32) -> Result<ReblockToken, StoreError> {
        self.shield.remove();
        self.clear_pending_unlock()?;
        Ok(self
            .reblock
            .schedule(Duration::from_secs(u64::from(duration_minutes) * 60)))
    }

    /// The full paid flow: debit the wallet, then lift the shield.
    ///
    /// Returns `Ok(None)` when the balance cannot cover the option --
    /// the wallet is untouched and the shield stays up.
    pub fn purchase(
        &self,
        wallet: &mut Wallet,
        option: &UnlockOption,
        target_label: &str,
        allocations: &HashMap<String, f64>,
    ) -> Result<Option<UnlockReceipt>> {
        if !wallet.unlock(option, target_label, allocations)? {
            return Ok(None);
        }

        let token = self.perform_unlock(option.duration_minutes)?;
        Ok(Some(UnlockReceipt {
            token,
            event: Event::UnlockPurchased {
                duration_minutes: option.duration_minutes,
                price: option.price,
                at: Utc::now(),
            },
        }))
    }

    /// Cancel a scheduled re-block.
    pub fn cancel_reblock(&self, token: ReblockToken) -> bool {
        self.reblock.cancel(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::TargetSet;
    use crate::shield::InProcessShield;

    fn alloc_config() -> HashMap<String, f64> {
        HashMap::from([("A".to_string(), 60.0), ("B".to_string(), 40.0)])
    }

    fn coordinator() -> (UnlockCoordinator, ShieldController, mpsc::UnboundedReceiver<ReblockToken>) {
        let store = SharedStore::open_memory().unwrap();
        let shield = ShieldController::new(InProcessShield::new());
        let (reblock, rx) = ReblockScheduler::new();
        (
            UnlockCoordinator::new(store, shield.clone(), reblock),
            shield,
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn reblock_fires_after_delay() {
        let (scheduler, mut rx) = ReblockScheduler::new();
        let token = scheduler.schedule(Duration::from_secs(900));
        assert_eq!(scheduler.pending(), 1);

        tokio::time::advance(Duration::from_secs(901)).await;

        assert_eq!(rx.recv().await, Some(token));
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_reblock_never_fires() {
        let (scheduler, mut rx) = ReblockScheduler::new();
        let token = scheduler.schedule(Duration::from_secs(900));
        assert!(scheduler.cancel(token));
        assert!(!scheduler.cancel(token));

        tokio::time::advance(Duration::from_secs(1000)).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn purchase_lifts_shield_and_schedules_reblock() {
        let (coordinator, shield, mut rx) = coordinator();
        shield.apply(&TargetSet::applications(["app.one"]));
        coordinator
            .store
            .put_json(keys::PENDING_UNLOCK, &true)
            .unwrap();
        coordinator
            .store
            .put_json(keys::PENDING_UNLOCK_TYPE, &"application")
            .unwrap();

        let mut wallet = Wallet::load(SharedStore::open_memory().unwrap());
        wallet.deposit(5.0).unwrap();

        let receipt = coordinator
            .purchase(
                &mut wallet,
                &UnlockOption::new(15, 0.50),
                "App",
                &alloc_config(),
            )
            .unwrap()
            .expect("funds were sufficient");

        assert!(shield.blocked().is_empty());
        assert!(!coordinator.has_pending_unlock());
        assert!(coordinator.pending_unlock_type().is_none());
        assert!((wallet.balance() - 4.50).abs() < 1e-9);
        assert!(matches!(
            receipt.event,
            Event::UnlockPurchased {
                duration_minutes: 15,
                ..
            }
        ));

        tokio::time::advance(Duration::from_secs(15 * 60 + 1)).await;
        assert_eq!(rx.recv().await, Some(receipt.token));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_purchase_keeps_shield_up() {
        let (coordinator, shield, mut rx) = coordinator();
        let targets = TargetSet::applications(["app.one"]);
        shield.apply(&targets);
        coordinator
            .store
            .put_json(keys::PENDING_UNLOCK, &true)
            .unwrap();

        let mut wallet = Wallet::load(SharedStore::open_memory().unwrap());
        wallet.deposit(0.10).unwrap();

        let receipt = coordinator
            .purchase(
                &mut wallet,
                &UnlockOption::new(15, 0.50),
                "App",
                &alloc_config(),
            )
            .unwrap();

        assert!(receipt.is_none());
        assert_eq!(shield.blocked(), targets);
        assert!(coordinator.has_pending_unlock());
        assert_eq!(wallet.balance(), 0.10);

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn pending_flag_roundtrip() {
        let (coordinator, _, _rx) = coordinator();
        assert!(!coordinator.has_pending_unlock());

        coordinator
            .store
            .put_json(keys::PENDING_UNLOCK, &true)
            .unwrap();
        coordinator
            .store
            .put_json(keys::PENDING_UNLOCK_TYPE, &"webDomain")
            .unwrap();
        assert!(coordinator.has_pending_unlock());
        assert_eq!(
            coordinator.pending_unlock_type().as_deref(),
            Some("webDomain")
        );

        coordinator.clear_pending_unlock().unwrap();
        assert!(!coordinator.has_pending_unlock());
        assert!(coordinator.pending_unlock_type().is_none());
    }
}
