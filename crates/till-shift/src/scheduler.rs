//! # Refresh Scheduler
//!
//! Background task that keeps the active shift's cash sales total fresh.
//!
//! ```text
//! spawn(manager, interval)
//!      │
//!      ▼
//! ┌──────────────────────── loop ──────────────────────────┐
//! │  no active shift:                                      │
//! │   ├── shutdown_rx.recv()    ──► stop                   │
//! │   └── active_rx.changed()   ──► follow new shift id    │
//! │                                                        │
//! │  shift active:                                         │
//! │   ├── shutdown_rx.recv()    ──► stop                   │
//! │   ├── active_rx.changed()   ──► follow id or go idle   │
//! │   └── interval.tick()       ──► refresh_cash_sales()   │
//! │                                   ├── Ok      count    │
//! │                                   ├── NoActiveShift    │
//! │                                   │           wait     │
//! │                                   └── Err     count,   │
//! │                                               retry    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! One scheduler serves every shift the manager runs. It idles while no
//! shift is active and the first tick for each new shift fires immediately.
//! It stops on `shutdown`, when the handle is dropped, or when the manager's
//! active-shift channel closes.

use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::manager::ShiftManager;

/// Counters returned when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub ticks: u64,
    pub successes: u64,
    pub failures: u64,
}

/// Spawns refresh tasks.
pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Keeps whichever shift is active refreshed every `interval`.
    ///
    /// May be spawned before the first shift starts.
    pub fn spawn(manager: ShiftManager, interval: Duration) -> RefreshHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let active_rx = manager.subscribe();

        let join = tokio::spawn(run(manager, interval, shutdown_rx, active_rx));

        RefreshHandle { shutdown_tx, join }
    }
}

/// Handle for controlling a running scheduler.
#[derive(Debug)]
pub struct RefreshHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: JoinHandle<RefreshStats>,
}

impl RefreshHandle {
    /// Stops the scheduler and waits for it to finish.
    pub async fn shutdown(self) -> Result<RefreshStats, JoinError> {
        // Already stopped if the receiver is gone.
        let _ = self.shutdown_tx.send(()).await;
        self.join.await
    }

    /// Waits for the scheduler to stop on its own.
    pub async fn join(self) -> Result<RefreshStats, JoinError> {
        self.join.await
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

fn new_ticker(interval: Duration) -> Interval {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn run(
    manager: ShiftManager,
    interval: Duration,
    mut shutdown_rx: mpsc::Receiver<()>,
    mut active_rx: watch::Receiver<Option<String>>,
) -> RefreshStats {
    let mut stats = RefreshStats::default();
    let mut shift_id = active_rx.borrow_and_update().clone();
    let mut ticker = new_ticker(interval);

    info!(
        shift_id = shift_id.as_deref().unwrap_or("-"),
        interval_secs = interval.as_secs(),
        "Refresh scheduler starting"
    );

    loop {
        let Some(current) = shift_id.clone() else {
            // Idle until a shift starts
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    debug!("Refresh scheduler shutting down");
                    break;
                }

                changed = active_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    shift_id = active_rx.borrow_and_update().clone();
                    if let Some(id) = shift_id.as_deref() {
                        debug!(shift_id = %id, "Shift started, refreshing");
                        ticker = new_ticker(interval);
                    }
                }
            }
            continue;
        };

        tokio::select! {
            biased;

            // Shutdown
            _ = shutdown_rx.recv() => {
                debug!(shift_id = %current, "Refresh scheduler shutting down");
                break;
            }

            // Shift ended or replaced
            changed = active_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = active_rx.borrow_and_update().clone();
                if next.as_deref() != Some(current.as_str()) {
                    debug!(shift_id = %current, next = ?next, "Active shift changed");
                    if next.is_some() {
                        ticker = new_ticker(interval);
                    }
                    shift_id = next;
                }
            }

            // Refresh on interval
            _ = ticker.tick() => {
                stats.ticks += 1;
                match manager.refresh_cash_sales().await {
                    Ok(_) => stats.successes += 1,
                    // The watch carries the new state; pick it up there.
                    Err(e) if e.is_no_active_shift() => {
                        debug!(shift_id = %current, "Shift closed during refresh");
                    }
                    Err(e) => {
                        // Already logged and recorded by the manager.
                        stats.failures += 1;
                        debug!(shift_id = %current, error = %e, failures = stats.failures, "Refresh failed, will retry");
                    }
                }
            }
        }
    }

    info!(
        ticks = stats.ticks,
        successes = stats.successes,
        failures = stats.failures,
        "Refresh scheduler stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::ShiftConfig;
    use crate::ledger::MemoryLedger;
    use crate::manager::ShiftDeps;
    use crate::store::MemoryShiftStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use till_core::{LedgerPayment, LedgerSale, Money, PaymentMethod};

    const INTERVAL: Duration = Duration::from_secs(30);

    fn setup() -> (ShiftManager, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        ));
        let manager = ShiftManager::new(
            &ShiftConfig::new(),
            ShiftDeps::new(Arc::new(MemoryShiftStore::new()), ledger.clone(), clock),
        );
        (manager, ledger)
    }

    fn cash_sale(id: &str, amount: i64) -> LedgerSale {
        LedgerSale {
            id: id.to_string(),
            receipt_number: format!("R-{}", id),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            total: Money::from_minor(amount),
            payments: vec![LedgerPayment::new(PaymentMethod::Cash, Money::from_minor(amount))],
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_refresh_is_immediate() {
        let (manager, ledger) = setup();
        manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        ledger.push(cash_sale("a", 10_000)).await;

        let handle = RefreshScheduler::spawn(manager.clone(), INTERVAL);
        settle().await;

        let snapshot = manager.snapshot().await.unwrap();
        assert_eq!(snapshot.cash_sales_total, Money::from_minor(10_000));

        let stats = handle.shutdown().await.unwrap();
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_on_interval() {
        let (manager, ledger) = setup();
        manager.start_shift(Money::zero(), "Dewi").await.unwrap();

        let handle = RefreshScheduler::spawn(manager.clone(), INTERVAL);
        settle().await;

        ledger.push(cash_sale("a", 10_000)).await;
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(
            manager.snapshot().await.unwrap().cash_sales_total,
            Money::from_minor(10_000)
        );

        ledger.push(cash_sale("b", 5_000)).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            manager.snapshot().await.unwrap().cash_sales_total,
            Money::from_minor(15_000)
        );

        let stats = handle.shutdown().await.unwrap();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_counted_and_retried() {
        let (manager, ledger) = setup();
        manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        ledger.set_unavailable(true).await;

        let handle = RefreshScheduler::spawn(manager.clone(), INTERVAL);
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert!(!handle.is_finished());
        let snapshot = manager.snapshot().await.unwrap();
        assert!(snapshot.last_refresh_error.is_some());
        assert_eq!(snapshot.cash_sales_total, Money::zero());

        ledger.set_unavailable(false).await;
        ledger.push(cash_sale("a", 10_000)).await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = manager.snapshot().await.unwrap();
        assert!(snapshot.last_refresh_error.is_none());
        assert_eq!(snapshot.cash_sales_total, Money::from_minor(10_000));

        let stats = handle.shutdown().await.unwrap();
        assert_eq!(stats.failures, 2);
        assert_eq!(stats.successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idles_after_shift_ends() {
        let (manager, _ledger) = setup();
        manager.start_shift(Money::zero(), "Dewi").await.unwrap();

        let handle = RefreshScheduler::spawn(manager.clone(), INTERVAL);
        settle().await;

        manager.end_shift().await.unwrap();
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(!handle.is_finished());

        let stats = handle.shutdown().await.unwrap();
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follows_the_next_shift() {
        let (manager, ledger) = setup();
        manager.start_shift(Money::zero(), "Dewi").await.unwrap();

        let handle = RefreshScheduler::spawn(manager.clone(), INTERVAL);
        settle().await;

        manager.end_shift().await.unwrap();
        ledger.push(cash_sale("a", 10_000)).await;
        manager.start_shift(Money::zero(), "Budi").await.unwrap();
        settle().await;

        let snapshot = manager.snapshot().await.unwrap();
        assert_eq!(snapshot.operator, "Budi");
        assert_eq!(snapshot.cash_sales_total, Money::from_minor(10_000));

        let stats = handle.shutdown().await.unwrap();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.successes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_the_first_shift() {
        let (manager, ledger) = setup();

        let handle = RefreshScheduler::spawn(manager.clone(), INTERVAL);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!handle.is_finished());

        ledger.push(cash_sale("a", 10_000)).await;
        manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        settle().await;
        assert_eq!(
            manager.snapshot().await.unwrap().cash_sales_total,
            Money::from_minor(10_000)
        );

        // Keeps ticking for that shift.
        tokio::time::sleep(Duration::from_secs(30)).await;

        // And carries over to the one after it.
        manager.end_shift().await.unwrap();
        ledger.push(cash_sale("b", 5_000)).await;
        manager.start_shift(Money::zero(), "Budi").await.unwrap();
        settle().await;
        assert_eq!(
            manager.snapshot().await.unwrap().cash_sales_total,
            Money::from_minor(15_000)
        );

        let stats = handle.shutdown().await.unwrap();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.successes, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_the_handle_stops_the_task() {
        let (manager, _ledger) = setup();

        let handle = RefreshScheduler::spawn(manager.clone(), INTERVAL);
        let RefreshHandle { shutdown_tx, join } = handle;
        drop(shutdown_tx);

        let stats = join.await.unwrap();
        assert_eq!(stats, RefreshStats::default());
    }
}
