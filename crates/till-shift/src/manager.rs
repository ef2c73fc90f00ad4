//! # Shift Manager
//!
//! Owns the live shift on one terminal.
//!
//! ## Lifecycle
//! ```text
//!                start_shift(float, operator)
//!   NotStarted ────────────────────────────────► Active ──┐
//!       ▲                                          │      │ add_expense
//!       │                                          │      │ refresh_cash_sales
//!       │        end_shift / end_shift_with_count  │◄─────┘
//!       └──────────────────────────────────────────┘
//!                 (history entry appended, active record cleared)
//! ```
//!
//! ## Write Path
//! ```text
//! lock state ──► clone shift ──► apply change ──► store write ──► commit clone
//!                                                     │
//!                                                     └── Err: state untouched
//! ```
//!
//! `refresh_cash_sales` reads the ledger without holding the state lock and
//! only locks to write the new total, after checking the shift it read for is
//! still the active one.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::ShiftConfig;
use crate::error::{ShiftError, ShiftResult};
use crate::ledger::SalesLedger;
use crate::store::ShiftStore;
use till_core::{
    Expense, Money, RevenueRatio, SalesAggregator, Shift, ShiftHistoryEntry, ShiftSnapshot,
    StateError,
};

// =============================================================================
// Dependencies
// =============================================================================

/// External collaborators of a [`ShiftManager`].
#[derive(Clone)]
pub struct ShiftDeps {
    pub store: Arc<dyn ShiftStore>,
    pub ledger: Arc<dyn SalesLedger>,
    pub clock: Arc<dyn Clock>,
}

impl ShiftDeps {
    pub fn new(
        store: Arc<dyn ShiftStore>,
        ledger: Arc<dyn SalesLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ShiftDeps {
            store,
            ledger,
            clock,
        }
    }
}

// =============================================================================
// Refresh Status
// =============================================================================

/// Outcome of the most recent ledger refreshes for the active shift.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStatus {
    /// Shift the status belongs to.
    pub shift_id: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_refresh_error: Option<String>,
    pub consecutive_failures: u32,
}

impl RefreshStatus {
    fn for_shift(shift_id: &str) -> Self {
        RefreshStatus {
            shift_id: Some(shift_id.to_string()),
            ..Self::default()
        }
    }

    fn belongs_to(&self, shift_id: &str) -> bool {
        self.shift_id.as_deref() == Some(shift_id)
    }
}

// =============================================================================
// Shift Manager
// =============================================================================

struct ManagerInner {
    terminal_id: String,
    ratio: RevenueRatio,
    aggregator: SalesAggregator,
    refresh_timeout: Duration,
    store: Arc<dyn ShiftStore>,
    ledger: Arc<dyn SalesLedger>,
    clock: Arc<dyn Clock>,
    /// The Active shift, or `None` when NotStarted.
    state: Mutex<Option<Shift>>,
    refresh: RwLock<RefreshStatus>,
    /// Active shift id broadcaster.
    active_tx: watch::Sender<Option<String>>,
}

/// Handle to the shift state of one terminal. Cheap to clone.
#[derive(Clone)]
pub struct ShiftManager {
    inner: Arc<ManagerInner>,
}

impl ShiftManager {
    /// Creates a manager with no active shift.
    pub fn new(config: &ShiftConfig, deps: ShiftDeps) -> Self {
        Self::with_state(config, deps, None)
    }

    /// Creates a manager, resuming the shift persisted by a previous process.
    ///
    /// A persisted record that isn't Active or belongs to another terminal is
    /// ignored.
    pub async fn restore(config: &ShiftConfig, deps: ShiftDeps) -> ShiftResult<Self> {
        let persisted = deps.store.load_active_shift().await?;

        let shift = match persisted {
            Some(shift) if shift.terminal_id != config.terminal_id() => {
                warn!(
                    shift_id = %shift.id,
                    terminal_id = %shift.terminal_id,
                    expected = %config.terminal_id(),
                    "Ignoring persisted shift for another terminal"
                );
                None
            }
            Some(shift) if !shift.is_active() => {
                warn!(shift_id = %shift.id, status = %shift.status, "Ignoring persisted shift that is not active");
                None
            }
            Some(shift) => {
                info!(
                    shift_id = %shift.id,
                    operator = %shift.operator,
                    date = %shift.date,
                    "Resumed active shift"
                );
                Some(shift)
            }
            None => None,
        };

        Ok(Self::with_state(config, deps, shift))
    }

    fn with_state(config: &ShiftConfig, deps: ShiftDeps, shift: Option<Shift>) -> Self {
        let shift_id = shift.as_ref().map(|s| s.id.clone());
        let refresh = shift_id
            .as_deref()
            .map(RefreshStatus::for_shift)
            .unwrap_or_default();
        let (active_tx, _) = watch::channel(shift_id);

        ShiftManager {
            inner: Arc::new(ManagerInner {
                terminal_id: config.terminal_id().to_string(),
                ratio: config.ratio(),
                aggregator: config.aggregator(),
                refresh_timeout: config.refresh_timeout(),
                store: deps.store,
                ledger: deps.ledger,
                clock: deps.clock,
                state: Mutex::new(shift),
                refresh: RwLock::new(refresh),
                active_tx,
            }),
        }
    }

    pub fn terminal_id(&self) -> &str {
        &self.inner.terminal_id
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    /// Opens a shift with the given opening float.
    ///
    /// The shift's business day is today in the terminal's UTC offset.
    ///
    /// ## Errors
    /// - `State(AlreadyActive)` if a shift is already open
    /// - `Validation` for a negative float or a bad operator name
    /// - `Store` if the new shift couldn't be persisted
    pub async fn start_shift(&self, opening_float: Money, operator: &str) -> ShiftResult<Shift> {
        let mut state = self.inner.state.lock().await;
        if let Some(active) = state.as_ref() {
            return Err(StateError::AlreadyActive {
                shift_id: active.id.clone(),
            }
            .into());
        }

        let now = self.inner.clock.now();
        let date = self.inner.aggregator.local_date(now);
        let shift = Shift::open(&self.inner.terminal_id, operator, opening_float, date, now)?;

        self.inner.store.save_active_shift(&shift).await?;

        *self.inner.refresh.write().await = RefreshStatus::for_shift(&shift.id);
        *state = Some(shift.clone());
        self.inner.active_tx.send_replace(Some(shift.id.clone()));

        info!(
            shift_id = %shift.id,
            terminal_id = %shift.terminal_id,
            operator = %shift.operator,
            %date,
            opening_float = %shift.opening_float,
            "Shift started"
        );

        Ok(shift)
    }

    /// Records a cash expense against the active shift.
    ///
    /// ## Errors
    /// - `State(NoActiveShift)` if no shift is open
    /// - `Validation` for an unknown category, non-positive amount or long note
    /// - `Store` if the change couldn't be persisted
    pub async fn add_expense(
        &self,
        category: &str,
        amount: Money,
        note: Option<&str>,
    ) -> ShiftResult<Expense> {
        let mut state = self.inner.state.lock().await;
        let current = state.as_ref().ok_or(StateError::NoActiveShift)?;

        let mut updated = current.clone();
        let expense = updated
            .record_expense(category, amount, note, self.inner.clock.now())?
            .clone();

        self.inner.store.save_active_shift(&updated).await?;

        info!(
            shift_id = %updated.id,
            expense_id = %expense.id,
            category = %expense.category.as_str(),
            amount = %expense.amount,
            expenses_total = %updated.expenses_total(),
            "Expense recorded"
        );

        *state = Some(updated);
        Ok(expense)
    }

    /// Closes the active shift.
    ///
    /// ## Errors
    /// - `State(NoActiveShift)` if no shift is open
    /// - `Store` if history couldn't be written; the shift stays open
    pub async fn end_shift(&self) -> ShiftResult<ShiftHistoryEntry> {
        self.close(None).await
    }

    /// Closes the active shift, recording the physically counted cash.
    ///
    /// ## Errors
    /// As [`end_shift`](Self::end_shift), plus `Validation` for a negative
    /// count.
    pub async fn end_shift_with_count(&self, counted_cash: Money) -> ShiftResult<ShiftHistoryEntry> {
        self.close(Some(counted_cash)).await
    }

    async fn close(&self, counted_cash: Option<Money>) -> ShiftResult<ShiftHistoryEntry> {
        let mut state = self.inner.state.lock().await;
        let current = state.as_ref().ok_or(StateError::NoActiveShift)?;

        let entry = current
            .clone()
            .close(self.inner.clock.now(), counted_cash)?;

        if let Err(e) = self.inner.store.close_shift(&entry).await {
            warn!(shift_id = %entry.id(), error = %e, "Failed to close shift, keeping it open");
            return Err(e);
        }

        *state = None;
        *self.inner.refresh.write().await = RefreshStatus::default();
        self.inner.active_tx.send_replace(None);

        info!(
            shift_id = %entry.id(),
            operator = %entry.operator(),
            opening_float = %entry.opening_float(),
            cash_sales_total = %entry.cash_sales_total(),
            expenses_total = %entry.expenses_total(),
            closing_cash = %entry.closing_cash(),
            variance = ?entry.cash_variance().map(|v| v.minor()),
            "Shift ended"
        );

        Ok(entry)
    }

    // =========================================================================
    // Cash Sales Refresh
    // =========================================================================

    /// Sums cash-tagged payments of the sales completed on `date`.
    ///
    /// Pure read of the ledger; nothing is written.
    ///
    /// ## Errors
    /// `LedgerUnavailable` if the ledger fails or doesn't answer within the
    /// configured refresh timeout.
    pub async fn compute_cash_sales_total(&self, date: NaiveDate) -> ShiftResult<Money> {
        let timeout = self.inner.refresh_timeout;
        let sales = tokio::time::timeout(timeout, self.inner.ledger.sales_for_date(date))
            .await
            .map_err(|_| {
                ShiftError::LedgerUnavailable(format!(
                    "no answer within {}ms",
                    timeout.as_millis()
                ))
            })??;

        let total = self.inner.aggregator.cash_sales_total(&sales, date);
        debug!(%date, sales = sales.len(), %total, "Computed cash sales total");
        Ok(total)
    }

    /// Re-reads the ledger and replaces the active shift's cash sales total.
    ///
    /// On failure the previous total is kept and the error is surfaced in the
    /// snapshot until the next successful refresh.
    ///
    /// ## Errors
    /// - `State(NoActiveShift)` if no shift is open, or the shift closed while
    ///   the ledger was being read
    /// - `LedgerUnavailable` on ledger failure or timeout
    /// - `Store` if a changed total couldn't be persisted
    pub async fn refresh_cash_sales(&self) -> ShiftResult<Money> {
        let (shift_id, date) = {
            let state = self.inner.state.lock().await;
            let shift = state.as_ref().ok_or(StateError::NoActiveShift)?;
            (shift.id.clone(), shift.date)
        };

        let total = match self.compute_cash_sales_total(date).await {
            Ok(total) => total,
            Err(e) => {
                self.record_refresh_failure(&shift_id, &e).await;
                return Err(e);
            }
        };

        let mut state = self.inner.state.lock().await;
        let current = match state.as_ref() {
            Some(shift) if shift.id == shift_id => shift,
            _ => {
                debug!(%shift_id, "Shift changed during refresh, discarding total");
                return Err(StateError::NoActiveShift.into());
            }
        };

        let mut updated = current.clone();
        let changed = match updated.set_cash_sales_total(total) {
            Ok(changed) => changed,
            Err(e) => {
                let e = ShiftError::from(e);
                self.record_refresh_failure(&shift_id, &e).await;
                return Err(e);
            }
        };
        if changed {
            if let Err(e) = self.inner.store.save_active_shift(&updated).await {
                self.record_refresh_failure(&shift_id, &e).await;
                return Err(e);
            }
            debug!(%shift_id, %total, "Cash sales total updated");
            *state = Some(updated);
        }

        let mut refresh = self.inner.refresh.write().await;
        if refresh.belongs_to(&shift_id) {
            refresh.last_refreshed_at = Some(self.inner.clock.now());
            refresh.last_refresh_error = None;
            refresh.consecutive_failures = 0;
        }

        Ok(total)
    }

    async fn record_refresh_failure(&self, shift_id: &str, error: &ShiftError) {
        let mut refresh = self.inner.refresh.write().await;
        if !refresh.belongs_to(shift_id) {
            return;
        }
        refresh.last_refresh_error = Some(error.to_string());
        refresh.consecutive_failures += 1;

        warn!(
            %shift_id,
            error = %error,
            consecutive_failures = refresh.consecutive_failures,
            "Cash sales refresh failed, keeping previous total"
        );
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Read model of the active shift, or `None` when NotStarted.
    pub async fn snapshot(&self) -> Option<ShiftSnapshot> {
        let state = self.inner.state.lock().await;
        let shift = state.as_ref()?;
        let refresh = self.inner.refresh.read().await;
        let split = shift.revenue_split(self.inner.ratio);

        Some(ShiftSnapshot {
            shift_id: shift.id.clone(),
            operator: shift.operator.clone(),
            date: shift.date,
            status: shift.status,
            opening_float: shift.opening_float,
            cash_sales_total: shift.cash_sales_total,
            expenses: shift.expenses.entries().to_vec(),
            expenses_total: shift.expenses_total(),
            closing_cash_preview: shift.closing_cash_preview(),
            provider_share: split.provider_share,
            business_share: split.business_share,
            last_refreshed_at: refresh.last_refreshed_at,
            last_refresh_error: refresh.last_refresh_error.clone(),
        })
    }

    /// A copy of the active shift.
    pub async fn active_shift(&self) -> Option<Shift> {
        self.inner.state.lock().await.clone()
    }

    /// Refresh outcome for the active shift.
    pub async fn refresh_status(&self) -> RefreshStatus {
        self.inner.refresh.read().await.clone()
    }

    /// This terminal's closed shifts, oldest first.
    pub async fn history(&self) -> ShiftResult<Vec<ShiftHistoryEntry>> {
        self.inner.store.load_history().await
    }

    /// Subscribes to active shift id changes (`None` when NotStarted).
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.inner.active_tx.subscribe()
    }
}

impl std::fmt::Debug for ShiftManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShiftManager")
            .field("terminal_id", &self.inner.terminal_id)
            .field("ratio", &self.inner.ratio)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ledger::MemoryLedger;
    use crate::store::MemoryShiftStore;
    use chrono::TimeZone;
    use till_core::{
        LedgerPayment, LedgerSale, PaymentMethod, ShiftStatus, ValidationError, MAX_AMOUNT_MINOR,
    };

    struct Harness {
        manager: ShiftManager,
        store: Arc<MemoryShiftStore>,
        ledger: Arc<MemoryLedger>,
        clock: Arc<ManualClock>,
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn harness_with(config: ShiftConfig, store: MemoryShiftStore) -> Harness {
        let store = Arc::new(store);
        let ledger = Arc::new(MemoryLedger::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let manager = ShiftManager::new(
            &config,
            ShiftDeps::new(store.clone(), ledger.clone(), clock.clone()),
        );
        Harness {
            manager,
            store,
            ledger,
            clock,
        }
    }

    fn harness() -> Harness {
        harness_with(ShiftConfig::new(), MemoryShiftStore::new())
    }

    fn cash_sale(id: &str, hour: u32, cash: i64, card: i64) -> LedgerSale {
        let mut payments = Vec::new();
        if cash > 0 {
            payments.push(LedgerPayment::new(PaymentMethod::Cash, Money::from_minor(cash)));
        }
        if card > 0 {
            payments.push(LedgerPayment::new(PaymentMethod::Card, Money::from_minor(card)));
        }
        LedgerSale {
            id: id.to_string(),
            receipt_number: format!("R-{}", id),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap(),
            total: Money::from_minor(cash + card),
            payments,
        }
    }

    #[tokio::test]
    async fn test_start_shift_snapshot() {
        let h = harness();
        assert!(h.manager.snapshot().await.is_none());

        let shift = h
            .manager
            .start_shift(Money::from_minor(500_000), "Dewi")
            .await
            .unwrap();
        assert_eq!(shift.status, ShiftStatus::Active);
        assert_eq!(shift.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(shift.start_time, start_time());

        let snapshot = h.manager.snapshot().await.unwrap();
        assert_eq!(snapshot.shift_id, shift.id);
        assert_eq!(snapshot.opening_float, Money::from_minor(500_000));
        assert_eq!(snapshot.cash_sales_total, Money::zero());
        assert_eq!(snapshot.closing_cash_preview, Money::from_minor(500_000));
        assert!(snapshot.last_refreshed_at.is_none());

        assert_eq!(h.store.load_active_shift().await.unwrap(), Some(shift));
    }

    #[tokio::test]
    async fn test_second_start_rejected() {
        let h = harness();
        let first = h
            .manager
            .start_shift(Money::from_minor(100), "Dewi")
            .await
            .unwrap();

        let err = h
            .manager
            .start_shift(Money::from_minor(200), "Budi")
            .await
            .unwrap_err();
        match err {
            ShiftError::State(StateError::AlreadyActive { shift_id }) => assert_eq!(shift_id, first.id),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(h.manager.active_shift().await.unwrap().operator, "Dewi");
    }

    #[tokio::test]
    async fn test_start_shift_validation() {
        let h = harness();
        let err = h
            .manager
            .start_shift(Money::from_minor(-1), "Dewi")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShiftError::Validation(ValidationError::MustNotBeNegative { .. })
        ));

        let err = h.manager.start_shift(Money::zero(), "   ").await.unwrap_err();
        assert!(err.is_user_facing());
        assert!(h.manager.active_shift().await.is_none());
    }

    #[tokio::test]
    async fn test_operations_without_shift() {
        let h = harness();

        let err = h
            .manager
            .add_expense("supplies", Money::from_minor(100), None)
            .await
            .unwrap_err();
        assert!(err.is_no_active_shift());
        assert!(h.manager.end_shift().await.unwrap_err().is_no_active_shift());
        assert!(h
            .manager
            .refresh_cash_sales()
            .await
            .unwrap_err()
            .is_no_active_shift());
    }

    #[tokio::test]
    async fn test_add_expense() {
        let h = harness();
        h.manager
            .start_shift(Money::from_minor(500_000), "Dewi")
            .await
            .unwrap();

        let expense = h
            .manager
            .add_expense("Supplies", Money::from_minor(50_000), Some(""))
            .await
            .unwrap();
        assert_eq!(expense.amount, Money::from_minor(50_000));
        assert!(expense.note.is_none());

        let snapshot = h.manager.snapshot().await.unwrap();
        assert_eq!(snapshot.expenses_total, Money::from_minor(50_000));
        assert_eq!(snapshot.expenses, vec![expense]);
        assert_eq!(snapshot.closing_cash_preview, Money::from_minor(450_000));

        let persisted = h.store.load_active_shift().await.unwrap().unwrap();
        assert_eq!(persisted.expenses.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_expense_changes_nothing() {
        let h = harness();
        h.manager
            .start_shift(Money::from_minor(500_000), "Dewi")
            .await
            .unwrap();
        let saves = h.store.save_count().await;

        assert!(h
            .manager
            .add_expense("lunch", Money::from_minor(100), None)
            .await
            .is_err());
        assert!(h
            .manager
            .add_expense("supplies", Money::zero(), None)
            .await
            .is_err());

        assert_eq!(h.store.save_count().await, saves);
        assert!(h.manager.snapshot().await.unwrap().expenses.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_leaves_state_untouched() {
        let h = harness();
        h.manager
            .start_shift(Money::from_minor(500_000), "Dewi")
            .await
            .unwrap();

        h.store.set_fail_writes(true).await;
        let err = h
            .manager
            .add_expense("supplies", Money::from_minor(1_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShiftError::Store(_)));
        assert!(h.manager.snapshot().await.unwrap().expenses.is_empty());

        let err = h.manager.end_shift().await.unwrap_err();
        assert!(matches!(err, ShiftError::Store(_)));
        assert!(h.manager.active_shift().await.is_some());
        assert!(h.manager.history().await.unwrap().is_empty());

        h.store.set_fail_writes(false).await;
        h.manager.end_shift().await.unwrap();
        assert!(h.manager.active_shift().await.is_none());
    }

    #[tokio::test]
    async fn test_start_failure_keeps_not_started() {
        let h = harness();
        h.store.set_fail_writes(true).await;

        let mut rx = h.manager.subscribe();
        assert!(h
            .manager
            .start_shift(Money::zero(), "Dewi")
            .await
            .is_err());
        assert!(h.manager.active_shift().await.is_none());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_refresh_replaces_total_and_splits() {
        let h = harness();
        h.manager
            .start_shift(Money::from_minor(500_000), "Dewi")
            .await
            .unwrap();

        h.ledger.push(cash_sale("a", 9, 100_000, 0)).await;
        h.ledger.push(cash_sale("b", 11, 150_000, 0)).await;
        h.ledger.push(cash_sale("c", 12, 0, 80_000)).await;

        assert_eq!(
            h.manager.refresh_cash_sales().await.unwrap(),
            Money::from_minor(250_000)
        );
        // Idempotent on an unchanged ledger.
        assert_eq!(
            h.manager.refresh_cash_sales().await.unwrap(),
            Money::from_minor(250_000)
        );

        let snapshot = h.manager.snapshot().await.unwrap();
        assert_eq!(snapshot.cash_sales_total, Money::from_minor(250_000));
        assert_eq!(snapshot.provider_share, Money::from_minor(175_000));
        assert_eq!(snapshot.business_share, Money::from_minor(75_000));
        assert_eq!(snapshot.last_refreshed_at, Some(start_time()));
    }

    #[tokio::test]
    async fn test_refresh_persists_only_changes() {
        let h = harness();
        h.manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        let after_start = h.store.save_count().await;

        // Total stays zero: no write.
        h.manager.refresh_cash_sales().await.unwrap();
        assert_eq!(h.store.save_count().await, after_start);

        h.ledger.push(cash_sale("a", 9, 10_000, 0)).await;
        h.manager.refresh_cash_sales().await.unwrap();
        assert_eq!(h.store.save_count().await, after_start + 1);

        let persisted = h.store.load_active_shift().await.unwrap().unwrap();
        assert_eq!(persisted.cash_sales_total, Money::from_minor(10_000));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_stale_total() {
        let h = harness();
        h.manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        h.ledger.push(cash_sale("a", 9, 10_000, 0)).await;
        h.manager.refresh_cash_sales().await.unwrap();

        h.ledger.push(cash_sale("b", 10, 5_000, 0)).await;
        h.ledger.set_unavailable(true).await;
        h.clock.advance(chrono::Duration::seconds(30));

        let err = h.manager.refresh_cash_sales().await.unwrap_err();
        assert!(err.is_transient());
        assert!(h.manager.refresh_cash_sales().await.is_err());

        let snapshot = h.manager.snapshot().await.unwrap();
        assert_eq!(snapshot.cash_sales_total, Money::from_minor(10_000));
        assert!(snapshot.last_refresh_error.is_some());
        assert_eq!(snapshot.last_refreshed_at, Some(start_time()));
        assert_eq!(h.manager.refresh_status().await.consecutive_failures, 2);

        h.ledger.set_unavailable(false).await;
        h.manager.refresh_cash_sales().await.unwrap();
        let status = h.manager.refresh_status().await;
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_refresh_error.is_none());
        assert_eq!(
            h.manager.snapshot().await.unwrap().cash_sales_total,
            Money::from_minor(15_000)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_times_out() {
        let h = harness();
        h.manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        h.ledger.set_delay(Some(Duration::from_secs(60))).await;

        let err = h.manager.refresh_cash_sales().await.unwrap_err();
        assert!(matches!(err, ShiftError::LedgerUnavailable(_)));
        assert!(h
            .manager
            .snapshot()
            .await
            .unwrap()
            .last_refresh_error
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expense_added_during_refresh_is_kept() {
        let h = harness();
        h.manager
            .start_shift(Money::from_minor(100_000), "Dewi")
            .await
            .unwrap();
        h.ledger.push(cash_sale("a", 9, 40_000, 0)).await;
        h.ledger.set_delay(Some(Duration::from_secs(2))).await;

        let refreshing = tokio::spawn({
            let manager = h.manager.clone();
            async move { manager.refresh_cash_sales().await }
        });

        // The refresh is parked on the ledger read, with the state unlocked.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!refreshing.is_finished());
        h.manager
            .add_expense("Supplies", Money::from_minor(10_000), Some("bags"))
            .await
            .unwrap();

        let total = refreshing.await.unwrap().unwrap();
        assert_eq!(total, Money::from_minor(40_000));

        let snapshot = h.manager.snapshot().await.unwrap();
        assert_eq!(snapshot.cash_sales_total, Money::from_minor(40_000));
        assert_eq!(snapshot.expenses.len(), 1);
        assert_eq!(snapshot.expenses_total, Money::from_minor(10_000));
        assert_eq!(snapshot.closing_cash_preview, Money::from_minor(130_000));

        let stored = h.store.load_active_shift().await.unwrap().unwrap();
        assert_eq!(stored.cash_sales_total, Money::from_minor(40_000));
        assert_eq!(stored.expenses.len(), 1);
        assert_eq!(stored.expenses.total(), Money::from_minor(10_000));
    }

    #[tokio::test]
    async fn test_oversized_expenses_are_rejected() {
        let h = harness();
        h.manager.start_shift(Money::zero(), "Dewi").await.unwrap();

        let err = h
            .manager
            .add_expense("Supplies", Money::from_minor(i64::MAX), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShiftError::Validation(ValidationError::OutOfRange { .. })
        ));

        h.manager
            .add_expense("Supplies", Money::from_minor(MAX_AMOUNT_MINOR), None)
            .await
            .unwrap();
        let err = h
            .manager
            .add_expense("Supplies", Money::from_minor(1), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShiftError::Validation(ValidationError::OutOfRange { .. })
        ));

        let snapshot = h.manager.snapshot().await.unwrap();
        assert_eq!(snapshot.expenses_total, Money::from_minor(MAX_AMOUNT_MINOR));
        assert_eq!(snapshot.closing_cash_preview, Money::from_minor(-MAX_AMOUNT_MINOR));
        assert_eq!(h.store.load_active_shift().await.unwrap().unwrap().expenses.len(), 1);
    }

    #[tokio::test]
    async fn test_implausible_ledger_total_is_a_refresh_failure() {
        let h = harness();
        h.manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        h.ledger.push(cash_sale("a", 9, 25_000, 0)).await;
        h.manager.refresh_cash_sales().await.unwrap();

        h.ledger.push(cash_sale("b", 10, i64::MAX, 0)).await;
        h.ledger.push(cash_sale("c", 11, 1, 0)).await;
        let err = h.manager.refresh_cash_sales().await.unwrap_err();
        assert!(matches!(
            err,
            ShiftError::Validation(ValidationError::OutOfRange { .. })
        ));

        let snapshot = h.manager.snapshot().await.unwrap();
        assert_eq!(snapshot.cash_sales_total, Money::from_minor(25_000));
        assert!(snapshot.last_refresh_error.is_some());
        assert_eq!(h.manager.refresh_status().await.consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_end_shift_with_count() {
        let h = harness();
        h.manager
            .start_shift(Money::from_minor(500_000), "Dewi")
            .await
            .unwrap();
        h.ledger.push(cash_sale("a", 9, 250_000, 0)).await;
        h.manager.refresh_cash_sales().await.unwrap();
        h.manager
            .add_expense("supplies", Money::from_minor(50_000), None)
            .await
            .unwrap();

        h.clock.advance(chrono::Duration::hours(8));
        let entry = h
            .manager
            .end_shift_with_count(Money::from_minor(695_000))
            .await
            .unwrap();

        assert_eq!(entry.closing_cash(), Money::from_minor(700_000));
        assert_eq!(entry.cash_variance(), Some(Money::from_minor(-5_000)));
        assert_eq!(entry.end_time(), start_time() + chrono::Duration::hours(8));
        assert!(h.manager.snapshot().await.is_none());
        assert!(h.store.load_active_shift().await.unwrap().is_none());
        assert_eq!(h.manager.history().await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn test_negative_count_rejected() {
        let h = harness();
        h.manager.start_shift(Money::zero(), "Dewi").await.unwrap();

        let err = h
            .manager
            .end_shift_with_count(Money::from_minor(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, ShiftError::Validation(_)));
        assert!(h.manager.active_shift().await.is_some());
    }

    #[tokio::test]
    async fn test_subscribe_tracks_active_shift() {
        let h = harness();
        let mut rx = h.manager.subscribe();
        assert!(rx.borrow().is_none());

        let shift = h.manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some(shift.id.as_str()));

        h.manager.end_shift().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_restore_resumes_active_shift() {
        let config = ShiftConfig::new();
        let shift = Shift::open(
            config.terminal_id(),
            "Dewi",
            Money::from_minor(500_000),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            start_time(),
        )
        .unwrap();

        let store = Arc::new(MemoryShiftStore::with_active(shift.clone()));
        let deps = ShiftDeps::new(
            store,
            Arc::new(MemoryLedger::new()),
            Arc::new(ManualClock::new(start_time())),
        );
        let manager = ShiftManager::restore(&config, deps).await.unwrap();

        assert_eq!(manager.active_shift().await, Some(shift.clone()));
        assert_eq!(manager.subscribe().borrow().as_deref(), Some(shift.id.as_str()));
    }

    #[tokio::test]
    async fn test_restore_ignores_foreign_or_closed_records() {
        let config = ShiftConfig::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let foreign = Shift::open("register-9", "Dewi", Money::zero(), date, start_time()).unwrap();
        let closed = Shift::open(config.terminal_id(), "Dewi", Money::zero(), date, start_time())
            .unwrap()
            .close(start_time(), None)
            .unwrap()
            .shift()
            .clone();

        for persisted in [foreign, closed] {
            let deps = ShiftDeps::new(
                Arc::new(MemoryShiftStore::with_active(persisted)),
                Arc::new(MemoryLedger::new()),
                Arc::new(ManualClock::new(start_time())),
            );
            let manager = ShiftManager::restore(&config, deps).await.unwrap();
            assert!(manager.active_shift().await.is_none());
        }
    }

    #[tokio::test]
    async fn test_business_day_uses_configured_offset() {
        let mut config = ShiftConfig::new();
        config.shift.utc_offset_minutes = 420;
        let h = harness_with(config, MemoryShiftStore::new());

        // 20:00Z is already March 2nd at UTC+7.
        h.clock.set(Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap());
        let shift = h.manager.start_shift(Money::zero(), "Dewi").await.unwrap();
        assert_eq!(shift.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }
}
