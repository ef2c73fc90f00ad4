//! # Shift Store
//!
//! Durable persistence seam for the active shift and its history.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ShiftStore (trait)                              │
//! │                                                                         │
//! │   load_active_shift / save_active_shift / clear_active_shift           │
//! │   append_history / load_history / close_shift                          │
//! │                                                                         │
//! │        ┌──────────────────────┐        ┌──────────────────────┐         │
//! │        │  SqliteShiftStore    │        │  MemoryShiftStore    │         │
//! │        │  ShiftRepository     │        │  RwLock + failure    │         │
//! │        │  (one terminal)      │        │  injection for tests │         │
//! │        └──────────────────────┘        └──────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every store is scoped to one terminal. `close_shift` must append the
//! history entry and clear the active record together; the default
//! implementation does them in sequence for stores without transactions.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ShiftError, ShiftResult};
use till_core::{Shift, ShiftHistoryEntry};
use till_db::ShiftRepository;

/// Interface for shift persistence.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// The persisted shift for this terminal, if any.
    async fn load_active_shift(&self) -> ShiftResult<Option<Shift>>;

    /// Inserts or replaces the persisted shift.
    async fn save_active_shift(&self, shift: &Shift) -> ShiftResult<()>;

    /// Removes the persisted shift. No-op if there is none.
    async fn clear_active_shift(&self) -> ShiftResult<()>;

    /// Appends a closed shift to history.
    async fn append_history(&self, entry: &ShiftHistoryEntry) -> ShiftResult<()>;

    /// Closed shifts, oldest first.
    async fn load_history(&self) -> ShiftResult<Vec<ShiftHistoryEntry>>;

    /// Appends history and clears the active record.
    async fn close_shift(&self, entry: &ShiftHistoryEntry) -> ShiftResult<()> {
        self.append_history(entry).await?;
        self.clear_active_shift().await
    }
}

// =============================================================================
// SQLite Store
// =============================================================================

/// SQLite-backed store for one terminal.
#[derive(Debug, Clone)]
pub struct SqliteShiftStore {
    shifts: ShiftRepository,
    terminal_id: String,
}

impl SqliteShiftStore {
    pub fn new(shifts: ShiftRepository, terminal_id: impl Into<String>) -> Self {
        SqliteShiftStore {
            shifts,
            terminal_id: terminal_id.into(),
        }
    }
}

#[async_trait]
impl ShiftStore for SqliteShiftStore {
    async fn load_active_shift(&self) -> ShiftResult<Option<Shift>> {
        Ok(self.shifts.load_active(&self.terminal_id).await?)
    }

    async fn save_active_shift(&self, shift: &Shift) -> ShiftResult<()> {
        Ok(self.shifts.save_active(shift).await?)
    }

    async fn clear_active_shift(&self) -> ShiftResult<()> {
        Ok(self.shifts.clear_active(&self.terminal_id).await?)
    }

    async fn append_history(&self, entry: &ShiftHistoryEntry) -> ShiftResult<()> {
        Ok(self.shifts.append_history(entry).await?)
    }

    async fn load_history(&self) -> ShiftResult<Vec<ShiftHistoryEntry>> {
        Ok(self.shifts.load_history(&self.terminal_id).await?)
    }

    /// One transaction: both writes land or neither does.
    async fn close_shift(&self, entry: &ShiftHistoryEntry) -> ShiftResult<()> {
        Ok(self.shifts.close_shift(entry).await?)
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// In-memory store with failure injection.
#[derive(Debug, Default)]
pub struct MemoryShiftStore {
    active: RwLock<Option<Shift>>,
    history: RwLock<Vec<ShiftHistoryEntry>>,
    fail_writes: RwLock<bool>,
    saves: RwLock<usize>,
}

impl MemoryShiftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with a persisted shift.
    pub fn with_active(shift: Shift) -> Self {
        MemoryShiftStore {
            active: RwLock::new(Some(shift)),
            ..Self::default()
        }
    }

    /// Makes every write fail until turned off again.
    pub async fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write().await = fail;
    }

    /// Number of successful `save_active_shift` calls.
    pub async fn save_count(&self) -> usize {
        *self.saves.read().await
    }

    async fn check_writable(&self) -> ShiftResult<()> {
        if *self.fail_writes.read().await {
            return Err(ShiftError::Store("injected write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ShiftStore for MemoryShiftStore {
    async fn load_active_shift(&self) -> ShiftResult<Option<Shift>> {
        Ok(self.active.read().await.clone())
    }

    async fn save_active_shift(&self, shift: &Shift) -> ShiftResult<()> {
        self.check_writable().await?;
        *self.active.write().await = Some(shift.clone());
        *self.saves.write().await += 1;
        Ok(())
    }

    async fn clear_active_shift(&self) -> ShiftResult<()> {
        self.check_writable().await?;
        *self.active.write().await = None;
        Ok(())
    }

    async fn append_history(&self, entry: &ShiftHistoryEntry) -> ShiftResult<()> {
        self.check_writable().await?;
        self.history.write().await.push(entry.clone());
        Ok(())
    }

    async fn load_history(&self) -> ShiftResult<Vec<ShiftHistoryEntry>> {
        Ok(self.history.read().await.clone())
    }

    async fn close_shift(&self, entry: &ShiftHistoryEntry) -> ShiftResult<()> {
        self.check_writable().await?;
        let mut active = self.active.write().await;
        self.history.write().await.push(entry.clone());
        *active = None;
        Ok(())
    }
}
