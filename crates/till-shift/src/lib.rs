//! # till-shift: Shift Lifecycle Service for Till
//!
//! This crate owns the live cash-drawer shift on one terminal. It applies the
//! lifecycle operations from `till-core`, persists every change, and keeps the
//! shift's cash sales total in step with the sales ledger.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shift Service Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      ShiftManager (one per terminal)             │  │
//! │  │                                                                  │  │
//! │  │  start_shift / add_expense / end_shift / snapshot / history      │  │
//! │  │  refresh_cash_sales / compute_cash_sales_total / subscribe       │  │
//! │  └──────────┬──────────────────────┬───────────────────────▲───────┘  │
//! │             │                      │                       │          │
//! │             ▼                      ▼                       │          │
//! │  ┌────────────────┐  ┌────────────────────┐  ┌─────────────┴───────┐  │
//! │  │  ShiftStore    │  │  SalesLedger       │  │  RefreshScheduler   │  │
//! │  │                │  │                    │  │                     │  │
//! │  │ Active shift + │  │ Completed sales    │  │ tokio task, ticks   │  │
//! │  │ history rows   │  │ for a calendar day │  │ every N seconds,    │  │
//! │  │ (SQLite/memory)│  │ (SQLite/memory)    │  │ idles between shifts│  │
//! │  └────────────────┘  └────────────────────┘  └─────────────────────┘  │
//! │                                                                         │
//! │  ShiftConfig: TOML file + TILL_* environment overrides                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Terminal, refresh and database settings
//! - [`error`] - Service error types
//! - [`clock`] - Wall-clock seam
//! - [`store`] - Shift persistence seam
//! - [`ledger`] - Sales ledger seam
//! - [`manager`] - `ShiftManager`
//! - [`scheduler`] - Periodic cash sales refresh
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use till_db::{Database, DbConfig};
//! use till_shift::*;
//!
//! let config = ShiftConfig::load_or_default(None);
//! let db = Database::new(DbConfig::new(config.database_path())).await?;
//!
//! let deps = ShiftDeps::new(
//!     Arc::new(SqliteShiftStore::new(db.shifts(), config.terminal_id())),
//!     Arc::new(SqliteSalesLedger::new(db.sales(), config.aggregator())),
//!     Arc::new(SystemClock),
//! );
//! let manager = ShiftManager::restore(&config, deps).await?;
//!
//! // One scheduler for the life of the process, across every shift.
//! let refresh = RefreshScheduler::spawn(manager.clone(), config.refresh_interval());
//!
//! manager.start_shift(Money::from_minor(500_000), "Dewi").await?;
//! // ...
//! manager.end_shift().await?;
//! refresh.shutdown().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod scheduler;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DatabaseSettings, ShiftConfig, ShiftSettings, TerminalConfig};
pub use error::{ShiftError, ShiftResult};
pub use ledger::{MemoryLedger, SalesLedger, SqliteSalesLedger};
pub use manager::{RefreshStatus, ShiftDeps, ShiftManager};
pub use scheduler::{RefreshHandle, RefreshScheduler, RefreshStats};
pub use store::{MemoryShiftStore, ShiftStore, SqliteShiftStore};

pub use till_core::{Expense, Money, ShiftHistoryEntry, ShiftSnapshot};

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for binaries.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till_shift=trace` - Show trace for the shift service only
/// - Default: INFO, DEBUG for till crates
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
