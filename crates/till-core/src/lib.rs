//! # till-core: Pure Shift Reconciliation Logic
//!
//! This crate is the **heart** of the Till shift engine. It contains the
//! drawer arithmetic and the shift state machine as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 till-shift (Service Layer)                      │   │
//! │  │    ShiftManager ──► RefreshScheduler ──► ShiftStore / Ledger    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   shift   │  │ expenses  │  │   split   │  │ aggregator│  │   │
//! │  │   │   Shift   │  │  Expense  │  │  Revenue  │  │   Sales   │  │   │
//! │  │   │  History  │  │  Ledger   │  │   Split   │  │ Aggregator│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │          SQLite sales ledger, shift records, migrations         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic
//! - [`types`] - Domain types (ShiftStatus, ExpenseCategory, LedgerSale, ...)
//! - [`expenses`] - Append-only expense ledger for a shift
//! - [`split`] - Provider / business revenue split
//! - [`aggregator`] - Cash sales total for a calendar day
//! - [`shift`] - The shift record and its state transitions
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{NaiveDate, Utc};
//! use till_core::money::Money;
//! use till_core::shift::Shift;
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let mut shift = Shift::open("register-1", "Dewi", Money::from_minor(500_000), date, Utc::now())
//!     .unwrap();
//!
//! shift.set_cash_sales_total(Money::from_minor(250_000)).unwrap();
//! shift
//!     .record_expense("Supplies", Money::from_minor(50_000), Some("plastic bags"), Utc::now())
//!     .unwrap();
//!
//! assert_eq!(shift.closing_cash_preview().minor(), 700_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod error;
pub mod expenses;
pub mod money;
pub mod shift;
pub mod split;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use aggregator::SalesAggregator;
pub use error::{CoreError, CoreResult, StateError, ValidationError};
pub use expenses::{Expense, ExpenseLedger};
pub use money::Money;
pub use shift::{Shift, ShiftHistoryEntry};
pub use split::{split, RevenueSplit};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default provider share of cash sales: 70%.
pub const DEFAULT_PROVIDER_RATIO_BPS: u32 = 7000;

/// Default interval between cash-sales refreshes while a shift is active.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// Largest amount accepted for any single drawer figure (float, expense,
/// counted cash, cash sales total, running expense total), in minor units.
///
/// Keeps every derived figure such as the closing cash well inside `i64`.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000;

/// Maximum length of a free-text expense note.
pub const MAX_EXPENSE_NOTE_LEN: usize = 500;

/// Maximum length of an operator name.
pub const MAX_OPERATOR_LEN: usize = 100;
