//! # Shift Service Error Types
//!
//! What callers of the shift service see.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shift Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  User-facing    │  │   Transient     │  │     Fatal for the call  │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Validation     │  │  LedgerUnavail. │  │  Store                  │ │
//! │  │  State          │  │  (incl. timeout)│  │  Config                 │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  User-facing: show to the operator, nothing changed.                   │
//! │  Transient:   the scheduler logs it and keeps the previous total.      │
//! │  Store:       the mutation was aborted; in-memory state is unchanged.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use till_core::{CoreError, StateError, ValidationError};
use till_db::DbError;

/// Result type for shift service operations.
pub type ShiftResult<T> = Result<T, ShiftError>;

/// Errors returned by the shift service.
#[derive(Debug, Error)]
pub enum ShiftError {
    /// Input rejected; nothing changed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation not allowed in the current lifecycle state.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Durable store write or read failed.
    #[error("Store error: {0}")]
    Store(String),

    /// The sales ledger couldn't be read (or didn't answer in time).
    #[error("Sales ledger unavailable: {0}")]
    LedgerUnavailable(String),

    /// Configuration couldn't be loaded, saved or validated.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for ShiftError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ShiftError::Validation(e),
            CoreError::State(e) => ShiftError::State(e),
        }
    }
}

impl From<DbError> for ShiftError {
    fn from(err: DbError) -> Self {
        ShiftError::Store(err.to_string())
    }
}

impl From<std::io::Error> for ShiftError {
    fn from(err: std::io::Error) -> Self {
        ShiftError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for ShiftError {
    fn from(err: toml::de::Error) -> Self {
        ShiftError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ShiftError {
    fn from(err: toml::ser::Error) -> Self {
        ShiftError::Config(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ShiftError {
    /// Returns true if the error is the caller's to fix (bad input, wrong
    /// state) and safe to show to the operator verbatim.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, ShiftError::Validation(_) | ShiftError::State(_))
    }

    /// Returns true if retrying later may succeed.
    ///
    /// ## Transient Errors
    /// - Ledger read failures and timeouts
    ///
    /// Store failures are not transient from the caller's point of view:
    /// the operation was rejected and has to be re-issued deliberately.
    pub fn is_transient(&self) -> bool {
        matches!(self, ShiftError::LedgerUnavailable(_))
    }

    /// Returns true for `StateError::NoActiveShift`.
    pub fn is_no_active_shift(&self) -> bool {
        matches!(self, ShiftError::State(StateError::NoActiveShift))
    }
}
