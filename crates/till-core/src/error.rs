//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Umbrella for domain failures                   │
//! │  ├── ValidationError  - Bad opening float, expense amount, category    │
//! │  └── StateError       - Operation invalid for the lifecycle state      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  till-shift errors (service crate)                                     │
//! │  └── ShiftError       - What callers see (adds Store / Ledger kinds)   │
//! │                                                                         │
//! │  Flow: ValidationError / StateError → CoreError → ShiftError → caller  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::ShiftStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input rejected before any state changed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation not allowed in the current lifecycle state.
    #[error("State error: {0}")]
    State(#[from] StateError),
}

// =============================================================================
// State Error
// =============================================================================

/// Lifecycle violations.
///
/// ## When These Occur
/// ```text
/// start_shift  while Active      → AlreadyActive
/// add_expense  while NotStarted  → NoActiveShift
/// end_shift    while NotStarted  → NoActiveShift
/// any mutation on a closed Shift → NotActive
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// A shift is already open on this terminal.
    #[error("already active: shift {shift_id} is open")]
    AlreadyActive { shift_id: String },

    /// No shift is open on this terminal.
    #[error("no active shift")]
    NoActiveShift,

    /// The shift instance exists but is not Active.
    #[error("shift {shift_id} is {status}, cannot {operation}")]
    NotActive {
        shift_id: String,
        status: ShiftStatus,
        operation: &'static str,
    },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements and are always
/// raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
