//! # Validation Module
//!
//! Input validation for shift operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (UI / API)                                            │
//! │  └── Form feedback (out of scope here)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── opening float >= 0, every amount <= MAX_AMOUNT_MINOR               │
//! │  ├── expense amount > 0, category recognized, note length              │
//! │  └── operator name present                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / CHECK constraints                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//! use till_core::validation::{validate_expense_amount, validate_opening_float};
//!
//! assert!(validate_opening_float(Money::from_minor(500_000)).is_ok());
//! assert!(validate_expense_amount(Money::zero()).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ExpenseCategory;
use crate::{MAX_AMOUNT_MINOR, MAX_EXPENSE_NOTE_LEN, MAX_OPERATOR_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Money Validators
// =============================================================================

fn validate_upper_bound(field: &str, min: i64, amount: Money) -> ValidationResult<()> {
    if amount.minor() > MAX_AMOUNT_MINOR {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT_MINOR,
        });
    }

    Ok(())
}

/// Validates the opening float.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (drawer opened empty)
/// - At most `MAX_AMOUNT_MINOR`
pub fn validate_opening_float(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "opening_float".to_string(),
        });
    }

    validate_upper_bound("opening_float", 0, amount)
}

/// Validates an expense amount.
///
/// ## Rules
/// - Must be strictly positive (> 0)
/// - At most `MAX_AMOUNT_MINOR`
/// - Corrections are new entries, never negative amounts
pub fn validate_expense_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    validate_upper_bound("amount", 1, amount)
}

/// Validates a counted-cash figure entered at close.
pub fn validate_counted_cash(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "counted_cash".to_string(),
        });
    }

    validate_upper_bound("counted_cash", 0, amount)
}

/// Validates a cash sales total read from the ledger.
pub fn validate_cash_sales_total(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "cash_sales_total".to_string(),
            min: 0,
            max: MAX_AMOUNT_MINOR,
        });
    }

    validate_upper_bound("cash_sales_total", 0, amount)
}

/// Validates a revenue ratio in basis points (0% to 100%).
pub fn validate_ratio_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "provider_ratio_bps".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Parses an expense category name.
///
/// ## Example
/// ```rust
/// use till_core::types::ExpenseCategory;
/// use till_core::validation::validate_expense_category;
///
/// assert_eq!(validate_expense_category("Supplies").unwrap(), ExpenseCategory::Supplies);
/// assert!(validate_expense_category("Rent").is_err());
/// ```
pub fn validate_expense_category(category: &str) -> ValidationResult<ExpenseCategory> {
    if category.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        });
    }

    category.trim().parse()
}

/// Normalizes an optional expense note.
///
/// ## Rules
/// - Surrounding whitespace is trimmed
/// - Empty notes become `None`
/// - At most `MAX_EXPENSE_NOTE_LEN` characters
pub fn validate_expense_note(note: Option<&str>) -> ValidationResult<Option<String>> {
    let note = match note.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(note) => note,
    };

    if note.chars().count() > MAX_EXPENSE_NOTE_LEN {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_EXPENSE_NOTE_LEN,
        });
    }

    Ok(Some(note.to_string()))
}

/// Validates the operator running the drawer.
///
/// ## Returns
/// The trimmed operator name.
pub fn validate_operator(operator: &str) -> ValidationResult<String> {
    let operator = operator.trim();

    if operator.is_empty() {
        return Err(ValidationError::Required {
            field: "operator".to_string(),
        });
    }

    if operator.chars().count() > MAX_OPERATOR_LEN {
        return Err(ValidationError::TooLong {
            field: "operator".to_string(),
            max: MAX_OPERATOR_LEN,
        });
    }

    Ok(operator.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
