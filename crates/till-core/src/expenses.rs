//! # Expense Ledger
//!
//! Cash paid out of the drawer during a shift.
//!
//! ```text
//! append("Supplies", 50000, "bags") ──► validate ──► Expense { id, .. } ──► push
//!                                          │
//!                                          └── rejected: ledger unchanged
//! ```
//!
//! The ledger is append-only. A mistaken entry is corrected by the operator
//! recording a new one; nothing is edited or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ExpenseCategory;
use crate::validation::{
    validate_expense_amount, validate_expense_category, validate_expense_note, ValidationResult,
};
use crate::MAX_AMOUNT_MINOR;

/// One recorded payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub category: ExpenseCategory,
    /// Always > 0.
    pub amount: Money,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

/// Ordered, append-only list of a shift's expenses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseLedger {
    entries: Vec<Expense>,
}

impl ExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and appends an expense.
    ///
    /// ## Errors
    /// - `NotAllowed` if the category isn't recognized
    /// - `MustBePositive` if `amount <= 0`
    /// - `OutOfRange` if the amount, or the running total it would produce,
    ///   exceeds `MAX_AMOUNT_MINOR`
    /// - `TooLong` if the note exceeds the limit
    ///
    /// On error the ledger is untouched.
    pub fn append(
        &mut self,
        category: &str,
        amount: Money,
        note: Option<&str>,
        recorded_at: DateTime<Utc>,
    ) -> ValidationResult<&Expense> {
        let category = validate_expense_category(category)?;
        validate_expense_amount(amount)?;
        let note = validate_expense_note(note)?;

        match self.total().checked_add(amount) {
            Some(total) if total.minor() <= MAX_AMOUNT_MINOR => {}
            _ => {
                return Err(ValidationError::OutOfRange {
                    field: "expenses_total".to_string(),
                    min: 0,
                    max: MAX_AMOUNT_MINOR,
                })
            }
        }

        self.entries.push(Expense {
            id: Uuid::new_v4().to_string(),
            category,
            amount,
            note,
            recorded_at,
        });

        // Just pushed, so the slice is non-empty.
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Sum of every entry. Zero when empty.
    pub fn total(&self) -> Money {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Entries in the order they were recorded.
    pub fn entries(&self) -> &[Expense] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_total() {
        let mut ledger = ExpenseLedger::new();
        let now = Utc::now();

        ledger
            .append("Supplies", Money::from_minor(50_000), Some("plastic bags"), now)
            .unwrap();
        ledger
            .append("ProviderTip", Money::from_minor(20_000), None, now)
            .unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.total().minor(), 70_000);
        assert_eq!(ledger.entries()[0].category, ExpenseCategory::Supplies);
        assert_eq!(ledger.entries()[0].note.as_deref(), Some("plastic bags"));
        assert_eq!(ledger.entries()[1].category, ExpenseCategory::ProviderTip);
    }

    #[test]
    fn test_append_assigns_unique_ids() {
        let mut ledger = ExpenseLedger::new();
        let now = Utc::now();
        let a = ledger.append("Snack", Money::from_minor(1), None, now).unwrap().id.clone();
        let b = ledger.append("Snack", Money::from_minor(1), None, now).unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejected_expense_leaves_ledger_unchanged() {
        let mut ledger = ExpenseLedger::new();
        let now = Utc::now();
        ledger.append("Snack", Money::from_minor(10_000), None, now).unwrap();

        let err = ledger
            .append("Supplies", Money::from_minor(-50_000), None, now)
            .unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));

        let err = ledger
            .append("Rent", Money::from_minor(50_000), None, now)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { .. }));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.total().minor(), 10_000);
    }

    #[test]
    fn test_running_total_is_bounded() {
        let mut ledger = ExpenseLedger::new();
        let now = Utc::now();

        let err = ledger
            .append("Supplies", Money::from_minor(i64::MAX), None, now)
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        ledger
            .append("Supplies", Money::from_minor(MAX_AMOUNT_MINOR), None, now)
            .unwrap();
        let err = ledger
            .append("Supplies", Money::from_minor(1), None, now)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange { ref field, .. } if field == "expenses_total"
        ));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.total().minor(), MAX_AMOUNT_MINOR);
    }

    #[test]
    fn test_empty_ledger_total_is_zero() {
        let ledger = ExpenseLedger::new();
        assert!(ledger.is_empty());
        assert!(ledger.total().is_zero());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut ledger = ExpenseLedger::new();
        ledger
            .append("Maintenance", Money::from_minor(75_000), Some("door hinge"), Utc::now())
            .unwrap();

        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["category"], "maintenance");
        assert_eq!(json[0]["amount"], 75_000);

        let back: ExpenseLedger = serde_json::from_value(json).unwrap();
        assert_eq!(back, ledger);
    }
}
