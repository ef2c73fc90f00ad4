//! # Shift
//!
//! The shift record and its state transitions.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Shift::open(float, operator)                                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌──────────┐  record_expense()       ┌──────────┐                     │
//! │   │  Active  │◄────────────────────────│  Active  │                     │
//! │   │          │  set_cash_sales_total() │          │                     │
//! │   └────┬─────┘                         └──────────┘                     │
//! │        │ close(now, counted)                                            │
//! │        ▼                                                                │
//! │   ShiftHistoryEntry (Completed, closing_cash fixed, read-only)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `close` consumes the shift, so nothing can be recorded against a shift
//! after its closing cash is computed. The resulting [`ShiftHistoryEntry`]
//! exposes getters only.
//!
//! ## Closing Cash
//! ```text
//! closing_cash = opening_float + cash_sales_total - Σ expenses.amount
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreResult, StateError};
use crate::expenses::{Expense, ExpenseLedger};
use crate::money::Money;
use crate::split::{split, RevenueSplit};
use crate::types::{RevenueRatio, ShiftStatus};
use crate::validation::{
    validate_cash_sales_total, validate_counted_cash, validate_opening_float, validate_operator,
};

// =============================================================================
// Shift
// =============================================================================

/// A cash-drawer shift on one terminal.
///
/// Serialized as the flat JSON record persisted by the shift store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub terminal_id: String,
    /// Business day the shift belongs to.
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub status: ShiftStatus,
    /// Set at open and never changed.
    pub opening_float: Money,
    pub operator: String,
    /// Last value read from the sales ledger. Replaced, never accumulated.
    pub cash_sales_total: Money,
    #[ts(as = "Vec<Expense>")]
    pub expenses: ExpenseLedger,
    /// Present only once Completed.
    pub closing_cash: Option<Money>,
    /// Physically counted cash, if the operator entered one at close.
    #[serde(default)]
    pub counted_cash: Option<Money>,
}

impl Shift {
    /// Opens a new Active shift.
    ///
    /// ## Errors
    /// - `MustNotBeNegative` if `opening_float < 0`
    /// - `Required` / `TooLong` for a bad operator name
    pub fn open(
        terminal_id: &str,
        operator: &str,
        opening_float: Money,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> CoreResult<Shift> {
        validate_opening_float(opening_float)?;
        let operator = validate_operator(operator)?;

        Ok(Shift {
            id: Uuid::new_v4().to_string(),
            terminal_id: terminal_id.to_string(),
            date,
            start_time: now,
            end_time: None,
            status: ShiftStatus::Active,
            opening_float,
            operator,
            cash_sales_total: Money::zero(),
            expenses: ExpenseLedger::new(),
            closing_cash: None,
            counted_cash: None,
        })
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ShiftStatus::Active
    }

    fn ensure_active(&self, operation: &'static str) -> Result<(), StateError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(StateError::NotActive {
                shift_id: self.id.clone(),
                status: self.status,
                operation,
            })
        }
    }

    /// Appends an expense to this shift.
    pub fn record_expense(
        &mut self,
        category: &str,
        amount: Money,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<&Expense> {
        self.ensure_active("add expense")?;
        Ok(self.expenses.append(category, amount, note, now)?)
    }

    /// Replaces the cash sales total with a fresh ledger reading.
    ///
    /// Returns whether the value changed.
    ///
    /// ## Errors
    /// - `NotActive` if the shift isn't Active
    /// - `OutOfRange` for a negative total or one above `MAX_AMOUNT_MINOR`
    pub fn set_cash_sales_total(&mut self, total: Money) -> CoreResult<bool> {
        self.ensure_active("refresh cash sales")?;
        validate_cash_sales_total(total)?;
        let changed = self.cash_sales_total != total;
        self.cash_sales_total = total;
        Ok(changed)
    }

    pub fn expenses_total(&self) -> Money {
        self.expenses.total()
    }

    /// What the drawer should hold right now.
    pub fn closing_cash_preview(&self) -> Money {
        self.opening_float + self.cash_sales_total - self.expenses.total()
    }

    pub fn revenue_split(&self, ratio: RevenueRatio) -> RevenueSplit {
        split(self.cash_sales_total, ratio)
    }

    /// Closes the shift, fixing its closing cash.
    ///
    /// ## Errors
    /// - `NotActive` if the shift isn't Active
    /// - `MustNotBeNegative` for a negative counted amount
    /// - `OutOfRange` for a counted amount above `MAX_AMOUNT_MINOR`
    pub fn close(
        mut self,
        now: DateTime<Utc>,
        counted_cash: Option<Money>,
    ) -> CoreResult<ShiftHistoryEntry> {
        self.ensure_active("end shift")?;
        if let Some(counted) = counted_cash {
            validate_counted_cash(counted)?;
        }

        self.closing_cash = Some(self.closing_cash_preview());
        self.counted_cash = counted_cash;
        self.end_time = Some(now);
        self.status = ShiftStatus::Completed;

        Ok(ShiftHistoryEntry { shift: self })
    }
}

// =============================================================================
// Shift History Entry
// =============================================================================

/// Read-only record of a Completed shift.
///
/// Only [`Shift::close`] creates one. Deserialization exists for loading
/// history back from a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftHistoryEntry {
    shift: Shift,
}

impl ShiftHistoryEntry {
    pub fn id(&self) -> &str {
        &self.shift.id
    }

    pub fn terminal_id(&self) -> &str {
        &self.shift.terminal_id
    }

    pub fn date(&self) -> NaiveDate {
        self.shift.date
    }

    pub fn operator(&self) -> &str {
        &self.shift.operator
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.shift.start_time
    }

    /// Always present on a closed shift; falls back to start time for
    /// records that somehow lack it.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.shift.end_time.unwrap_or(self.shift.start_time)
    }

    pub fn opening_float(&self) -> Money {
        self.shift.opening_float
    }

    pub fn cash_sales_total(&self) -> Money {
        self.shift.cash_sales_total
    }

    pub fn expenses(&self) -> &[Expense] {
        self.shift.expenses.entries()
    }

    pub fn expenses_total(&self) -> Money {
        self.shift.expenses.total()
    }

    pub fn closing_cash(&self) -> Money {
        self.shift
            .closing_cash
            .unwrap_or_else(|| self.shift.closing_cash_preview())
    }

    pub fn counted_cash(&self) -> Option<Money> {
        self.shift.counted_cash
    }

    /// `counted - closing`: positive means the drawer is over.
    pub fn cash_variance(&self) -> Option<Money> {
        self.shift.counted_cash.map(|counted| counted - self.closing_cash())
    }

    pub fn revenue_split(&self, ratio: RevenueRatio) -> RevenueSplit {
        self.shift.revenue_split(ratio)
    }

    /// The closed shift record.
    pub fn shift(&self) -> &Shift {
        &self.shift
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
