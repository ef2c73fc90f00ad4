//! # Domain Types
//!
//! Value types shared by the shift engine and its collaborators.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ShiftStatus    │   │ ExpenseCategory │   │  RevenueRatio   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  NotStarted     │   │  Supplies       │   │  bps (u32)      │       │
//! │  │  Active         │   │  ProviderTip    │   │  7000 = 70%     │       │
//! │  │  Completed      │   │  Snack, ...     │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   LedgerSale    │   │  LedgerPayment  │   │  PaymentMethod  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, timestamp  │──►│  method         │   │  Cash           │       │
//! │  │  payments[]     │   │  amount         │   │  Card, EWallet  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::expenses::Expense;
use crate::money::Money;
use crate::DEFAULT_PROVIDER_RATIO_BPS;

// =============================================================================
// Revenue Ratio
// =============================================================================

/// Provider share of cash sales, in basis points.
///
/// 1 basis point = 0.01%, so 7000 bps = 70%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevenueRatio(u32);

impl RevenueRatio {
    /// Creates a ratio from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        RevenueRatio(bps)
    }

    /// Returns the ratio in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the ratio as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for RevenueRatio {
    fn default() -> Self {
        RevenueRatio(DEFAULT_PROVIDER_RATIO_BPS)
    }
}

// =============================================================================
// Shift Status
// =============================================================================

/// Lifecycle status of a shift.
///
/// ```text
/// NotStarted ──start_shift──► Active ──end_shift──► Completed
///      ▲                                                │
///      └──────────── terminal is free again ────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    /// No shift has been opened on the drawer.
    #[default]
    NotStarted,
    /// Shift is open; expenses and refreshes are accepted.
    Active,
    /// Shift was closed and its closing cash is fixed.
    Completed,
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftStatus::NotStarted => write!(f, "not_started"),
            ShiftStatus::Active => write!(f, "active"),
            ShiftStatus::Completed => write!(f, "completed"),
        }
    }
}

// =============================================================================
// Expense Category
// =============================================================================

/// Recognized expense categories for drawer payouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    /// Consumables bought for the shop (bags, cleaning products).
    Supplies,
    /// Tip paid out to the service provider.
    ProviderTip,
    /// Food or drinks for staff.
    Snack,
    /// Small repairs.
    Maintenance,
    /// Anything else operational.
    OtherOperational,
}

impl ExpenseCategory {
    /// Every recognized category, in display order.
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Supplies,
        ExpenseCategory::ProviderTip,
        ExpenseCategory::Snack,
        ExpenseCategory::Maintenance,
        ExpenseCategory::OtherOperational,
    ];

    /// Canonical name, as callers send it.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Supplies => "Supplies",
            ExpenseCategory::ProviderTip => "ProviderTip",
            ExpenseCategory::Snack => "Snack",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::OtherOperational => "OtherOperational",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a category name.
///
/// Case, spaces, hyphens and underscores are ignored, so `"Supplies"`,
/// `"provider_tip"` and `"Other Operational"` are all accepted.
impl FromStr for ExpenseCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        ExpenseCategory::ALL
            .into_iter()
            .find(|category| category.as_str().to_lowercase() == key)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: ExpenseCategory::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Tender used for (part of) a sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash into the drawer.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// QR / mobile wallet.
    EWallet,
    /// Direct bank transfer.
    BankTransfer,
}

impl PaymentMethod {
    /// Only cash ends up in the drawer.
    #[inline]
    pub const fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

// =============================================================================
// Ledger Records
// =============================================================================

/// One tender line of a completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerPayment {
    pub method: PaymentMethod,
    pub amount: Money,
}

impl LedgerPayment {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        LedgerPayment { method, amount }
    }
}

/// A completed sale as reported by the sales ledger (read-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerSale {
    pub id: String,
    pub receipt_number: String,
    /// When the sale was completed.
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
    /// Grand total across all tenders.
    pub total: Money,
    /// Tender breakdown. A split-tender sale has several entries.
    pub payments: Vec<LedgerPayment>,
}

impl LedgerSale {
    /// Sum of every cash-tagged payment on this sale.
    ///
    /// A mixed cash + card sale contributes only its cash portion, and a sale
    /// with two cash lines contributes both.
    pub fn cash_amount(&self) -> Money {
        self.payments
            .iter()
            .filter(|p| p.method.is_cash())
            .map(|p| p.amount)
            .sum()
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Read model of the active shift returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSnapshot {
    pub shift_id: String,
    pub operator: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub status: ShiftStatus,
    pub opening_float: Money,
    pub cash_sales_total: Money,
    pub expenses: Vec<Expense>,
    pub expenses_total: Money,
    pub closing_cash_preview: Money,
    pub provider_share: Money,
    pub business_share: Money,
    /// Last successful ledger refresh, if any.
    #[ts(as = "Option<String>")]
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Set while the ledger is failing; `cash_sales_total` is then stale.
    pub last_refresh_error: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
