//! # Repository Module
//!
//! Database repository implementations for the shift engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SqliteShiftStore / SqliteSalesLedger (till-shift)                     │
//! │       │                                                                 │
//! │       │  db.shifts().save_active(&shift)                               │
//! │       │  db.sales().sales_between(start, end)                          │
//! │       ▼                                                                 │
//! │  ShiftRepository                     SaleRepository                    │
//! │  ├── load_active(terminal)           ├── sales_between(start, end)     │
//! │  ├── save_active(shift)              ├── insert_sale(sale)             │
//! │  ├── clear_active(terminal)          └── count()                       │
//! │  ├── append_history(entry)                                             │
//! │  ├── close_shift(entry)                                                │
//! │  └── load_history(terminal)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`shift::ShiftRepository`] - Active shift record and closed-shift history
//! - [`sale::SaleRepository`] - Read access to completed sales and payments

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{DbError, DbResult};

pub mod sale;
pub mod shift;

/// Fixed-width RFC 3339 (UTC, microseconds) so text order is time order.
pub(crate) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
}
