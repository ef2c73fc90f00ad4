//! # Database Error Types
//!
//! What can go wrong between the shift engine and its SQLite file.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error ──────────┬── ErrorKind::UniqueViolation ─► Duplicate      │
//! │                        ├── other constraint kinds ────► Rejected       │
//! │                        ├── PoolTimedOut ───────────────► Busy           │
//! │                        ├── PoolClosed ─────────────────► Closed         │
//! │                        └── anything else ──────────────► Query          │
//! │                                                                         │
//! │  serde_json / timestamp text ──────────────────────────► Corrupt        │
//! │  MigrateError ─────────────────────────────────────────► Migration      │
//! │                                                                         │
//! │  DbError ──► ShiftError::Store (till-shift) ──► mutating call aborted   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The database file couldn't be opened.
    #[error("Cannot open database at {path}: {reason}")]
    Open { path: String, reason: String },

    /// Applying or inspecting the schema failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// A row collided with one already stored.
    ///
    /// ## When This Occurs
    /// - A receipt number seen twice in the ledger
    /// - The same shift closed into history twice
    #[error("Duplicate row: {0}")]
    Duplicate(String),

    /// SQLite refused a row (negative amount, dangling payment, missing column).
    #[error("Row rejected: {0}")]
    Rejected(String),

    /// Every connection stayed busy past the acquire timeout.
    #[error("Database busy")]
    Busy,

    /// The pool was closed.
    #[error("Database closed")]
    Closed,

    /// A stored payload or timestamp couldn't be read back.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Any other query failure.
    #[error("Query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => DbError::Duplicate(db_err.message().to_string()),
                ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => DbError::Rejected(db_err.message().to_string()),
                _ => DbError::Query(db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut => DbError::Busy,
            sqlx::Error::PoolClosed => DbError::Closed,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::Corrupt(err.to_string())
            }
            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Corrupt(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
