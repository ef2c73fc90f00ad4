//! # Database Migrations
//!
//! The schema ships inside the binary. A terminal that opens its database
//! read-write brings it up to date before any shift is restored. Read-only
//! openers (the report binary) only ask how far behind it is.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   sales, payments, active_shifts, shift_history
//!
//! Database::new(read-write) ──► apply()  ──► _sqlx_migrations updated
//! Database::new(read-only)  ──► status() ──► MigrationStatus { total, applied }
//! ```
//!
//! New schema goes in a new `NNN_description.sql` file. Applied files are
//! checksummed, so editing one breaks every terminal that already ran it.

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// How many embedded migrations a database has applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    pub total: usize,
    pub applied: usize,
}

impl MigrationStatus {
    /// True when every embedded migration has been applied.
    pub fn is_current(&self) -> bool {
        self.applied >= self.total
    }
}

/// Applies pending migrations in filename order, each in its own transaction.
pub async fn apply(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(total = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

/// Reads the applied count without changing anything.
///
/// A database that was never migrated has no `_sqlx_migrations` table and
/// reports zero applied.
pub async fn status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let total = MIGRATOR.migrations.len();

    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    let applied = if tracked == 0 {
        0
    } else {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    };

    let status = MigrationStatus {
        total,
        applied: usize::try_from(applied).unwrap_or(0),
    };
    if !status.is_current() {
        warn!(total = status.total, applied = status.applied, "Schema is behind");
    }
    Ok(status)
}
