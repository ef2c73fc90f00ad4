//! # Database Handle
//!
//! Opens the terminal's SQLite file and hands out repositories.
//!
//! ## Connection Budget
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One terminal, one ShiftManager                                         │
//! │                                                                         │
//! │  read-write file (the terminal)          2 connections, WAL             │
//! │    ├── shift writes   start / expense / refresh save / close            │
//! │    │                  (already serialized by the manager's state lock)  │
//! │    └── ledger read    refresh, runs with the state unlocked             │
//! │                                                                         │
//! │  read-only file (shift-report)           1 connection, never migrates  │
//! │  in-memory (tests)                       1 connection, kept alive       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL lets the ledger read and a shift write proceed together, and lets a
//! report read while the terminal is running. A second process writing the
//! same file (the seed binary) waits up to `BUSY_TIMEOUT` for the lock.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::sale::SaleRepository;
use crate::repository::shift::ShiftRepository;

/// One connection for shift writes, one for the ledger read.
const READ_WRITE_CONNECTIONS: u32 = 2;

/// How long a statement waits on another process's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a caller waits for a free connection before `DbError::Busy`.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// How the database file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Created if missing, migrated on open.
    ReadWrite,
    /// Must already exist; nothing is written.
    ReadOnly,
}

/// Where the database lives and how to open it.
///
/// ```rust,ignore
/// let terminal = DbConfig::new("/var/lib/till/till.db");
/// let report = DbConfig::read_only("/var/lib/till/till.db");
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub access: Access,
    pub run_migrations: bool,
}

impl DbConfig {
    /// The terminal's own database: created if missing and migrated.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            access: Access::ReadWrite,
            run_migrations: true,
        }
    }

    /// An existing database, opened for inspection only.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            access: Access::ReadOnly,
            run_migrations: false,
        }
    }

    /// A private in-memory database, migrated. For tests.
    pub fn in_memory() -> Self {
        DbConfig::new(IN_MEMORY)
    }

    /// Sets whether a read-write open applies pending migrations.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn max_connections(&self) -> u32 {
        if self.is_in_memory() || self.access == Access::ReadOnly {
            // An in-memory database lives and dies with its one connection.
            1
        } else {
            READ_WRITE_CONNECTIONS
        }
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        if self.is_in_memory() {
            return Ok(SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true));
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.database_path)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        Ok(match self.access {
            Access::ReadWrite => options
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                // A crash may lose the last commit, never corrupt the file.
                .synchronous(SqliteSynchronous::Normal),
            Access::ReadOnly => options.read_only(true),
        })
    }
}

// =============================================================================
// Database
// =============================================================================

/// Open database. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database and, for a read-write open, migrates it.
    ///
    /// ## Errors
    /// - `Open` if the file can't be opened (missing, for a read-only open)
    /// - `Migration` if the schema can't be brought up to date
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        let path = config.database_path.display().to_string();
        let open_failed = |e: sqlx::Error| DbError::Open {
            path: path.clone(),
            reason: e.to_string(),
        };

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT);
        if config.is_in_memory() {
            pool_options = pool_options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = pool_options
            .connect_with(config.connect_options().map_err(open_failed)?)
            .await
            .map_err(open_failed)?;

        info!(
            path = %path,
            access = ?config.access,
            connections = config.max_connections(),
            "Database opened"
        );

        if config.run_migrations && config.access == Access::ReadWrite {
            migrations::apply(&pool).await?;
        }

        Ok(Database { pool })
    }

    /// Returns the shift record repository.
    pub fn shifts(&self) -> ShiftRepository {
        ShiftRepository::new(self.pool.clone())
    }

    /// Returns the sales ledger repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Embedded versus applied migrations.
    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::status(&self.pool).await
    }

    /// Closes every connection. Later calls fail with `DbError::Closed`.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// True if the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
