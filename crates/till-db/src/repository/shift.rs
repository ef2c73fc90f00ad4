//! # Shift Repository
//!
//! Durable records for the active shift and closed-shift history.
//!
//! ## Storage Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  active_shifts (one row per terminal)                                   │
//! │  ┌─────────────┬──────────┬────────┬──────────────────────────┐         │
//! │  │ terminal_id │ shift_id │ status │ payload (Shift as JSON)  │         │
//! │  └─────────────┴──────────┴────────┴──────────────────────────┘         │
//! │         │ close_shift (one transaction)                                 │
//! │         ▼                                                               │
//! │  shift_history (append-only)                                            │
//! │  ┌────┬─────────────┬────────────┬──────────┬───────────┬─────────┐     │
//! │  │ id │ terminal_id │ shift_date │ operator │ closing   │ payload │     │
//! │  └────┴─────────────┴────────────┴──────────┴───────────┴─────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The JSON payload is the source of truth; the other columns exist for
//! querying and inspection.

use chrono::Utc;
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use tracing::debug;

use super::encode_timestamp;
use crate::error::DbResult;
use till_core::{Shift, ShiftHistoryEntry};

/// Repository for shift records.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Loads the persisted shift for a terminal, if any.
    pub async fn load_active(&self, terminal_id: &str) -> DbResult<Option<Shift>> {
        let row = sqlx::query("SELECT payload FROM active_shifts WHERE terminal_id = ?1")
            .bind(terminal_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let payload: String = row.try_get("payload")?;
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }

    /// Inserts or replaces the terminal's shift record.
    pub async fn save_active(&self, shift: &Shift) -> DbResult<()> {
        let payload = serde_json::to_string(shift)?;

        debug!(
            shift_id = %shift.id,
            terminal_id = %shift.terminal_id,
            status = %shift.status,
            "Saving active shift"
        );

        sqlx::query(
            r#"
            INSERT INTO active_shifts (terminal_id, shift_id, status, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (terminal_id) DO UPDATE SET
                shift_id = excluded.shift_id,
                status = excluded.status,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&shift.terminal_id)
        .bind(&shift.id)
        .bind(shift.status)
        .bind(&payload)
        .bind(encode_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes the terminal's shift record. No-op if there is none.
    pub async fn clear_active(&self, terminal_id: &str) -> DbResult<()> {
        debug!(terminal_id = %terminal_id, "Clearing active shift");

        sqlx::query("DELETE FROM active_shifts WHERE terminal_id = ?1")
            .bind(terminal_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Appends a closed shift to history.
    pub async fn append_history(&self, entry: &ShiftHistoryEntry) -> DbResult<()> {
        insert_history(&self.pool, entry).await
    }

    /// Appends history and clears the active record in one transaction.
    ///
    /// Either both happen or neither does, so a crash mid-close never leaves
    /// a shift both open and in history.
    pub async fn close_shift(&self, entry: &ShiftHistoryEntry) -> DbResult<()> {
        debug!(
            shift_id = %entry.id(),
            terminal_id = %entry.terminal_id(),
            closing_cash = %entry.closing_cash(),
            "Closing shift"
        );

        let mut tx = self.pool.begin().await?;

        insert_history(&mut *tx, entry).await?;

        sqlx::query("DELETE FROM active_shifts WHERE terminal_id = ?1")
            .bind(entry.terminal_id())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Closed shifts for a terminal, oldest first.
    pub async fn load_history(&self, terminal_id: &str) -> DbResult<Vec<ShiftHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT payload
            FROM shift_history
            WHERE terminal_id = ?1
            ORDER BY closed_at, id
            "#,
        )
        .bind(terminal_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: String = row.try_get("payload")?;
            entries.push(serde_json::from_str(&payload)?);
        }

        Ok(entries)
    }
}

/// Writes one `shift_history` row on a pool or inside a transaction.
async fn insert_history<'e, E>(executor: E, entry: &ShiftHistoryEntry) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let payload = serde_json::to_string(entry)?;

    sqlx::query(
        r#"
        INSERT INTO shift_history (id, terminal_id, shift_date, operator, closing_cents, closed_at, payload)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(entry.id())
    .bind(entry.terminal_id())
    .bind(entry.date().to_string())
    .bind(entry.operator())
    .bind(entry.closing_cash().minor())
    .bind(encode_timestamp(entry.end_time()))
    .bind(payload)
    .execute(executor)
    .await?;

    Ok(())
}
