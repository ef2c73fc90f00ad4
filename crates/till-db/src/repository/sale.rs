//! # Sale Repository
//!
//! Read access to the sales ledger.
//!
//! ## Ledger Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales                                payments                          │
//! │  ┌────────────────────────────┐       ┌──────────────────────────────┐  │
//! │  │ id, receipt_number         │ 1───n │ sale_id, method, amount      │  │
//! │  │ status, total, completed_at│       └──────────────────────────────┘  │
//! │  └────────────────────────────┘                                         │
//! │                                                                         │
//! │  sales_between(start, end)                                              │
//! │    1. completed sales with start <= completed_at < end                  │
//! │    2. their payments, grouped by sale                                   │
//! │    3. LedgerSale { .., payments: [..] }                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The shift engine never writes sales. `insert_sale` exists for the seed
//! binary and tests.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::{decode_timestamp, encode_timestamp};
use crate::error::DbResult;
use till_core::{LedgerPayment, LedgerSale, Money, PaymentMethod};

/// Repository for sales ledger operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Completed sales in the half-open window `[start, end)`, oldest first.
    ///
    /// Draft and voided sales are never returned. Sales and payments are read
    /// in one transaction, so a sale voided or inserted between the two reads
    /// can't leave a sale without its payments or payments without a sale.
    pub async fn sales_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<LedgerSale>> {
        let start = encode_timestamp(start);
        let end = encode_timestamp(end);

        let mut tx = self.pool.begin().await?;

        let sale_rows = sqlx::query(
            r#"
            SELECT id, receipt_number, total_cents, completed_at
            FROM sales
            WHERE status = 'completed'
              AND completed_at >= ?1
              AND completed_at < ?2
            ORDER BY completed_at, id
            "#,
        )
        .bind(&start)
        .bind(&end)
        .fetch_all(&mut *tx)
        .await?;

        let payment_rows = sqlx::query(
            r#"
            SELECT p.sale_id, p.method, p.amount_cents
            FROM payments p
            JOIN sales s ON s.id = p.sale_id
            WHERE s.status = 'completed'
              AND s.completed_at >= ?1
              AND s.completed_at < ?2
            ORDER BY p.created_at, p.id
            "#,
        )
        .bind(&start)
        .bind(&end)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut payments: HashMap<String, Vec<LedgerPayment>> = HashMap::new();
        for row in payment_rows {
            let sale_id: String = row.try_get("sale_id")?;
            let method: PaymentMethod = row.try_get("method")?;
            let amount: i64 = row.try_get("amount_cents")?;
            payments
                .entry(sale_id)
                .or_default()
                .push(LedgerPayment::new(method, Money::from_minor(amount)));
        }

        let mut sales = Vec::with_capacity(sale_rows.len());
        for row in sale_rows {
            let id: String = row.try_get("id")?;
            let completed_at: String = row.try_get("completed_at")?;
            sales.push(LedgerSale {
                receipt_number: row.try_get("receipt_number")?,
                timestamp: decode_timestamp(&completed_at)?,
                total: Money::from_minor(row.try_get("total_cents")?),
                payments: payments.remove(&id).unwrap_or_default(),
                id,
            });
        }

        debug!(count = sales.len(), start = %start, end = %end, "Loaded ledger sales");
        Ok(sales)
    }

    /// Inserts a completed sale and its payments in one transaction.
    pub async fn insert_sale(&self, sale: &LedgerSale) -> DbResult<()> {
        debug!(id = %sale.id, receipt_number = %sale.receipt_number, "Inserting sale");

        let completed_at = encode_timestamp(sale.timestamp);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (id, receipt_number, status, total_cents, completed_at, created_at)
            VALUES (?1, ?2, 'completed', ?3, ?4, ?4)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(sale.total.minor())
        .bind(&completed_at)
        .execute(&mut *tx)
        .await?;

        for payment in &sale.payments {
            sqlx::query(
                r#"
                INSERT INTO payments (id, sale_id, method, amount_cents, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(generate_payment_id())
            .bind(&sale.id)
            .bind(payment.method)
            .bind(payment.amount.minor())
            .bind(&completed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Marks a sale voided so it drops out of the ledger.
    pub async fn void_sale(&self, sale_id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE sales SET status = 'voided' WHERE id = ?1 AND status = 'completed'")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of sales rows of any status.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new payment ID.
pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}
