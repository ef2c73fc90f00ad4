//! # Sales Ledger
//!
//! Read-only seam to the completed-sales ledger.
//!
//! ```text
//! ShiftManager::compute_cash_sales_total(date)
//!      │
//!      ├── timeout(refresh_timeout, ledger.sales_for_date(date))
//!      │        │
//!      │        ├── SqliteSalesLedger ── SaleRepository::sales_between(day_bounds)
//!      │        └── MemoryLedger      ── Vec<LedgerSale> (tests)
//!      │
//!      └── SalesAggregator::cash_sales_total(sales, date)   (exact day filter)
//! ```
//!
//! Ledgers may return a superset of the day's sales; the aggregator applies
//! the exact day filter.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ShiftError, ShiftResult};
use till_core::{LedgerSale, SalesAggregator};
use till_db::SaleRepository;

/// Interface for reading completed sales.
#[async_trait]
pub trait SalesLedger: Send + Sync {
    /// Completed sales that may fall on `date`.
    ///
    /// ## Errors
    /// `LedgerUnavailable` if the ledger can't be read.
    async fn sales_for_date(&self, date: NaiveDate) -> ShiftResult<Vec<LedgerSale>>;
}

// =============================================================================
// SQLite Ledger
// =============================================================================

/// Ledger backed by the `sales` / `payments` tables.
#[derive(Debug, Clone)]
pub struct SqliteSalesLedger {
    sales: SaleRepository,
    aggregator: SalesAggregator,
}

impl SqliteSalesLedger {
    pub fn new(sales: SaleRepository, aggregator: SalesAggregator) -> Self {
        SqliteSalesLedger { sales, aggregator }
    }
}

#[async_trait]
impl SalesLedger for SqliteSalesLedger {
    async fn sales_for_date(&self, date: NaiveDate) -> ShiftResult<Vec<LedgerSale>> {
        let (start, end) = self.aggregator.day_bounds(date);
        debug!(%date, %start, %end, "Reading sales ledger");

        self.sales
            .sales_between(start, end)
            .await
            .map_err(|e| ShiftError::LedgerUnavailable(e.to_string()))
    }
}

// =============================================================================
// In-Memory Ledger
// =============================================================================

/// In-memory ledger with outage and latency injection.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    sales: RwLock<Vec<LedgerSale>>,
    unavailable: RwLock<bool>,
    delay: RwLock<Option<Duration>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, sale: LedgerSale) {
        self.sales.write().await.push(sale);
    }

    /// Makes reads fail until turned off again.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Delays every read, e.g. to trip the refresh timeout.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }
}

#[async_trait]
impl SalesLedger for MemoryLedger {
    async fn sales_for_date(&self, _date: NaiveDate) -> ShiftResult<Vec<LedgerSale>> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.unavailable.read().await {
            return Err(ShiftError::LedgerUnavailable("ledger offline".into()));
        }

        Ok(self.sales.read().await.clone())
    }
}
