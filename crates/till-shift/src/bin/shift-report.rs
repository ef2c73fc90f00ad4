//! # Shift Report
//!
//! Prints a terminal's active shift snapshot and closed shift history as
//! JSON. The database is opened read-only and must already exist; it is
//! never created or migrated, so the report is safe to run beside a live
//! terminal.
//!
//! ## Usage
//! ```bash
//! # Terminal and database from till.toml / TILL_* variables
//! cargo run -p till-shift --bin shift-report
//!
//! # Another terminal, explicit config file
//! cargo run -p till-shift --bin shift-report -- --terminal register-2 --config ./till.toml
//!
//! # Also re-read today's cash sales from the ledger
//! cargo run -p till-shift --bin shift-report -- --live
//! ```

use serde_json::json;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use till_db::{Database, DbConfig};
use till_shift::{
    init_tracing, ShiftConfig, ShiftDeps, ShiftManager, SqliteSalesLedger, SqliteShiftStore,
    SystemClock,
};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut terminal: Option<String> = None;
    let mut live = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--terminal" | "-t" => {
                if i + 1 < args.len() {
                    terminal = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--live" => live = true,
            "--help" | "-h" => {
                println!("Till Shift Report");
                println!();
                println!("Usage: shift-report [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>     Config file (default: platform config dir)");
                println!("  -t, --terminal <ID>     Terminal to report on (default: from config)");
                println!("      --live              Re-read today's cash sales from the ledger");
                println!("  -h, --help              Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = ShiftConfig::load_or_default(config_path);
    if let Some(terminal) = terminal {
        config.terminal.id = terminal;
    }
    config.validate()?;

    let db = Database::new(DbConfig::read_only(config.database_path())).await?;
    let schema = db.migration_status().await?;
    if !schema.is_current() {
        db.close().await;
        return Err(format!(
            "database schema is behind ({} of {} migrations applied); open it from the terminal first",
            schema.applied, schema.total
        )
        .into());
    }

    let deps = ShiftDeps::new(
        Arc::new(SqliteShiftStore::new(db.shifts(), config.terminal_id())),
        Arc::new(SqliteSalesLedger::new(db.sales(), config.aggregator())),
        Arc::new(SystemClock),
    );
    let manager = ShiftManager::restore(&config, deps).await?;

    let mut snapshot = manager.snapshot().await;
    if live {
        if let Some(current) = snapshot.as_mut() {
            match manager.compute_cash_sales_total(current.date).await {
                Ok(total) => {
                    let split = till_core::split(total, config.ratio());
                    current.closing_cash_preview =
                        current.opening_float + total - current.expenses_total;
                    current.cash_sales_total = total;
                    current.provider_share = split.provider_share;
                    current.business_share = split.business_share;
                }
                Err(e) => {
                    warn!(error = %e, "Ledger unavailable, reporting last stored total");
                    current.last_refresh_error = Some(e.to_string());
                }
            }
        }
    }

    let history = manager.history().await?;

    let report = json!({
        "terminal": config.terminal_id(),
        "active": snapshot,
        "history": history,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    db.close().await;
    Ok(())
}
