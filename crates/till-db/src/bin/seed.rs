//! # Seed Data Generator
//!
//! Populates the sales ledger with a day of mixed-tender sales for
//! development.
//!
//! ## Usage
//! ```bash
//! # 40 sales for today (default)
//! cargo run -p till-db --bin seed
//!
//! # Custom amount and day
//! cargo run -p till-db --bin seed -- --count 120 --date 2024-03-01
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! ## Generated Sales
//! Sales are spread across opening hours (08:00 - 20:00 UTC) and cycle
//! through the tender mixes a drawer actually sees:
//! - Cash only
//! - Card only
//! - E-wallet only
//! - Cash + card split tender
//! - Two cash lines (customer paid in two parts)

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::env;
use till_core::{LedgerPayment, LedgerSale, Money, PaymentMethod};
use till_db::{Database, DbConfig};
use uuid::Uuid;

/// Base prices in minor units, cycled through by sale index
const PRICES: &[i64] = &[
    15_000, 22_500, 35_000, 48_000, 62_500, 75_000, 99_000, 120_000, 185_000, 250_000,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./till_dev.db");
    let mut date = Utc::now().date_naive();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--date" => {
                if i + 1 < args.len() {
                    date = NaiveDate::parse_from_str(&args[i + 1], "%Y-%m-%d")?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of sales to generate (default: 40)");
                println!("  -d, --db <PATH>      Database file path (default: ./till_dev.db)");
                println!("      --date <DATE>    Business day, YYYY-MM-DD (default: today UTC)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Till Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Date:     {}", date);
    println!("Sales:    {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.sales().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} sales", existing);
        println!("  New sales are added alongside them.");
    }

    println!();
    println!("Generating sales...");

    let opening = Utc.from_utc_datetime(&date.and_hms_opt(8, 0, 0).ok_or("invalid date")?);
    let step = Duration::seconds(12 * 3600 / count.max(1) as i64);

    let mut generated = 0;
    let mut cash_total = Money::zero();

    for index in 0..count {
        let sale = generate_sale(index, opening + step * index as i32);

        if let Err(e) = db.sales().insert_sale(&sale).await {
            eprintln!("Failed to insert {}: {}", sale.receipt_number, e);
            continue;
        }

        cash_total += sale.cash_amount();
        generated += 1;
    }

    println!();
    println!("✓ Generated {} sales", generated);
    println!("  Cash tendered: {}", cash_total);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single sale whose tender mix depends on its index.
fn generate_sale(index: usize, at: chrono::DateTime<Utc>) -> LedgerSale {
    let total = PRICES[index % PRICES.len()];

    let payments = match index % 5 {
        0 => vec![LedgerPayment::new(PaymentMethod::Cash, Money::from_minor(total))],
        1 => vec![LedgerPayment::new(PaymentMethod::Card, Money::from_minor(total))],
        2 => vec![LedgerPayment::new(PaymentMethod::EWallet, Money::from_minor(total))],
        3 => {
            let cash = total / 4;
            vec![
                LedgerPayment::new(PaymentMethod::Cash, Money::from_minor(cash)),
                LedgerPayment::new(PaymentMethod::Card, Money::from_minor(total - cash)),
            ]
        }
        _ => {
            let first = total / 2;
            vec![
                LedgerPayment::new(PaymentMethod::Cash, Money::from_minor(first)),
                LedgerPayment::new(PaymentMethod::Cash, Money::from_minor(total - first)),
            ]
        }
    };

    LedgerSale {
        id: Uuid::new_v4().to_string(),
        receipt_number: format!("{}-{:04}-{}", at.format("%Y%m%d"), index + 1, &Uuid::new_v4().simple().to_string()[..6]),
        timestamp: at,
        total: Money::from_minor(total),
        payments,
    }
}
