//! # Demo Data Generator
//!
//! Writes a seeded shop snapshot with demo customers and visit history.
//!
//! ## Usage
//! ```bash
//! # 20 customers (default)
//! cargo run -p barberia-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p barberia-db --bin seed -- --count 50 --db ./data/barberia.db
//! ```
//!
//! Visits go through the normal checkout and settlement path, so stamps,
//! tiers and the ledger are consistent with what the front desk would
//! have produced.

use barberia_core::checkout::{open_order, OrderDraft};
use barberia_core::customers::find_or_create_customer;
use barberia_core::settlement::settle_order;
use barberia_core::{Snapshot, BEARD, CLEAN_CUT, EYEBROWS, FULL_HAIR_CUT};
use barberia_db::{Database, DbConfig};
use chrono::{Duration, Utc};
use std::env;

const FIRST_NAMES: &[&str] = &[
    "Andres", "Camilo", "Santiago", "Mateo", "Juan", "Felipe", "Sebastian", "Daniel", "Julian",
    "Nicolas", "Carlos", "David", "Alejandro", "Miguel", "Jorge",
];

/// Service combos cycled through by visit index
const COMBOS: &[&[&str]] = &[
    &[FULL_HAIR_CUT],
    &[FULL_HAIR_CUT, BEARD],
    &[CLEAN_CUT],
    &[BEARD],
    &[CLEAN_CUT, EYEBROWS],
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 20;
    let mut db_path = String::from("./barberia_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Barberia Demo Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of customers to generate (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./barberia_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Barberia Demo Data Generator");
    println!("============================");
    println!("Database:  {}", db_path);
    println!("Customers: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");

    if let Some(existing) = db.snapshots().load().await? {
        if !existing.customers.is_empty() {
            println!("⚠ Database already has {} customers", existing.customers.len());
            println!("  Skipping seed. Delete the database file to regenerate.");
            return Ok(());
        }
    }

    let mut snapshot = Snapshot::seeded();
    let barbers: Vec<u32> = snapshot.barbers.iter().map(|b| b.id).collect();
    let today = Utc::now();
    let mut visits = 0;

    for n in 0..count {
        let phone = format!("300{:07}", 1_000_000 + n * 7_919);
        let name = FIRST_NAMES[n % FIRST_NAMES.len()];
        // 0..=7 visits, spaced 12 days apart, most recent first
        let history = (n * 5) % 8;
        let first_visit = today - Duration::days(12 * history as i64 + 1);

        find_or_create_customer(&mut snapshot, &phone, Some(name), first_visit)?;

        for visit in (0..history).rev() {
            let at = today - Duration::days(12 * visit as i64 + 1);
            let combo = COMBOS[(n + visit) % COMBOS.len()];
            let draft = OrderDraft {
                customer_phone: phone.clone(),
                barber_id: barbers[(n + visit) % barbers.len()],
                services: combo.iter().map(|s| s.to_string()).collect(),
                reward_id: None,
                appointment_id: None,
            };
            let order = open_order(&mut snapshot, draft, at)?;
            settle_order(&mut snapshot, &order.id, at)?;
            visits += 1;
        }
    }

    db.snapshots().save(&snapshot).await?;

    println!("✓ Generated {} customers with {} paid visits", count, visits);
    println!("  Ledger entries: {}", snapshot.ledger.len());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
