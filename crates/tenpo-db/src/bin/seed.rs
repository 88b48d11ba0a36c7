//! # Seed Data Generator
//!
//! Populates the database with a small demo chain for development.
//!
//! ## Usage
//! ```bash
//! # Seed the current month into ./tenpo_dev.db
//! cargo run -p tenpo-db --bin seed
//!
//! # Seed a specific month
//! cargo run -p tenpo-db --bin seed -- --month 2025-12
//!
//! # Specify database path
//! cargo run -p tenpo-db --bin seed -- --db ./data/tenpo.db
//! ```
//!
//! ## Generated Data
//! - Three brands of different business types
//! - Five stores, one of them split into lunch and dinner slices
//! - One record per store per day up to the end of the month
//! - A monthly expense baseline and a balanced target for every store

use std::env;

use chrono::{Datelike, Local};
use tenpo_core::expense::MonthlyExpenseBaseline;
use tenpo_core::templates::{BrandType, TargetTemplate, TemplateProfile};
use tenpo_core::validation::normalize;
use tenpo_core::{DailyRecord, DailyTarget, Money, OperationSlice, OverheadCosts, RawDailyRecord, YearMonth};
use tenpo_db::{Brand, Database, DbConfig, Store};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// `(brand_id, name, type)`
const BRANDS: &[(&str, &str, BrandType)] = &[
    ("menya", "Menya Hinode", BrandType::Ramen),
    ("torikin", "Torikin Izakaya", BrandType::Izakaya),
    ("komorebi", "Komorebi Cafe", BrandType::Cafe),
];

/// `(store_id, name, brand_id, base daily sales, split lunch/dinner)`
const STORES: &[(&str, &str, &str, i64, bool)] = &[
    ("menya-shibuya", "Menya Shibuya", "menya", 280_000, false),
    ("menya-ikebukuro", "Menya Ikebukuro", "menya", 220_000, false),
    ("torikin-shinjuku", "Torikin Shinjuku", "torikin", 350_000, true),
    ("torikin-ueno", "Torikin Ueno", "torikin", 260_000, false),
    ("komorebi-nakameguro", "Komorebi Nakameguro", "komorebi", 140_000, false),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tenpo_dev.db");
    let mut month = YearMonth::from_date(Local::now().date_naive());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--month" | "-m" => {
                if i + 1 < args.len() {
                    month = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tenpo Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --month <YYYY-MM>  Month to generate (default: current month)");
                println!("  -d, --db <PATH>        Database file path (default: ./tenpo_dev.db)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tenpo Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Month:    {}", month);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.records().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} records", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, name, brand_type) in BRANDS {
        db.stores()
            .upsert_brand(&Brand {
                id: (*id).into(),
                name: (*name).into(),
                brand_type: *brand_type,
            })
            .await?;
    }

    for (id, name, brand_id, _, _) in STORES {
        db.stores()
            .upsert(&Store {
                id: (*id).into(),
                name: (*name).into(),
                brand_id: Some((*brand_id).into()),
            })
            .await?;
    }
    println!("✓ {} brands, {} stores", BRANDS.len(), STORES.len());

    let start = std::time::Instant::now();
    let mut records = Vec::new();
    for (index, (store_id, _, _, base_sales, split)) in STORES.iter().enumerate() {
        for day in 1..=month.days_in_month() {
            let slices: &[OperationSlice] = if *split {
                &[OperationSlice::Lunch, OperationSlice::Dinner]
            } else {
                &[OperationSlice::FullDay]
            };
            for slice in slices {
                match generate_record(store_id, month, day, *slice, *base_sales, index) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!(store_id, day, error = %e, "Skipping generated record"),
                }
            }
        }
    }

    let written = db.records().upsert_many(&records).await?;
    println!("✓ Generated {} records in {:?}", written, start.elapsed());

    for (index, (store_id, _, brand_id, base_sales, _)) in STORES.iter().enumerate() {
        let monthly = MonthlyExpenseBaseline {
            store_id: (*store_id).into(),
            year_month: month,
            labor_cost_employee: Money::from_units(base_sales * 6),
            labor_cost_part_time: Money::from_units(base_sales * 3),
            overhead: OverheadCosts {
                rent: Money::from_units(900_000 + index as i64 * 100_000),
                utilities: Money::from_units(base_sales / 2),
                communication: Money::from_units(18_000),
                ..Default::default()
            },
            open_days: None,
        };
        db.baselines().upsert_monthly(&monthly).await?;

        let brand_type = BRANDS
            .iter()
            .find(|(id, _, _)| id == brand_id)
            .map(|(_, _, t)| *t)
            .unwrap_or_default();
        let target_sales = Money::from_units(base_sales * i64::from(month.days_in_month()) * 105 / 100);
        let target = TargetTemplate::new(brand_type, TemplateProfile::Balanced).to_target(store_id, month, target_sales);
        db.targets().upsert(&target).await?;

        for day in 1..=month.days_in_month() {
            if let Some(date) = month.first_day().with_day(day) {
                db.targets()
                    .upsert_daily(&DailyTarget {
                        store_id: (*store_id).into(),
                        date,
                        target_sales: Money::from_units(*base_sales),
                    })
                    .await?;
            }
        }
    }
    println!("✓ Baselines, monthly targets and daily targets for {}", month);

    info!(records = written, stores = STORES.len(), month = %month, "Seed complete");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one record through the normalizer, with deterministic variation.
fn generate_record(
    store_id: &str,
    month: YearMonth,
    day: u32,
    slice: OperationSlice,
    base_sales: i64,
    seed: usize,
) -> Result<DailyRecord, Box<dyn std::error::Error>> {
    let date = month
        .first_day()
        .with_day(day)
        .ok_or_else(|| format!("day {day} out of range for {month}"))?;

    // Weekends run ~25% above weekdays
    let weekend = date.weekday().number_from_monday() >= 6;
    let wobble = ((seed * 31 + day as usize * 17) % 21) as i64 - 10;
    let mut sales = base_sales * (100 + wobble) / 100;
    if weekend {
        sales = sales * 125 / 100;
    }
    let share = match slice {
        OperationSlice::Lunch => 40,
        OperationSlice::Dinner => 60,
        OperationSlice::FullDay => 100,
    };
    let sales = sales * share / 100;
    let customers = sales / 1_200;

    let (lunch_customers, dinner_customers) = match slice {
        OperationSlice::Lunch => (Some(customers), None),
        OperationSlice::Dinner => (None, Some(customers)),
        OperationSlice::FullDay => (Some(customers * 35 / 100), Some(customers - customers * 35 / 100)),
    };

    let raw = RawDailyRecord {
        id: Uuid::new_v4().to_string(),
        store_id: store_id.into(),
        date: date.format("%Y-%m-%d").to_string(),
        operation_slice: slice.as_str().into(),
        sales: Some(sales),
        customers: Some(customers),
        lunch_customers,
        dinner_customers,
        purchase: sales * (30 + (seed as i64 % 5)) / 100,
        labor_cost: sales * 27 / 100,
        // Overhead is left to the monthly baseline except on the 1st, when rent is paid
        rent: if day == 1 && slice != OperationSlice::Lunch { 900_000 } else { 0 },
        ..Default::default()
    };

    Ok(normalize(&raw)?)
}
