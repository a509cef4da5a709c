//! Store Check
//!
//! Opens the climate dataset the same way the service does, verifies the
//! schema, and prints what the endpoints will see: station list, row
//! counts, trailing-year window and most active station.
//!
//! Usage:
//!   cargo run --bin check_store [-- PATH]
//!
//! Environment:
//!   DATABASE_PATH - SQLite file (overridden by PATH; default from climate.toml)

use climate_service::config::{self, CliArgs};
use climate_service::db::Store;
use climate_service::model::{format_iso_date, trailing_year_cutoff};
use climate_service::query::QueryService;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs {
        database: std::env::args().nth(1).map(PathBuf::from),
        ..CliArgs::default()
    };
    let config = config::resolve(&cli)?;

    println!("🔍 Checking {}", config.database_path.display());

    let store = Store::open(&config.database_path, 1).unwrap_or_else(|e| {
        eprintln!("\n❌ {}\n", e);
        std::process::exit(1);
    });
    println!("✓ Schema verified\n");

    let service = QueryService::new(store);

    let summary = service.dataset_summary()?;
    println!("📊 Dataset:");
    println!("   Stations:     {}", summary.station_count);
    println!("   Measurements: {}", summary.measurement_count);
    println!(
        "   Date span:    {} .. {}",
        summary.earliest_date.as_deref().unwrap_or("-"),
        summary.latest_date.as_deref().unwrap_or("-")
    );

    if let Some(latest) = service.latest_date()? {
        println!(
            "   Trailing year: {} .. {}",
            format_iso_date(trailing_year_cutoff(latest)),
            format_iso_date(latest)
        );
    }

    if let Some((station, count)) = service.most_active_station()? {
        println!("   Most active:  {} ({} readings)", station, count);
    }

    println!("\n📍 Stations:");
    for station in service.station_records()? {
        println!(
            "   {:<12} {:<40} {:>9.4} {:>10.4} {:>7.1} m",
            station.station, station.name, station.latitude, station.longitude, station.elevation
        );
    }

    Ok(())
}
