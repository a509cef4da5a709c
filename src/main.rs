//! Climate Observations Service
//!
//! Serves read-only JSON endpoints over the Hawaii climate dataset
//! (stations plus daily precipitation and temperature readings).
//!
//! Usage:
//!   cargo run --release                                  # uses climate.toml / defaults
//!   cargo run --release -- --database Resources/hawaii.sqlite --port 8080
//!
//! Environment:
//!   DATABASE_PATH - SQLite file with the station and measurement tables
//!   CLIMATE_HOST, CLIMATE_PORT - listen address
//!   RUST_LOG - log filter (default: climate_service=info)

use climate_service::config::{self, USAGE};
use climate_service::db::Store;
use climate_service::endpoint::{self, AVAILABLE_ROUTES};
use climate_service::logger;
use climate_service::query::QueryService;
use std::env;
use tracing::{error, info};

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match config::parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    };
    if cli.help {
        println!("{}", USAGE);
        return;
    }

    logger::init(cli.verbose);

    println!("🌺 Climate Observations Service");
    println!("===============================\n");

    let config = match config::resolve(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // The service cannot run without a verified store.
    let store = match Store::open(&config.database_path, config.pool_size) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("\n❌ Store unavailable: {}\n", e);
            std::process::exit(1);
        }
    };
    let service = QueryService::new(store);

    match service.dataset_summary() {
        Ok(summary) => info!(
            stations = summary.station_count,
            measurements = summary.measurement_count,
            latest = summary.latest_date.as_deref().unwrap_or("none"),
            "dataset loaded"
        ),
        Err(e) => error!("failed to summarize dataset: {}", e),
    }

    let addr = config.bind_address();
    println!("🚀 Serving on http://{}", addr);
    for route in AVAILABLE_ROUTES {
        println!("   GET {}", route);
    }
    println!();

    if let Err(e) = endpoint::start_endpoint_server(&addr, service, config.workers) {
        eprintln!("❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
