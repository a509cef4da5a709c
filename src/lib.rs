/// climate_service: read-only JSON API over the Hawaii climate dataset.
///
/// # Module structure
///
/// ```text
/// climate_service
/// ├── model    — Station / Measurement records, temperature summaries, date helpers
/// ├── db       — read-only SQLite store, schema verification, connection pool
/// ├── query    — the read operations (precipitation, stations, tobs, ranges)
/// ├── endpoint — route table, JSON rendering and the tiny_http server loop
/// ├── config   — layered service configuration (defaults, climate.toml, env, CLI)
/// ├── logger   — tracing subscriber setup
/// └── fixtures (test only) — throwaway SQLite stores with sample data
/// ```

/// Public modules
pub mod config;
pub mod db;
pub mod endpoint;
pub mod logger;
pub mod model;
pub mod query;

#[cfg(test)]
use db::SCHEMA_SQL;
#[cfg(test)]
mod fixtures;
