/// Shared helpers for integration tests: the same SQLite fixtures the unit
/// tests use, built from the service's own schema definition.

use climate_service::db::SCHEMA_SQL;

#[allow(dead_code)]
#[path = "../../src/fixtures.rs"]
mod fixtures;

pub use fixtures::*;
