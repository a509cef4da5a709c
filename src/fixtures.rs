/// Throwaway SQLite stores for tests.
///
/// `hawaii_sample` is a trimmed slice of the Hawaii dataset shaped so the
/// interesting boundaries are all present: the latest date is 2017-08-23,
/// there are readings on both sides of the 2016-08-23 trailing-year cutoff,
/// several stations share dates, and some precipitation values are null.
///
/// Expected values derived from these rows:
///
/// - most active station: USC00519281 (7 rows)
/// - January 2017 temperatures: 62, 70, 68, 66 (min 62, avg 66.5, max 70)
/// - on or after 2017-08-22: 79, 76, 80
///
/// Compiled into both the unit tests and `tests/common`; each parent module
/// brings `SCHEMA_SQL` into scope.

use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::SCHEMA_SQL;

pub const SAMPLE_STATIONS: &[(&str, &str, f64, f64, f64)] = &[
    ("USC00519397", "WAIKIKI 717.2, HI US", 21.2716, -157.8168, 3.0),
    ("USC00513117", "KANEOHE 838.1, HI US", 21.4234, -157.8015, 14.6),
    ("USC00519281", "WAIHEE 837.5, HI US", 21.45167, -157.84889, 32.9),
    ("USC00516128", "MANOA LYON ARBO 785.2, HI US", 21.3331, -157.8025, 152.4),
];

pub const SAMPLE_MEASUREMENTS: &[(&str, &str, Option<f64>, f64)] = &[
    ("USC00519397", "2016-08-22", Some(0.05), 77.0),
    ("USC00519397", "2016-08-23", Some(0.00), 81.0),
    ("USC00513117", "2016-08-23", Some(0.15), 76.0),
    ("USC00519281", "2016-08-22", Some(1.79), 77.0),
    ("USC00519281", "2016-08-23", Some(1.79), 77.0),
    ("USC00519281", "2017-01-01", None, 62.0),
    ("USC00519281", "2017-01-15", Some(0.00), 70.0),
    ("USC00519281", "2017-01-31", Some(0.02), 68.0),
    ("USC00519281", "2017-02-01", Some(0.00), 71.0),
    ("USC00519281", "2017-08-23", Some(0.00), 79.0),
    ("USC00516128", "2016-12-31", Some(0.50), 60.0),
    ("USC00516128", "2017-08-23", Some(0.45), 76.0),
    ("USC00519397", "2017-01-10", None, 66.0),
    ("USC00513117", "2017-08-22", Some(0.00), 80.0),
];

/// A store file that lives as long as this value.
pub struct FixtureStore {
    _dir: TempDir,
    path: PathBuf,
}

impl FixtureStore {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Store populated with `SAMPLE_STATIONS` and `SAMPLE_MEASUREMENTS`.
pub fn hawaii_sample() -> FixtureStore {
    populated_store(SAMPLE_STATIONS, SAMPLE_MEASUREMENTS)
}

/// Store with the full schema but no rows.
pub fn empty_store() -> FixtureStore {
    populated_store(&[], &[])
}

/// Store built from the given rows, inserted in slice order.
pub fn populated_store(
    stations: &[(&str, &str, f64, f64, f64)],
    measurements: &[(&str, &str, Option<f64>, f64)],
) -> FixtureStore {
    let fixture = custom_store(SCHEMA_SQL);
    let conn = Connection::open(fixture.path()).unwrap();

    for (code, name, lat, lon, elev) in stations {
        conn.execute(
            "INSERT INTO station (station, name, latitude, longitude, elevation) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![code, name, lat, lon, elev],
        )
        .unwrap();
    }
    for (code, date, prcp, tobs) in measurements {
        conn.execute(
            "INSERT INTO measurement (station, date, prcp, tobs) VALUES (?1, ?2, ?3, ?4)",
            params![code, date, prcp, tobs],
        )
        .unwrap();
    }

    fixture
}

/// Store created by running arbitrary DDL, for schema-mismatch tests.
pub fn custom_store(ddl: &str) -> FixtureStore {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("climate.sqlite");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(ddl).unwrap();
    FixtureStore { _dir: dir, path }
}
