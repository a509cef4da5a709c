/// Shared data types for the climate observations service.
///
/// `Station` and `Measurement` mirror the two tables of the store one to one.
/// They are bound statically (see `db::SCHEMA_SQL`) rather than discovered
/// from the live schema, so a column rename in the dataset is caught by
/// `db::verify_schema` at startup instead of surfacing mid-request.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Date handling
// ---------------------------------------------------------------------------

/// Text format of every date in the store and in request paths.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the trailing window ending at the dataset's latest date.
/// A fixed offset: leap years are not accounted for.
pub const TRAILING_YEAR_DAYS: i64 = 365;

/// Parses a `YYYY-MM-DD` calendar date.
///
/// The input must be exactly four year digits, two month digits and two day
/// digits. chrono alone would also take signed or expanded years
/// (`+10000-01-01`), whose canonical text no longer sorts with the store's
/// dates. Out-of-range components such as `2020-13-40` are rejected by chrono.
pub fn parse_iso_date(input: &str) -> Option<NaiveDate> {
    if !has_iso_date_shape(input) {
        return None;
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).ok()
}

fn has_iso_date_shape(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Renders a date in the store's canonical text form.
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// First day of the trailing year that ends at `latest`.
pub fn trailing_year_cutoff(latest: NaiveDate) -> NaiveDate {
    latest - Duration::days(TRAILING_YEAR_DAYS)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A weather station from the `station` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Station code, e.g. `USC00519397`.
    pub station: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl Station {
    /// Column list matching `from_row`.
    pub const COLUMNS: &'static str = "station, name, latitude, longitude, elevation";

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Station {
            station: row.get(0)?,
            name: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            elevation: row.get(4)?,
        })
    }
}

/// One daily reading from the `measurement` table.
///
/// The date is kept as the raw store text, which is also the JSON map key.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub station: String,
    pub date: String,
    /// Precipitation; missing readings stay `None` all the way to JSON null.
    pub prcp: Option<f64>,
    pub tobs: f64,
}

impl Measurement {
    /// Column list matching `from_row`.
    pub const COLUMNS: &'static str = "station, date, prcp, tobs";

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Measurement {
            station: row.get(0)?,
            date: row.get(1)?,
            prcp: row.get(2)?,
            tobs: row.get(3)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Minimum, average and maximum observed temperature over a date range.
///
/// Each field is `None` when no rows matched, which serializes as JSON null
/// and stays distinguishable from a genuine zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TemperatureSummary {
    #[serde(rename = "Tmin")]
    pub tmin: Option<f64>,
    #[serde(rename = "Tavg")]
    pub tavg: Option<f64>,
    #[serde(rename = "Tmax")]
    pub tmax: Option<f64>,
}

/// Row counts and date span of the store, used by `check_store`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub station_count: i64,
    pub measurement_count: i64,
    pub earliest_date: Option<String>,
    pub latest_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
