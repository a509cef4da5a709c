/// Read operations over the climate store.
///
/// Each public operation borrows one pooled connection for its whole body
/// (`Store::with_session`), runs one or two statements, and returns owned
/// values. Date filters are pushed into SQL as canonical `YYYY-MM-DD` text,
/// which orders the same way as the calendar.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::db::{Store, StoreError};
use crate::model::{
    DatasetSummary, Measurement, Station, TemperatureSummary, format_iso_date, parse_iso_date,
    trailing_year_cutoff,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum QueryError {
    /// A caller-supplied date is not a valid `YYYY-MM-DD` calendar date.
    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// The store holds a date that does not parse.
    #[error("stored date '{0}' is not a valid YYYY-MM-DD date")]
    CorruptDate(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),
}

impl QueryError {
    /// True when the request itself was at fault rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::InvalidDate { .. })
    }
}

fn parse_request_date(input: &str) -> Result<NaiveDate, QueryError> {
    parse_iso_date(input).ok_or_else(|| QueryError::InvalidDate { input: input.to_string() })
}

// ---------------------------------------------------------------------------
// Query Service
// ---------------------------------------------------------------------------

/// Cheaply cloneable handle shared by all request workers.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<Store>,
}

impl QueryService {
    pub fn new(store: Store) -> Self {
        Self { store: Arc::new(store) }
    }

    fn session<T>(&self, work: impl FnOnce(&Connection) -> Result<T, QueryError>) -> Result<T, QueryError> {
        self.store.with_session(work)
    }

    /// Precipitation for every day in the trailing year of the dataset.
    ///
    /// Keys are dates on or after `latest − 365 days`. Several stations
    /// report the same day; rows are visited in date then insertion order
    /// and the last one wins. Missing readings stay `None`.
    pub fn precipitations(&self) -> Result<BTreeMap<String, Option<f64>>, QueryError> {
        self.session(|conn| {
            let Some(latest) = latest_date_in(conn)? else {
                return Ok(BTreeMap::new());
            };
            let cutoff = format_iso_date(trailing_year_cutoff(latest));
            debug!(%cutoff, "selecting trailing-year precipitation");

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM measurement WHERE date >= ?1 ORDER BY date, rowid",
                Measurement::COLUMNS
            ))?;
            let rows = stmt.query_map([&cutoff], Measurement::from_row)?;

            let mut by_date = BTreeMap::new();
            for row in rows {
                let m = row?;
                by_date.insert(m.date, m.prcp);
            }
            Ok(by_date)
        })
    }

    /// All station codes, in the order the store lists them.
    pub fn stations(&self) -> Result<Vec<String>, QueryError> {
        self.session(|conn| {
            let mut stmt = conn.prepare("SELECT station FROM station ORDER BY rowid")?;
            let codes = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(codes)
        })
    }

    /// Temperatures over the trailing year for the most active station.
    ///
    /// The window is anchored on the latest date across the whole dataset,
    /// not the chosen station's own latest reading.
    pub fn tobs(&self) -> Result<BTreeMap<String, f64>, QueryError> {
        self.session(|conn| {
            let Some((station, count)) = most_active_station_in(conn)? else {
                return Ok(BTreeMap::new());
            };
            let Some(latest) = latest_date_in(conn)? else {
                return Ok(BTreeMap::new());
            };
            let cutoff = format_iso_date(trailing_year_cutoff(latest));
            debug!(%station, count, %cutoff, "selecting trailing-year temperatures");

            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM measurement WHERE station = ?1 AND date >= ?2 ORDER BY date, rowid",
                Measurement::COLUMNS
            ))?;
            let rows = stmt.query_map(params![station, cutoff], Measurement::from_row)?;

            let mut by_date = BTreeMap::new();
            for row in rows {
                let m = row?;
                by_date.insert(m.date, m.tobs);
            }
            Ok(by_date)
        })
    }

    /// Tmin/Tavg/Tmax over every reading on or after `start`.
    pub fn range_from(&self, start: &str) -> Result<TemperatureSummary, QueryError> {
        let start = format_iso_date(parse_request_date(start)?);
        self.session(|conn| {
            summarize(conn, "WHERE date >= ?1", params![start])
        })
    }

    /// Tmin/Tavg/Tmax over readings from `start` to `end`, both inclusive.
    ///
    /// An inverted range is not an error; it simply matches nothing.
    pub fn range_between(&self, start: &str, end: &str) -> Result<TemperatureSummary, QueryError> {
        let start = format_iso_date(parse_request_date(start)?);
        let end = format_iso_date(parse_request_date(end)?);
        self.session(|conn| {
            summarize(conn, "WHERE date >= ?1 AND date <= ?2", params![start, end])
        })
    }

    /// Latest date recorded in `measurement`, if any rows exist.
    pub fn latest_date(&self) -> Result<Option<NaiveDate>, QueryError> {
        self.session(latest_date_in)
    }

    /// Station code with the most measurement rows, and that count.
    ///
    /// Ties go to the lowest station code.
    pub fn most_active_station(&self) -> Result<Option<(String, i64)>, QueryError> {
        self.session(most_active_station_in)
    }

    /// Full station records, in store order.
    pub fn station_records(&self) -> Result<Vec<Station>, QueryError> {
        self.session(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM station ORDER BY rowid",
                Station::COLUMNS
            ))?;
            let stations = stmt
                .query_map([], Station::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(stations)
        })
    }

    /// Row counts and the date span of the measurements.
    pub fn dataset_summary(&self) -> Result<DatasetSummary, QueryError> {
        self.session(|conn| {
            let station_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM station", [], |r| r.get(0))?;
            let (measurement_count, earliest_date, latest_date): (i64, Option<String>, Option<String>) = conn.query_row(
                "SELECT COUNT(*), MIN(date), MAX(date) FROM measurement",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?;
            Ok(DatasetSummary {
                station_count,
                measurement_count,
                earliest_date,
                latest_date,
            })
        })
    }
}

// ---------------------------------------------------------------------------
// Statement helpers (run inside an open session)
// ---------------------------------------------------------------------------

fn latest_date_in(conn: &Connection) -> Result<Option<NaiveDate>, QueryError> {
    let raw: Option<String> = conn.query_row("SELECT MAX(date) FROM measurement", [], |r| r.get(0))?;
    match raw {
        None => Ok(None),
        Some(text) => parse_iso_date(&text)
            .map(Some)
            .ok_or(QueryError::CorruptDate(text)),
    }
}

fn most_active_station_in(conn: &Connection) -> Result<Option<(String, i64)>, QueryError> {
    let top = conn
        .query_row(
            "SELECT station, COUNT(*) AS n
             FROM measurement
             GROUP BY station
             ORDER BY n DESC, station ASC
             LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    Ok(top)
}

fn summarize(
    conn: &Connection,
    filter: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<TemperatureSummary, QueryError> {
    let sql = format!("SELECT MIN(tobs), AVG(tobs), MAX(tobs) FROM measurement {filter}");
    let summary = conn.query_row(&sql, args, |r| {
        Ok(TemperatureSummary {
            tmin: r.get(0)?,
            tavg: r.get(1)?,
            tmax: r.get(2)?,
        })
    })?;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
