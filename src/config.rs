/// Service configuration loader.
///
/// Settings are layered, later layers overriding earlier ones:
///
/// 1. built-in defaults
/// 2. `climate.toml` in the working directory (optional), or the file named
///    by `--config` (required to exist)
/// 3. environment: `DATABASE_PATH`, `CLIMATE_HOST`, `CLIMATE_PORT`
///    (a `.env` file is loaded first if present)
/// 4. command-line flags: `--database`, `--port`, `--workers`

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "climate.toml";

pub const USAGE: &str = "Usage: climate_service [--config PATH] [--database PATH] [--port PORT] [--workers N] [--verbose]";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("{0} requires a value")]
    MissingArgumentValue(String),

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// SQLite file holding the `station` and `measurement` tables.
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Request worker threads.
    pub workers: usize,
    /// Idle connections kept open between requests.
    pub pool_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("Resources/hawaii.sqlite"),
            host: "127.0.0.1".to_string(),
            port: 5000,
            workers: 4,
            pool_size: 4,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(host) = lookup("CLIMATE_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("CLIMATE_PORT") {
            self.port = parse_value("CLIMATE_PORT", &port)?;
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(path) = &args.database {
            self.database_path = path.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(workers) = args.workers {
            self.workers = workers;
        }
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue { key: "workers".into(), value: "0".into() });
        }
        if self.pool_size == 0 {
            return Err(ConfigError::InvalidValue { key: "pool_size".into(), value: "0".into() });
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue { key: "host".into(), value: self.host.clone() });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Flags accepted by the `climate_service` binary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub port: Option<u16>,
    pub workers: Option<usize>,
    pub verbose: bool,
    pub help: bool,
}

/// Parses arguments, excluding the program name.
pub fn parse_args(args: &[String]) -> Result<CliArgs, ConfigError> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| ConfigError::MissingArgumentValue(arg.clone()))
        };
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value()?)),
            "--database" => parsed.database = Some(PathBuf::from(value()?)),
            "--port" => parsed.port = Some(parse_value("--port", &value()?)?),
            "--workers" => parsed.workers = Some(parse_value("--workers", &value()?)?),
            "--verbose" | "-v" => parsed.verbose = true,
            "--help" | "-h" => parsed.help = true,
            other => return Err(ConfigError::UnknownArgument(other.to_string())),
        }
    }

    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Reads the config file layer.
///
/// An explicitly named file must exist; the default `climate.toml` is
/// skipped when absent.
pub fn load_config(explicit: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };

    if !required && !path.exists() {
        return Ok(ServiceConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    ServiceConfig::from_toml_str(&contents, &path)
}

/// Builds the final configuration from every layer.
pub fn resolve(args: &CliArgs) -> Result<ServiceConfig, ConfigError> {
    dotenv::dotenv().ok();

    let mut config = load_config(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    config.apply_args(args);
    config.validate()?;
    Ok(config)
}
