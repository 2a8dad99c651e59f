//! Configuration types for the Galaxy Events server.
//!
//! All configuration is loaded from environment variables. Parsing goes
//! through a lookup function so tests can feed values from a map without
//! touching the process environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GALAXY_MODE` (falls back to `NODE_ENV`) | `development` |
//! | `CORS_ORIGINS` | unset (production only) |
//! | `API_TOKEN` | unset |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8090` |
//! | `GALAXY_TICK_INTERVAL_MS` | `60000` (minimum 100) |
//! | `GALAXY_TRIGGER_PROBABILITY` | `0.1` |
//! | `GALAXY_HISTORY_LIMIT` | `50` |
//! | `GALAXY_CATALOG_PATH` | unset (built-in catalog) |
//! | `LOG_FORMAT` | `pretty` (`json` for JSON lines) |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::{CatalogError, EventCatalog};
use crate::store::DEFAULT_HISTORY_LIMIT;

/// Default listening port, distinct from the main site's port.
pub const DEFAULT_PORT: u16 = 8090;

/// Default scheduler period (one minute).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 60_000;

/// Smallest accepted scheduler period.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Default per-tick trigger probability.
pub const DEFAULT_TRIGGER_PROBABILITY: f64 = 0.1;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("invalid {var}: {reason}")]
    Invalid {
        /// Name of the offending variable.
        var: &'static str,
        /// What is wrong with its value.
        reason: String,
    },

    /// The configured catalog file could not be loaded.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: CatalogError,
    },
}

/// Deployment mode controlling how strict the access gate is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    /// Local development: every origin allowed, no auth.
    #[default]
    Development,
    /// Public deployment: origin allow-list and bearer token enforced.
    Production,
}

impl FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown mode `{other}`")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Access gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessConfig {
    /// Origins allowed in production; `None` rejects every cross-origin
    /// request. Always `None` in development.
    pub allowed_origins: Option<Vec<String>>,
    /// Shared bearer token; `None` disables privileged routes in
    /// production.
    pub api_token: Option<String>,
}

/// Listening address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// The host address to bind to.
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: DEFAULT_PORT,
        }
    }
}

/// Simulation tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    /// Scheduler period in milliseconds.
    pub tick_interval_ms: u64,
    /// Probability that a tick produces an event.
    pub trigger_probability: f64,
    /// Number of past events kept in the history.
    pub history_limit: usize,
    /// YAML catalog replacing the built-in one.
    pub catalog_path: Option<PathBuf>,
}

impl SimulationSettings {
    /// Scheduler period as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Load the configured catalog, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Catalog`] if the catalog file cannot be
    /// read or fails validation.
    pub fn load_catalog(&self) -> Result<EventCatalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => Ok(EventCatalog::from_file(path)?),
            None => Ok(EventCatalog::builtin()),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            trigger_probability: DEFAULT_TRIGGER_PROBABILITY,
            history_limit: DEFAULT_HISTORY_LIMIT,
            catalog_path: None,
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GalaxyConfig {
    /// Deployment mode.
    pub mode: RuntimeMode,
    /// Access gate settings.
    pub access: AccessConfig,
    /// Listening address.
    pub server: ServerSettings,
    /// Simulation tuning.
    pub simulation: SimulationSettings,
    /// Log output format.
    pub log_format: LogFormat,
}

impl GalaxyConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first variable whose
    /// value cannot be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`GalaxyConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = match get("GALAXY_MODE").or_else(|| get("NODE_ENV")) {
            Some(raw) => raw
                .parse::<RuntimeMode>()
                .map_err(|reason| ConfigError::Invalid {
                    var: "GALAXY_MODE",
                    reason,
                })?,
            None => RuntimeMode::Development,
        };

        // The allow-list only means something in production.
        let allowed_origins = match (mode, get("CORS_ORIGINS")) {
            (RuntimeMode::Production, Some(raw)) => Some(
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_owned)
                    .collect(),
            ),
            _ => None,
        };

        let api_token = get("API_TOKEN").map(|t| t.trim().to_owned());

        let host = get("HOST").unwrap_or_else(|| String::from("0.0.0.0"));
        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;

        let tick_interval_ms = parse_or(
            "GALAXY_TICK_INTERVAL_MS",
            get("GALAXY_TICK_INTERVAL_MS"),
            DEFAULT_TICK_INTERVAL_MS,
        )?;
        if tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                var: "GALAXY_TICK_INTERVAL_MS",
                reason: format!("must be at least {MIN_TICK_INTERVAL_MS}"),
            });
        }

        let trigger_probability: f64 = parse_or(
            "GALAXY_TRIGGER_PROBABILITY",
            get("GALAXY_TRIGGER_PROBABILITY"),
            DEFAULT_TRIGGER_PROBABILITY,
        )?;
        if !trigger_probability.is_finite() || !(0.0..=1.0).contains(&trigger_probability) {
            return Err(ConfigError::Invalid {
                var: "GALAXY_TRIGGER_PROBABILITY",
                reason: String::from("must be within [0, 1]"),
            });
        }

        let history_limit: usize = parse_or(
            "GALAXY_HISTORY_LIMIT",
            get("GALAXY_HISTORY_LIMIT"),
            DEFAULT_HISTORY_LIMIT,
        )?;
        if history_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "GALAXY_HISTORY_LIMIT",
                reason: String::from("must be at least 1"),
            });
        }

        let catalog_path = get("GALAXY_CATALOG_PATH").map(PathBuf::from);

        let log_format = match get("LOG_FORMAT").map(|f| f.trim().to_ascii_lowercase()) {
            None => LogFormat::Pretty,
            Some(f) if f == "pretty" || f == "text" => LogFormat::Pretty,
            Some(f) if f == "json" => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    reason: format!("unknown format `{other}`"),
                });
            }
        };

        Ok(Self {
            mode,
            access: AccessConfig {
                allowed_origins,
                api_token,
            },
            server: ServerSettings { host, port },
            simulation: SimulationSettings {
                tick_interval_ms,
                trigger_probability,
                history_limit,
                catalog_path,
            },
            log_format,
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        })
    })
}
