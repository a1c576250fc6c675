//! Runtime configuration, read from `STUDY_PLANNER_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::logic::PlannerSettings;
use crate::models::HourRange;
use crate::priority::NameMatch;
use crate::strategy::StrategyGate;

pub const ENV_ADDR: &str = "STUDY_PLANNER_ADDR";
pub const ENV_DB_PATH: &str = "STUDY_PLANNER_DB_PATH";
pub const ENV_HOUR_START: &str = "STUDY_PLANNER_HOUR_START";
pub const ENV_HOUR_END: &str = "STUDY_PLANNER_HOUR_END";
pub const ENV_NAME_MATCH: &str = "STUDY_PLANNER_NAME_MATCH";
pub const ENV_STRATEGY_TIMEOUT: &str = "STUDY_PLANNER_STRATEGY_TIMEOUT_SECS";
pub const ENV_MIN_COVERAGE: &str = "STUDY_PLANNER_MIN_COVERAGE";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("hour range {start}..={end} must be ordered and end no later than 22")]
    HourRange { start: u8, end: u8 },

    #[error("{key} must be between 0 and 1, got {value}")]
    Coverage { key: &'static str, value: f64 },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub hours: HourRange,
    pub name_match: NameMatch,
    pub strategy_timeout: Duration,
    pub min_coverage: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            db_path: PathBuf::from("data/db.json"),
            hours: HourRange::default(),
            name_match: NameMatch::default(),
            strategy_timeout: Duration::from_secs(30),
            min_coverage: 0.8,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let start = parse_var(&lookup, ENV_HOUR_START, defaults.hours.start)?;
        let end = parse_var(&lookup, ENV_HOUR_END, defaults.hours.end)?;
        if start > end || end > 22 {
            return Err(ConfigError::HourRange { start, end });
        }

        let min_coverage = parse_var(&lookup, ENV_MIN_COVERAGE, defaults.min_coverage)?;
        if !(0.0..=1.0).contains(&min_coverage) {
            return Err(ConfigError::Coverage {
                key: ENV_MIN_COVERAGE,
                value: min_coverage,
            });
        }

        let timeout_secs = parse_var(
            &lookup,
            ENV_STRATEGY_TIMEOUT,
            defaults.strategy_timeout.as_secs(),
        )?;

        Ok(Config {
            addr: parse_var(&lookup, ENV_ADDR, defaults.addr)?,
            db_path: lookup(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            hours: HourRange::new(start, end),
            name_match: parse_var(&lookup, ENV_NAME_MATCH, defaults.name_match)?,
            strategy_timeout: Duration::from_secs(timeout_secs),
            min_coverage,
        })
    }

    pub fn planner(&self) -> PlannerSettings {
        PlannerSettings {
            hours: self.hours,
            matching: self.name_match,
        }
    }

    pub fn gate(&self) -> StrategyGate {
        StrategyGate {
            timeout: self.strategy_timeout,
            min_coverage: self.min_coverage,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
