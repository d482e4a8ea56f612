//! Runtime configuration read from `TTKSIM_*` environment variables.

use std::env;
use std::path::PathBuf;

use crate::data::DEFAULT_CATALOG_PATH;
use crate::sim::{SimulationConfig, DEFAULT_MAX_ITERATIONS};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub catalog_path: PathBuf,
    pub max_iterations: u64,
    pub workers: usize,
    pub static_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            workers: 0,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: lookup("TTKSIM_BIND").unwrap_or(defaults.bind_addr),
            catalog_path: lookup("TTKSIM_CATALOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            max_iterations: parse_or(
                "TTKSIM_MAX_ITERATIONS",
                lookup("TTKSIM_MAX_ITERATIONS"),
                defaults.max_iterations,
            ),
            workers: parse_or("TTKSIM_WORKERS", lookup("TTKSIM_WORKERS"), defaults.workers),
            static_dir: lookup("TTKSIM_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        }
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            max_iterations: self.max_iterations,
            ..SimulationConfig::default()
        }
    }
}

fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    let Some(value) = raw else {
        return default;
    };
    value.trim().parse::<T>().unwrap_or_else(|_| {
        tracing::warn!("invalid {name} '{value}', defaulting to {default}");
        default
    })
}
