//! Runtime configuration
//!
//! Read once at startup from `MYFOOD_*` environment variables.

use std::path::PathBuf;

use chrono_tz::Tz;
use thiserror::Error;

use crate::analytics::{parse_timezone, DEFAULT_TOP_PRODUCTS};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid MYFOOD_TIMEZONE: {0}")]
    Timezone(String),

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    /// Timezone used to decide what "today" is for named periods
    pub timezone: Tz,
    pub top_products: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Read configuration through `get`, so tests never touch the process
    /// environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let database_path = get("MYFOOD_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let timezone = match get("MYFOOD_TIMEZONE") {
            Some(name) => parse_timezone(&name).map_err(ConfigError::Timezone)?,
            None => Tz::UTC,
        };

        let top_products = match get("MYFOOD_TOP_PRODUCTS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "MYFOOD_TOP_PRODUCTS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_TOP_PRODUCTS,
        };

        Ok(Self {
            database_path,
            timezone,
            top_products,
        })
    }
}

/// `<project>/data/myfood.db`, where the project root is found by walking up
/// from `target/release` or `target/debug` next to the executable.
fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("myfood.db");
    path
}
