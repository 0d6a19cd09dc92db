//! Startup configuration. Paths are resolved exactly once in `main` and passed
//! down; the persistence layer never looks at the environment itself.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".product-inventory";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "Product.db";
/// Log file written next to the database.
const LOG_FILE_NAME: &str = "product-inventory.log";
/// Overrides the database location when set.
pub const DB_PATH_ENV: &str = "PRODUCT_INVENTORY_DB";
/// Standard tracing filter variable.
pub const LOG_FILTER_ENV: &str = "RUST_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub log_filter: String,
}

impl Config {
    /// Read the process environment and the user's home directory.
    pub fn from_env() -> Result<Self> {
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        let mut config = Self::resolve(home, env::var_os(DB_PATH_ENV))?;
        if let Ok(filter) = env::var(LOG_FILTER_ENV) {
            if !filter.trim().is_empty() {
                config.log_filter = filter;
            }
        }
        Ok(config)
    }

    /// Work out the file locations. An explicit database path wins; otherwise
    /// everything lives under `<home>/.product-inventory/`.
    pub fn resolve(home: Option<PathBuf>, db_override: Option<OsString>) -> Result<Self> {
        let db_path = match db_override.filter(|value| !value.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => home
                .ok_or_else(|| anyhow!("could not locate home directory"))?
                .join(DATA_DIR_NAME)
                .join(DB_FILE_NAME),
        };

        let data_dir = db_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            log_path: data_dir.join(LOG_FILE_NAME),
            data_dir,
            db_path,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        })
    }
}
