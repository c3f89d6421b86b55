use std::env;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::catalog::{InMemoryCatalog, LocationCatalog, builtin_catalog};
use crate::engine::HolidayEngine;
use crate::persistence::{
    InMemoryOfficeDirectory, OfficeDirectory, PersistenceError, load_catalog_from_csv,
    load_catalog_from_json,
};

pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SEED_YEARS: RangeInclusive<i32> = 2024..=2030;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub http_addr: SocketAddr,
    /// SQLite file for office documents; offices live in memory when unset.
    pub db_path: Option<PathBuf>,
    /// JSON or CSV catalog file; the builtin catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// Years the builtin catalog is generated for.
    pub seed_years: RangeInclusive<i32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            db_path: None,
            catalog_path: None,
            seed_years: DEFAULT_SEED_YEARS,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr =
            lookup("HOLIDAY_ENGINE_HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(raw_addr.clone()))?;

        let db_path = non_empty(lookup("HOLIDAY_ENGINE_DB")).map(PathBuf::from);
        let catalog_path = non_empty(lookup("HOLIDAY_ENGINE_CATALOG")).map(PathBuf::from);

        let seed_years = match non_empty(lookup("HOLIDAY_ENGINE_SEED_YEARS")) {
            Some(raw) => parse_year_range(&raw)?,
            None => DEFAULT_SEED_YEARS,
        };

        Ok(Self {
            http_addr,
            db_path,
            catalog_path,
            seed_years,
        })
    }

    pub fn build_catalog(&self) -> Result<Arc<dyn LocationCatalog>, ConfigError> {
        let catalog: InMemoryCatalog = match &self.catalog_path {
            Some(path) => load_catalog(path)?,
            None => builtin_catalog(self.seed_years.clone()),
        };
        info!(
            source = catalog.source_label(),
            registrations = catalog.len(),
            "holiday catalog loaded"
        );
        Ok(Arc::new(catalog))
    }

    pub fn build_directory(&self) -> Result<Arc<dyn OfficeDirectory>, ConfigError> {
        match &self.db_path {
            None => Ok(Arc::new(InMemoryOfficeDirectory::new())),
            #[cfg(feature = "sqlite")]
            Some(path) => {
                let directory = crate::persistence::sqlite::SqliteOfficeDirectory::new(path)?;
                info!(path = %path.display(), "office directory opened");
                Ok(Arc::new(directory))
            }
            #[cfg(not(feature = "sqlite"))]
            Some(path) => Err(ConfigError::SqliteUnavailable(path.clone())),
        }
    }

    pub fn build_engine(&self) -> Result<HolidayEngine, ConfigError> {
        Ok(HolidayEngine::new(
            self.build_catalog()?,
            self.build_directory()?,
        ))
    }
}

fn load_catalog(path: &Path) -> Result<InMemoryCatalog, ConfigError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("json") => Ok(load_catalog_from_json(path)?),
        Some("csv") => Ok(load_catalog_from_csv(path)?),
        _ => Err(ConfigError::UnsupportedCatalogFormat(path.to_path_buf())),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses `start..end`, both ends included.
fn parse_year_range(raw: &str) -> Result<RangeInclusive<i32>, ConfigError> {
    let invalid = || ConfigError::InvalidSeedYears(raw.to_string());
    let (start, end) = raw.trim().split_once("..").ok_or_else(invalid)?;
    let start: i32 = start.trim().parse().map_err(|_| invalid())?;
    let end: i32 = end.trim().trim_start_matches('=').parse().map_err(|_| invalid())?;
    if end < start {
        return Err(invalid());
    }
    Ok(start..=end)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid HOLIDAY_ENGINE_HTTP_ADDR '{0}'")]
    InvalidAddress(String),

    #[error("invalid HOLIDAY_ENGINE_SEED_YEARS '{0}', expected start..end")]
    InvalidSeedYears(String),

    #[error("catalog file {0} must end in .json or .csv")]
    UnsupportedCatalogFormat(PathBuf),

    #[cfg(not(feature = "sqlite"))]
    #[error("HOLIDAY_ENGINE_DB is set to {0} but sqlite support is not compiled in")]
    SqliteUnavailable(PathBuf),

    #[error(transparent)]
    Storage(#[from] PersistenceError),
}
