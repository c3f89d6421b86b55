use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::io;
use thiserror::Error;

use crate::office::{OfficeCalendarConfig, OfficeId};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Office storage.
///
/// Implementations only need atomic single-document reads and writes; the
/// engine serializes writers per office.
pub trait OfficeDirectory: Send + Sync {
    fn get(&self, office_id: &OfficeId) -> PersistenceResult<Option<OfficeCalendarConfig>>;
    fn put(&self, office: &OfficeCalendarConfig) -> PersistenceResult<()>;
    fn list_ids(&self) -> PersistenceResult<Vec<OfficeId>>;
}

#[derive(Debug, Default)]
pub struct InMemoryOfficeDirectory {
    offices: RwLock<BTreeMap<OfficeId, OfficeCalendarConfig>>,
}

impl InMemoryOfficeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offices<I>(offices: I) -> PersistenceResult<Self>
    where
        I: IntoIterator<Item = OfficeCalendarConfig>,
    {
        let directory = Self::new();
        for office in offices {
            directory.put(&office)?;
        }
        Ok(directory)
    }

    pub fn snapshot(&self) -> Vec<OfficeCalendarConfig> {
        self.offices.read().values().cloned().collect()
    }
}

impl OfficeDirectory for InMemoryOfficeDirectory {
    fn get(&self, office_id: &OfficeId) -> PersistenceResult<Option<OfficeCalendarConfig>> {
        Ok(self.offices.read().get(office_id).cloned())
    }

    fn put(&self, office: &OfficeCalendarConfig) -> PersistenceResult<()> {
        validate_office(office)?;
        self.offices
            .write()
            .insert(office.office_id.clone(), office.clone());
        Ok(())
    }

    fn list_ids(&self) -> PersistenceResult<Vec<OfficeId>> {
        Ok(self.offices.read().keys().cloned().collect())
    }
}

/// Structural checks applied before an office document is stored or after
/// it is loaded.
pub fn validate_office(office: &OfficeCalendarConfig) -> PersistenceResult<()> {
    let holidays = office.calendar.holidays();
    if holidays.windows(2).any(|pair| pair[0].date >= pair[1].date) {
        return Err(PersistenceError::InvalidData(format!(
            "office {} calendar holidays must be sorted with unique dates",
            office.office_id
        )));
    }

    let mut exception_dates = HashSet::with_capacity(office.exceptions.len());
    for exception in &office.exceptions {
        if !exception_dates.insert(exception.holiday_date) {
            return Err(PersistenceError::InvalidData(format!(
                "office {} has more than one exception on {}",
                office.office_id, exception.holiday_date
            )));
        }
        if !office.calendar.contains_date(exception.holiday_date) {
            return Err(PersistenceError::InvalidData(format!(
                "office {} has an exception on {} which is not a holiday in its calendar",
                office.office_id, exception.holiday_date
            )));
        }
    }

    for closure in &office.closures {
        if let Some(end) = closure.end_date {
            if end < closure.start_date {
                return Err(PersistenceError::InvalidData(format!(
                    "office {} closure '{}' ends before it starts",
                    office.office_id, closure.name
                )));
            }
        }
    }

    if office.working_days.is_empty() {
        return Err(PersistenceError::InvalidData(format!(
            "office {} requires at least one working day",
            office.office_id
        )));
    }
    Ok(())
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_catalog_from_csv, load_catalog_from_json, load_offices_from_json, save_catalog_to_csv,
    save_catalog_to_json, save_offices_to_json,
};
