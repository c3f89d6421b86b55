use super::{PersistenceError, PersistenceResult};
use crate::catalog::{InMemoryCatalog, LocationCatalog};
use crate::holiday::{CatalogScope, Holiday, HolidayKind};
use crate::office::OfficeCalendarConfig;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// One flat catalog row in a CSV file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogRecord {
    country: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    city: String,
    date: String,
    name: String,
    kind: String,
    #[serde(default)]
    recurring: String,
    #[serde(default)]
    moveable: String,
}

impl CatalogRecord {
    fn from_row(scope: &CatalogScope, holiday: &Holiday) -> Self {
        Self {
            country: scope.country.clone(),
            region: scope.region.clone().unwrap_or_default(),
            city: scope.city.clone().unwrap_or_default(),
            date: holiday.date.format("%Y-%m-%d").to_string(),
            name: holiday.name.clone(),
            kind: holiday.kind.as_str().to_string(),
            recurring: holiday.recurring.to_string(),
            moveable: holiday.moveable.to_string(),
        }
    }

    fn into_row(self) -> PersistenceResult<(CatalogScope, Holiday)> {
        let country = self.country.trim().to_string();
        if country.is_empty() {
            return Err(PersistenceError::InvalidData(format!(
                "catalog row '{}' has no country",
                self.name
            )));
        }
        let region = parse_string_option(self.region);
        let city = parse_string_option(self.city);
        if city.is_some() && region.is_none() {
            return Err(PersistenceError::InvalidData(format!(
                "catalog row '{}' names a city without a region",
                self.name
            )));
        }
        let kind = HolidayKind::from_str(&self.kind).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid holiday kind '{}'", self.kind))
        })?;
        if kind == HolidayKind::Company {
            return Err(PersistenceError::InvalidData(format!(
                "catalog row '{}' cannot use the company kind",
                self.name
            )));
        }
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(PersistenceError::InvalidData(
                "catalog row has an empty holiday name".into(),
            ));
        }

        let holiday = Holiday {
            date: parse_date(&self.date)?,
            name,
            kind,
            region: region.clone(),
            recurring: parse_bool(&self.recurring)?.unwrap_or(true),
            moveable: parse_bool(&self.moveable)?.unwrap_or(false),
        };
        let scope = CatalogScope {
            country,
            region,
            city,
        };
        Ok((scope, holiday))
    }
}

fn catalog_from_records(
    label: &str,
    records: Vec<CatalogRecord>,
) -> PersistenceResult<InMemoryCatalog> {
    if records.is_empty() {
        return Err(PersistenceError::InvalidData(
            "catalog file contained no holidays".into(),
        ));
    }
    let mut catalog = InMemoryCatalog::new(label);
    for record in records {
        let (scope, holiday) = record.into_row()?;
        catalog.register(scope, holiday);
    }
    Ok(catalog)
}

fn records_from_catalog(catalog: &InMemoryCatalog) -> Vec<CatalogRecord> {
    catalog
        .records()
        .map(|(scope, holiday)| CatalogRecord::from_row(scope, holiday))
        .collect()
}

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string())
}

/// JSON catalogs are stored as one block per scope and year.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogBlock {
    #[serde(flatten)]
    scope: CatalogScope,
    year: i32,
    holidays: Vec<Holiday>,
}

pub fn load_catalog_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<InMemoryCatalog> {
    let file = File::open(path.as_ref())?;
    let blocks: Vec<CatalogBlock> = serde_json::from_reader(file)?;
    if blocks.is_empty() {
        return Err(PersistenceError::InvalidData(
            "catalog file contained no scopes".into(),
        ));
    }
    let mut catalog = InMemoryCatalog::new(label_for(path.as_ref()));
    for block in blocks {
        if block.scope.city.is_some() && block.scope.region.is_none() {
            return Err(PersistenceError::InvalidData(format!(
                "catalog scope {} names a city without a region",
                block.scope
            )));
        }
        for holiday in &block.holidays {
            if holiday.date.year() != block.year {
                return Err(PersistenceError::InvalidData(format!(
                    "holiday '{}' on {} is filed under {} {}",
                    holiday.name, holiday.date, block.scope, block.year
                )));
            }
            if holiday.kind == HolidayKind::Company {
                return Err(PersistenceError::InvalidData(format!(
                    "catalog row '{}' cannot use the company kind",
                    holiday.name
                )));
            }
        }
        catalog.insert(block.scope, block.year, block.holidays);
    }
    Ok(catalog)
}

pub fn save_catalog_to_json<P: AsRef<Path>>(
    catalog: &InMemoryCatalog,
    path: P,
) -> PersistenceResult<()> {
    let blocks: Vec<CatalogBlock> = catalog
        .scopes()
        .map(|(scope, year)| CatalogBlock {
            scope: scope.clone(),
            year,
            holidays: catalog.entries(scope, year).unwrap_or_default(),
        })
        .collect();
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &blocks)?;
    Ok(())
}

pub fn load_catalog_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<InMemoryCatalog> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for record in reader.deserialize::<CatalogRecord>() {
        records.push(record?);
    }
    catalog_from_records(&label_for(path.as_ref()), records)
}

pub fn save_catalog_to_csv<P: AsRef<Path>>(
    catalog: &InMemoryCatalog,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records_from_catalog(catalog) {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_offices_to_json<P: AsRef<Path>>(
    offices: &[OfficeCalendarConfig],
    path: P,
) -> PersistenceResult<()> {
    for office in offices {
        super::validate_office(office)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, offices)?;
    Ok(())
}

pub fn load_offices_from_json<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<OfficeCalendarConfig>> {
    let file = File::open(path)?;
    let offices: Vec<OfficeCalendarConfig> = serde_json::from_reader(file)?;
    for office in &offices {
        super::validate_office(office)?;
    }
    Ok(offices)
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_bool(input: &str) -> PersistenceResult<Option<bool>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    match input.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}
