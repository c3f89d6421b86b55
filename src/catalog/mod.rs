use chrono::Datelike;
use std::collections::BTreeMap;

use crate::holiday::{CatalogScope, Holiday, LocationKey};

pub mod builtin;

pub use builtin::builtin_catalog;

/// Read-only source of holiday definitions.
///
/// Implementations are shared across threads during batch updates; catalog
/// changes are an administrative act that never overlaps resolution reads.
pub trait LocationCatalog: Send + Sync {
    /// Label recorded on every calendar resolved from this catalog.
    fn source_label(&self) -> &str;

    /// Entries registered at exactly `scope` for `year`, or `None` when that
    /// scope has no registration for the year.
    fn entries(&self, scope: &CatalogScope, year: i32) -> Option<Vec<Holiday>>;

    /// Exact city registration first, then the region. `None` is a normal
    /// outcome for locations the catalog does not cover.
    fn lookup(&self, location: &LocationKey, year: i32) -> Option<Vec<Holiday>> {
        if let Some(scope) = location.city_scope() {
            if let Some(entries) = self.entries(&scope, year) {
                return Some(entries);
            }
        }
        self.entries(&location.regional_scope(), year)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    label: String,
    index: BTreeMap<(CatalogScope, i32), Vec<Holiday>>,
}

impl InMemoryCatalog {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            index: BTreeMap::new(),
        }
    }

    /// Replace the registration for `(scope, year)`. An empty list still
    /// counts as a registration.
    pub fn insert(&mut self, scope: CatalogScope, year: i32, holidays: Vec<Holiday>) {
        self.index.insert((scope, year), holidays);
    }

    /// Append one holiday under its own year.
    pub fn register(&mut self, scope: CatalogScope, holiday: Holiday) {
        let year = holiday.date.year();
        self.index.entry((scope, year)).or_default().push(holiday);
    }

    pub fn scopes(&self) -> impl Iterator<Item = (&CatalogScope, i32)> {
        self.index.keys().map(|(scope, year)| (scope, *year))
    }

    /// Every registered row with its scope, in index order.
    pub fn records(&self) -> impl Iterator<Item = (&CatalogScope, &Holiday)> {
        self.index
            .iter()
            .flat_map(|((scope, _), holidays)| holidays.iter().map(move |h| (scope, h)))
    }

    pub fn len(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocationCatalog for InMemoryCatalog {
    fn source_label(&self) -> &str {
        &self.label
    }

    fn entries(&self, scope: &CatalogScope, year: i32) -> Option<Vec<Holiday>> {
        self.index.get(&(scope.clone(), year)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holiday::HolidayKind;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn lookup_falls_back_from_city_to_region() {
        let mut catalog = InMemoryCatalog::new("test");
        catalog.register(
            CatalogScope::regional("ES", "Madrid"),
            Holiday::new(d(2025, 5, 2), "Fiesta de la Comunidad", HolidayKind::Regional),
        );
        let location = LocationKey::new("ES", "Madrid").with_city("Alcalá");
        let found = catalog.lookup(&location, 2025).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Fiesta de la Comunidad");
        assert!(catalog.lookup(&location, 2026).is_none());
    }

    #[test]
    fn national_only_registration_is_not_a_lookup_match() {
        let mut catalog = InMemoryCatalog::new("test");
        catalog.register(
            CatalogScope::national("FR"),
            Holiday::new(d(2025, 7, 14), "Fête nationale", HolidayKind::National),
        );
        assert!(catalog.lookup(&LocationKey::new("FR", "Bretagne"), 2025).is_none());
    }
}
