use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use crate::catalog::LocationCatalog;
use crate::error::{CalendarError, CalendarResult};
use crate::holiday::{CatalogScope, Holiday, LocationKey, RegionalCalendar};

/// Resolve the holiday set for `location` in `year`.
pub fn resolve(
    catalog: &dyn LocationCatalog,
    location: &LocationKey,
    year: i32,
) -> CalendarResult<RegionalCalendar> {
    resolve_at(catalog, location, year, Utc::now())
}

/// Same as [`resolve`] with an explicit `updated_at` stamp.
///
/// National, regional and city layers are unioned. When two layers put a
/// holiday on the same date the more specific layer keeps it; inside a
/// single layer the first entry on a date wins.
pub fn resolve_at(
    catalog: &dyn LocationCatalog,
    location: &LocationKey,
    year: i32,
    updated_at: DateTime<Utc>,
) -> CalendarResult<RegionalCalendar> {
    let mut scopes = vec![location.national_scope(), location.regional_scope()];
    scopes.extend(location.city_scope());

    let layers: Vec<(CatalogScope, Vec<Holiday>)> = scopes
        .into_iter()
        .filter_map(|scope| catalog.entries(&scope, year).map(|entries| (scope, entries)))
        .collect();

    if layers.is_empty() {
        return Err(CalendarError::NotFound {
            location: location.clone(),
            year,
        });
    }

    // date -> (specificity, holiday, scope it came from)
    let mut by_date: BTreeMap<NaiveDate, (u8, Holiday, CatalogScope)> = BTreeMap::new();
    for (scope, entries) in layers {
        let rank = scope.specificity();
        for holiday in entries {
            if holiday.date.year() != year {
                debug!(
                    location = %location,
                    holiday = %holiday.name,
                    date = %holiday.date,
                    "skipping catalog entry registered under the wrong year"
                );
                continue;
            }
            match by_date.get(&holiday.date) {
                Some((kept_rank, kept, kept_scope)) if *kept_rank >= rank => {
                    debug!(
                        location = %location,
                        date = %holiday.date,
                        kept = %kept.name,
                        kept_from = %kept_scope,
                        dropped = %holiday.name,
                        dropped_from = %scope,
                        "dropping holiday that shares a date with an equal or more specific entry"
                    );
                }
                Some((_, replaced, replaced_scope)) => {
                    debug!(
                        location = %location,
                        date = %holiday.date,
                        kept = %holiday.name,
                        kept_from = %scope,
                        dropped = %replaced.name,
                        dropped_from = %replaced_scope,
                        "more specific holiday replaces a broader entry on the same date"
                    );
                    by_date.insert(holiday.date, (rank, holiday, scope.clone()));
                }
                None => {
                    by_date.insert(holiday.date, (rank, holiday, scope.clone()));
                }
            }
        }
    }

    let holidays = by_date.into_values().map(|(_, holiday, _)| holiday).collect();
    Ok(RegionalCalendar::from_sorted(
        location.clone(),
        year,
        holidays,
        catalog.source_label(),
        updated_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::holiday::HolidayKind;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn city_entry_wins_over_national_on_shared_date() {
        let mut catalog = InMemoryCatalog::new("test");
        catalog.register(
            CatalogScope::national("IT"),
            Holiday::new(d(2025, 6, 24), "National placeholder", HolidayKind::National),
        );
        catalog.register(
            CatalogScope::city("IT", "Toscana", "Firenze"),
            Holiday::new(d(2025, 6, 24), "San Giovanni", HolidayKind::Local),
        );
        let location = LocationKey::new("IT", "Toscana").with_city("Firenze");
        let calendar = resolve(&catalog, &location, 2025).unwrap();
        assert_eq!(calendar.len(), 1);
        assert_eq!(calendar.holidays()[0].name, "San Giovanni");
        assert_eq!(calendar.holidays()[0].kind, HolidayKind::Local);
    }

    #[test]
    fn national_only_location_resolves() {
        let mut catalog = InMemoryCatalog::new("test");
        catalog.register(
            CatalogScope::national("FR"),
            Holiday::new(d(2025, 7, 14), "Fête nationale", HolidayKind::National),
        );
        let calendar = resolve(&catalog, &LocationKey::new("FR", "Bretagne"), 2025).unwrap();
        assert_eq!(calendar.len(), 1);
        assert_eq!(calendar.source, "test");
    }

    #[test]
    fn unknown_location_is_not_found() {
        let catalog = InMemoryCatalog::new("test");
        let err = resolve(&catalog, &LocationKey::new("XX", "Nowhere"), 2025).unwrap_err();
        assert!(matches!(err, CalendarError::NotFound { year: 2025, .. }));
    }
}
