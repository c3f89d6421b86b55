use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::ops::RangeInclusive;

use super::InMemoryCatalog;
use crate::holiday::{CatalogScope, Holiday, HolidayKind};

pub const BUILTIN_SOURCE: &str = "builtin";

/// Seed dataset used when no catalog file is configured.
pub fn builtin_catalog(years: RangeInclusive<i32>) -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new(BUILTIN_SOURCE);
    for year in years {
        add_spain(&mut catalog, year);
        add_united_states(&mut catalog, year);
    }
    catalog
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn add_fixed(
    catalog: &mut InMemoryCatalog,
    scope: &CatalogScope,
    kind: HolidayKind,
    year: i32,
    entries: &[(u32, u32, &str)],
) {
    for (month, day, name) in entries {
        if let Some(date) = ymd(year, *month, *day) {
            catalog.register(scope.clone(), tagged(Holiday::new(date, *name, kind), scope));
        }
    }
}

fn add_moveable(
    catalog: &mut InMemoryCatalog,
    scope: &CatalogScope,
    kind: HolidayKind,
    date: Option<NaiveDate>,
    name: &str,
) {
    if let Some(date) = date {
        catalog.register(scope.clone(), tagged(Holiday::moveable(date, name, kind), scope));
    }
}

fn tagged(holiday: Holiday, scope: &CatalogScope) -> Holiday {
    match &scope.region {
        Some(region) => holiday.in_region(region.clone()),
        None => holiday,
    }
}

fn add_spain(catalog: &mut InMemoryCatalog, year: i32) {
    let national = CatalogScope::national("ES");
    add_fixed(
        catalog,
        &national,
        HolidayKind::National,
        year,
        &[
            (1, 1, "New Year's Day"),
            (1, 6, "Epiphany"),
            (5, 1, "Labour Day"),
            (8, 15, "Assumption of Mary"),
            (10, 12, "National Day"),
            (11, 1, "All Saints' Day"),
            (12, 6, "Constitution Day"),
            (12, 8, "Immaculate Conception"),
            (12, 25, "Christmas Day"),
        ],
    );
    let easter = easter_sunday(year);
    add_moveable(
        catalog,
        &national,
        HolidayKind::National,
        easter.map(|e| e - Duration::days(2)),
        "Good Friday",
    );

    let catalonia = CatalogScope::regional("ES", "Catalonia");
    add_moveable(
        catalog,
        &catalonia,
        HolidayKind::Regional,
        easter.map(|e| e + Duration::days(1)),
        "Easter Monday",
    );
    add_fixed(
        catalog,
        &catalonia,
        HolidayKind::Regional,
        year,
        &[(9, 11, "National Day of Catalonia"), (12, 26, "Saint Stephen's Day")],
    );

    let barcelona = CatalogScope::city("ES", "Catalonia", "Barcelona");
    add_fixed(catalog, &barcelona, HolidayKind::Local, year, &[(9, 24, "La Mercè")]);

    let madrid_region = CatalogScope::regional("ES", "Madrid");
    add_moveable(
        catalog,
        &madrid_region,
        HolidayKind::Regional,
        easter.map(|e| e - Duration::days(3)),
        "Maundy Thursday",
    );
    add_fixed(
        catalog,
        &madrid_region,
        HolidayKind::Regional,
        year,
        &[(5, 2, "Community of Madrid Day")],
    );

    let madrid_city = CatalogScope::city("ES", "Madrid", "Madrid");
    add_fixed(
        catalog,
        &madrid_city,
        HolidayKind::Local,
        year,
        &[(5, 15, "Saint Isidore"), (11, 9, "Our Lady of Almudena")],
    );
}

fn add_united_states(catalog: &mut InMemoryCatalog, year: i32) {
    let federal = CatalogScope::national("US");
    add_fixed(
        catalog,
        &federal,
        HolidayKind::National,
        year,
        &[
            (1, 1, "New Year's Day"),
            (6, 19, "Juneteenth"),
            (7, 4, "Independence Day"),
            (11, 11, "Veterans Day"),
            (12, 25, "Christmas Day"),
        ],
    );
    let weekday_rules: [(u32, Weekday, u32, &str); 5] = [
        (1, Weekday::Mon, 3, "Martin Luther King Jr. Day"),
        (2, Weekday::Mon, 3, "Presidents' Day"),
        (9, Weekday::Mon, 1, "Labor Day"),
        (10, Weekday::Mon, 2, "Columbus Day"),
        (11, Weekday::Thu, 4, "Thanksgiving Day"),
    ];
    for (month, weekday, n, name) in weekday_rules {
        add_moveable(
            catalog,
            &federal,
            HolidayKind::National,
            nth_weekday(year, month, weekday, n),
            name,
        );
    }
    add_moveable(
        catalog,
        &federal,
        HolidayKind::National,
        last_weekday(year, 5, Weekday::Mon),
        "Memorial Day",
    );

    let new_york = CatalogScope::regional("US", "New York");
    add_fixed(
        catalog,
        &new_york,
        HolidayKind::Regional,
        year,
        &[(2, 12, "Lincoln's Birthday")],
    );
}

/// Easter Sunday (Gregorian), anonymous algorithm.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// nth occurrence of a weekday in a month; `None` when the month has fewer.
pub fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    let mut date = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut count = 0;

    while date.month() == month {
        if date.weekday() == weekday {
            count += 1;
            if count == n {
                return Some(date);
            }
        }
        date = date + Duration::days(1);
    }
    None
}

pub fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut date = first_of_next - Duration::days(1);

    while date.weekday() != weekday {
        date = date - Duration::days(1);
    }
    Some(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LocationCatalog;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn easter_dates_match_known_years() {
        assert_eq!(easter_sunday(2023), Some(d(2023, 4, 9)));
        assert_eq!(easter_sunday(2025), Some(d(2025, 4, 20)));
        assert_eq!(easter_sunday(2026), Some(d(2026, 4, 5)));
    }

    #[test]
    fn weekday_rules() {
        assert_eq!(nth_weekday(2025, 11, Weekday::Thu, 4), Some(d(2025, 11, 27)));
        assert_eq!(last_weekday(2025, 5, Weekday::Mon), Some(d(2025, 5, 26)));
        assert_eq!(nth_weekday(2025, 2, Weekday::Mon, 5), None);
    }

    #[test]
    fn spain_layers_have_expected_sizes() {
        let catalog = builtin_catalog(2025..=2025);
        let national = catalog.entries(&CatalogScope::national("ES"), 2025).unwrap();
        let catalonia = catalog
            .entries(&CatalogScope::regional("ES", "Catalonia"), 2025)
            .unwrap();
        let barcelona = catalog
            .entries(&CatalogScope::city("ES", "Catalonia", "Barcelona"), 2025)
            .unwrap();
        assert_eq!(national.len(), 10);
        assert_eq!(catalonia.len(), 3);
        assert_eq!(barcelona.len(), 1);
        assert!(catalonia.iter().all(|h| h.region.as_deref() == Some("Catalonia")));
    }
}
