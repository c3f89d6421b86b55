use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a holiday comes from. Closure-derived rows use `Company`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayKind {
    National,
    Regional,
    Local,
    Company,
}

impl HolidayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayKind::National => "national",
            HolidayKind::Regional => "regional",
            HolidayKind::Local => "local",
            HolidayKind::Company => "company",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "national" => Some(HolidayKind::National),
            "regional" => Some(HolidayKind::Regional),
            "local" => Some(HolidayKind::Local),
            "company" => Some(HolidayKind::Company),
            _ => None,
        }
    }
}

impl fmt::Display for HolidayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    pub kind: HolidayKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default = "default_recurring")]
    pub recurring: bool,
    #[serde(default)]
    pub moveable: bool,
}

fn default_recurring() -> bool {
    true
}

impl Holiday {
    pub fn new(date: NaiveDate, name: impl Into<String>, kind: HolidayKind) -> Self {
        Self {
            date,
            name: name.into(),
            kind,
            region: None,
            recurring: true,
            moveable: false,
        }
    }

    /// Recurring holiday whose date shifts every year (Easter-linked and similar).
    pub fn moveable(date: NaiveDate, name: impl Into<String>, kind: HolidayKind) -> Self {
        Self {
            moveable: true,
            ..Self::new(date, name, kind)
        }
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn one_off(mut self) -> Self {
        self.recurring = false;
        self
    }
}

/// Composite location key: country and region, optionally narrowed to a city.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub country: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl LocationKey {
    pub fn new(country: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: region.into(),
            city: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn national_scope(&self) -> CatalogScope {
        CatalogScope {
            country: self.country.clone(),
            region: None,
            city: None,
        }
    }

    pub fn regional_scope(&self) -> CatalogScope {
        CatalogScope {
            country: self.country.clone(),
            region: Some(self.region.clone()),
            city: None,
        }
    }

    pub fn city_scope(&self) -> Option<CatalogScope> {
        self.city.as_ref().map(|city| CatalogScope {
            country: self.country.clone(),
            region: Some(self.region.clone()),
            city: Some(city.clone()),
        })
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.city {
            Some(city) => write!(f, "{}/{}/{}", self.country, self.region, city),
            None => write!(f, "{}/{}", self.country, self.region),
        }
    }
}

/// One registration level inside the catalog index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogScope {
    pub country: String,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl CatalogScope {
    pub fn national(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: None,
            city: None,
        }
    }

    pub fn regional(country: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: Some(region.into()),
            city: None,
        }
    }

    pub fn city(
        country: impl Into<String>,
        region: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            region: Some(region.into()),
            city: Some(city.into()),
        }
    }

    /// Higher wins when two layers put a holiday on the same date.
    pub fn specificity(&self) -> u8 {
        match (&self.region, &self.city) {
            (_, Some(_)) => 2,
            (Some(_), None) => 1,
            (None, None) => 0,
        }
    }
}

impl fmt::Display for CatalogScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.country)?;
        if let Some(region) = &self.region {
            write!(f, "/{region}")?;
        }
        if let Some(city) = &self.city {
            write!(f, "/{city}")?;
        }
        Ok(())
    }
}

/// A resolved holiday set for one location and year. Holidays are kept
/// sorted by date with no two entries on the same date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalCalendar {
    pub location: LocationKey,
    pub year: i32,
    holidays: Vec<Holiday>,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

impl RegionalCalendar {
    pub const MANUAL_SOURCE: &'static str = "manual";

    /// Callers must hand over holidays already sorted with unique dates; the
    /// resolver and [`RegionalCalendar::manual`] both guarantee that.
    pub(crate) fn from_sorted(
        location: LocationKey,
        year: i32,
        holidays: Vec<Holiday>,
        source: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(holidays.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            location,
            year,
            holidays,
            source: source.into(),
            updated_at,
        }
    }

    /// Operator-supplied calendar for locations the catalog does not cover.
    /// Entries outside `year` are ignored and the first entry wins on a
    /// shared date.
    pub fn manual(location: LocationKey, year: i32, holidays: Vec<Holiday>) -> Self {
        let mut kept: Vec<Holiday> = holidays
            .into_iter()
            .filter(|holiday| holiday.date.year() == year)
            .collect();
        kept.sort_by_key(|holiday| holiday.date);
        kept.dedup_by(|later, earlier| later.date == earlier.date);
        Self::from_sorted(location, year, kept, Self::MANUAL_SOURCE, Utc::now())
    }

    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    pub fn holiday_on(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays
            .binary_search_by_key(&date, |holiday| holiday.date)
            .ok()
            .map(|idx| &self.holidays[idx])
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.holiday_on(date).is_some()
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn manual_calendar_sorts_and_drops_duplicate_dates() {
        let location = LocationKey::new("PT", "Lisboa");
        let calendar = RegionalCalendar::manual(
            location,
            2025,
            vec![
                Holiday::new(d(2025, 6, 13), "Santo António", HolidayKind::Local),
                Holiday::new(d(2025, 1, 1), "Ano Novo", HolidayKind::National),
                Holiday::new(d(2025, 6, 13), "Duplicate", HolidayKind::Local),
                Holiday::new(d(2024, 12, 25), "Wrong year", HolidayKind::National),
            ],
        );
        let names: Vec<&str> = calendar.holidays().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Ano Novo", "Santo António"]);
        assert_eq!(calendar.source, RegionalCalendar::MANUAL_SOURCE);
    }

    #[test]
    fn scope_specificity_orders_city_over_region_over_country() {
        let location = LocationKey::new("ES", "Catalonia").with_city("Barcelona");
        let city = location.city_scope().unwrap();
        assert!(city.specificity() > location.regional_scope().specificity());
        assert!(location.regional_scope().specificity() > location.national_scope().specificity());
        assert_eq!(city.to_string(), "ES/Catalonia/Barcelona");
    }
}
