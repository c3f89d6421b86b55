use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::office::OfficeCalendarConfig;

/// Working-day view over one office: its effective non-working days plus
/// the weekdays it does not work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeWorkCalendar {
    non_working_dates: BTreeSet<NaiveDate>,
    non_working_weekdays: HashSet<Weekday>,
}

impl OfficeWorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Returns `None` when `working_days` is empty; such a calendar would
    /// never find a working day.
    pub fn new<I, J>(working_days: I, non_working_dates: J) -> Option<Self>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let working: HashSet<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return None;
        }
        let non_working_weekdays = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working.contains(day))
            .collect();
        Some(Self {
            non_working_dates: non_working_dates.into_iter().collect(),
            non_working_weekdays,
        })
    }

    pub fn for_office(office: &OfficeCalendarConfig) -> Option<Self> {
        Self::new(office.working_days.iter().copied(), office.non_working_days())
    }

    pub fn non_working_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.non_working_dates
    }

    /// Check if the office works on `date`
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.non_working_dates.contains(&date)
            && !self.non_working_weekdays.contains(&date.weekday())
    }

    /// Find the next working day after a given date
    pub fn next_working_day(&self, from: NaiveDate) -> NaiveDate {
        let mut current = from + Duration::days(1);
        while !self.is_working_day(current) {
            current = current + Duration::days(1);
        }
        current
    }

    /// Find a date N working days ahead
    pub fn working_days_ahead(&self, from: NaiveDate, days_ahead: i64) -> NaiveDate {
        let mut current = from;
        let mut count = 0;

        while count < days_ahead {
            current = current + Duration::days(1);
            if self.is_working_day(current) {
                count += 1;
            }
        }
        current
    }

    /// Count working days in an inclusive date range
    pub fn count_working_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = start;

        while current <= end {
            if self.is_working_day(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }
}
