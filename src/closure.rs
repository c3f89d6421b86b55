use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CalendarError, CalendarResult};
use crate::holiday::HolidayKind;
use crate::overlay::EffectiveHolidaySet;

/// A company-wide closure: one day, or an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyClosure {
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurring: bool,
}

impl CompanyClosure {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        recurring: bool,
    ) -> CalendarResult<Self> {
        let closure = Self {
            name: name.into(),
            start_date,
            end_date,
            recurring,
        };
        closure.validate()?;
        Ok(closure)
    }

    pub fn single_day(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date: date,
            end_date: None,
            recurring: false,
        }
    }

    pub fn validate(&self) -> CalendarResult<()> {
        match self.end_date {
            Some(end) if end < self.start_date => Err(CalendarError::InvalidClosureRange {
                name: self.name.clone(),
                start: self.start_date,
                end,
            }),
            _ => Ok(()),
        }
    }

    fn span_days(&self) -> i64 {
        self.end_date
            .map(|end| (end - self.start_date).num_days())
            .unwrap_or(0)
            .max(0)
    }

    /// Dates this closure covers inside `year`.
    ///
    /// Recurring closures are re-anchored on their stored month/day for the
    /// previous and the target year, so a span that crosses New Year also
    /// contributes its January tail.
    pub fn dates_in_year(&self, year: i32) -> Vec<NaiveDate> {
        let span = self.span_days();
        let starts: Vec<NaiveDate> = if self.recurring {
            [year.saturating_sub(1), year]
                .into_iter()
                .filter_map(|anchor_year| anchor(self.start_date, anchor_year))
                .collect()
        } else {
            vec![self.start_date]
        };

        let (Some(first_day), Some(last_day)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Vec::new();
        };

        let mut dates = Vec::new();
        for start in starts {
            let end = start
                .checked_add_signed(Duration::days(span))
                .unwrap_or(NaiveDate::MAX);
            let from = start.max(first_day);
            let until = end.min(last_day);
            if from > until {
                continue;
            }
            dates.extend(from.iter_days().take_while(|date| *date <= until));
        }
        dates.sort();
        dates.dedup();
        dates
    }
}

/// Stored month/day moved onto `year`; Feb 29 lands on Feb 28 in common years.
fn anchor(stored: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, stored.month(), stored.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, stored.month(), stored.day() - 1))
}

/// Union of observed holiday dates and closure dates for the holiday set's
/// year. A date covered by both is counted once, and a date with an active
/// work or skip exception is never included.
pub fn compute_non_working_days(
    effective: &EffectiveHolidaySet,
    closures: &[CompanyClosure],
) -> BTreeSet<NaiveDate> {
    let excepted: BTreeSet<NaiveDate> = effective.excepted_dates().collect();
    let mut days: BTreeSet<NaiveDate> = effective.non_working_dates().collect();
    for closure in closures {
        days.extend(closure.dates_in_year(effective.year));
    }
    days.retain(|date| !excepted.contains(date));
    days
}

/// Why a date is non-working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonWorkingReason {
    pub name: String,
    pub kind: HolidayKind,
}

/// Same set as [`compute_non_working_days`], with the holiday or closure
/// behind each date. Holidays take precedence over closures in the label.
pub fn describe_non_working_days(
    effective: &EffectiveHolidaySet,
    closures: &[CompanyClosure],
) -> BTreeMap<NaiveDate, NonWorkingReason> {
    let days = compute_non_working_days(effective, closures);
    let mut described = BTreeMap::new();

    for entry in &effective.holidays {
        if days.contains(&entry.holiday.date) {
            described.insert(
                entry.holiday.date,
                NonWorkingReason {
                    name: entry.holiday.name.clone(),
                    kind: entry.holiday.kind,
                },
            );
        }
    }
    for closure in closures {
        for date in closure.dates_in_year(effective.year) {
            if days.contains(&date) {
                described.entry(date).or_insert_with(|| NonWorkingReason {
                    name: closure.name.clone(),
                    kind: HolidayKind::Company,
                });
            }
        }
    }
    described
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = CompanyClosure::new("Backwards", d(2025, 8, 10), Some(d(2025, 8, 1)), false)
            .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidClosureRange { .. }));
    }

    #[test]
    fn recurring_closure_crossing_new_year_contributes_both_ends() {
        let closure =
            CompanyClosure::new("Winter break", d(2024, 12, 30), Some(d(2025, 1, 2)), true)
                .unwrap();
        let dates = closure.dates_in_year(2026);
        assert_eq!(
            dates,
            vec![d(2026, 1, 1), d(2026, 1, 2), d(2026, 12, 30), d(2026, 12, 31)]
        );
    }

    #[test]
    fn leap_day_anchor_falls_back_to_feb_28() {
        let closure = CompanyClosure::new("Leap party", d(2024, 2, 29), None, true).unwrap();
        assert_eq!(closure.dates_in_year(2025), vec![d(2025, 2, 28)]);
        assert_eq!(closure.dates_in_year(2028), vec![d(2028, 2, 29)]);
    }

    #[test]
    fn one_off_closure_outside_year_contributes_nothing() {
        let closure = CompanyClosure::single_day("Move day", d(2024, 6, 3));
        assert!(closure.dates_in_year(2025).is_empty());
    }
}
