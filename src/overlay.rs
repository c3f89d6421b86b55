use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use crate::holiday::{Holiday, HolidayKind, RegionalCalendar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionAction {
    /// The office works through the holiday.
    Work,
    /// The holiday is not observed by the office.
    Skip,
}

impl ExceptionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionAction::Work => "work",
            ExceptionAction::Skip => "skip",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "work" => Some(ExceptionAction::Work),
            "skip" => Some(ExceptionAction::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for ExceptionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayException {
    pub holiday_date: NaiveDate,
    pub holiday_name: String,
    pub holiday_kind: HolidayKind,
    pub action: ExceptionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// How an office treats one holiday after exceptions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayStatus {
    Observed,
    OfficeWorks,
    NotObserved,
}

impl HolidayStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HolidayStatus::Observed => "observed",
            HolidayStatus::OfficeWorks => "office works",
            HolidayStatus::NotObserved => "not observed",
        }
    }

    pub fn is_non_working(&self) -> bool {
        matches!(self, HolidayStatus::Observed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveHoliday {
    pub holiday: Holiday,
    pub status: HolidayStatus,
}

/// A calendar's holidays tagged with their status for one office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveHolidaySet {
    pub year: i32,
    pub holidays: Vec<EffectiveHoliday>,
}

impl EffectiveHolidaySet {
    /// Dates that remain non-working after exceptions.
    pub fn non_working_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.holidays
            .iter()
            .filter(|entry| entry.status.is_non_working())
            .map(|entry| entry.holiday.date)
    }

    /// Dates carrying an active work or skip exception.
    pub fn excepted_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.holidays
            .iter()
            .filter(|entry| !entry.status.is_non_working())
            .map(|entry| entry.holiday.date)
    }
}

pub fn apply(calendar: &RegionalCalendar, exceptions: &[HolidayException]) -> EffectiveHolidaySet {
    let by_date: BTreeMap<NaiveDate, ExceptionAction> = exceptions
        .iter()
        .map(|exception| (exception.holiday_date, exception.action))
        .collect();

    let holidays = calendar
        .holidays()
        .iter()
        .map(|holiday| {
            let status = match by_date.get(&holiday.date) {
                None => HolidayStatus::Observed,
                Some(ExceptionAction::Work) => HolidayStatus::OfficeWorks,
                Some(ExceptionAction::Skip) => HolidayStatus::NotObserved,
            };
            EffectiveHoliday {
                holiday: holiday.clone(),
                status,
            }
        })
        .collect();

    EffectiveHolidaySet {
        year: calendar.year,
        holidays,
    }
}

/// Toggle an exception on `holiday`.
///
/// Same date and action as an existing exception removes it; a different
/// action replaces it; otherwise a new exception is added. The result keeps
/// at most one exception per date, ordered by date.
pub fn toggle_exception(
    existing: &[HolidayException],
    holiday: &Holiday,
    action: ExceptionAction,
    reason: Option<String>,
) -> Vec<HolidayException> {
    let mut next: Vec<HolidayException> = existing
        .iter()
        .filter(|exception| exception.holiday_date != holiday.date)
        .cloned()
        .collect();

    let already_set = existing
        .iter()
        .any(|exception| exception.holiday_date == holiday.date && exception.action == action);

    if !already_set {
        next.push(HolidayException {
            holiday_date: holiday.date,
            holiday_name: holiday.name.clone(),
            holiday_kind: holiday.kind,
            action,
            reason,
        });
    }
    next.sort_by_key(|exception| exception.holiday_date);
    next
}

/// An exception dropped because its holiday is gone from the calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaleException {
    pub exception: HolidayException,
    pub calendar_year: i32,
}

/// Keep exceptions whose holiday is still in `calendar`.
///
/// A holiday is matched on name and kind, like the annual diff. One that
/// survives under a new date (a moveable feast in the next year) keeps its
/// exception, re-pointed at the new date. Anything else is pruned and logged.
pub fn prune_exceptions(
    exceptions: &[HolidayException],
    calendar: &RegionalCalendar,
) -> (Vec<HolidayException>, Vec<StaleException>) {
    let mut kept: Vec<HolidayException> = Vec::with_capacity(exceptions.len());
    let mut pruned = Vec::new();

    for exception in exceptions {
        let same_holiday = |holiday: &&Holiday| {
            holiday.name == exception.holiday_name && holiday.kind == exception.holiday_kind
        };
        let matched = calendar
            .holiday_on(exception.holiday_date)
            .filter(same_holiday)
            .or_else(|| calendar.holidays().iter().find(same_holiday));

        match matched {
            Some(holiday) if !kept.iter().any(|k| k.holiday_date == holiday.date) => {
                kept.push(HolidayException {
                    holiday_date: holiday.date,
                    holiday_name: holiday.name.clone(),
                    ..exception.clone()
                });
            }
            _ => {
                warn!(
                    location = %calendar.location,
                    year = calendar.year,
                    date = %exception.holiday_date,
                    holiday = %exception.holiday_name,
                    action = %exception.action,
                    "pruning exception whose holiday is no longer in the calendar"
                );
                pruned.push(StaleException {
                    exception: exception.clone(),
                    calendar_year: calendar.year,
                });
            }
        }
    }
    kept.sort_by_key(|exception| exception.holiday_date);
    (kept, pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holiday::LocationKey;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar(year: i32, holidays: Vec<Holiday>) -> RegionalCalendar {
        RegionalCalendar::manual(LocationKey::new("ES", "Catalonia"), year, holidays)
    }

    #[test]
    fn toggle_switches_action_in_place() {
        let holiday = Holiday::new(d(2025, 12, 8), "Immaculate Conception", HolidayKind::National);
        let worked = toggle_exception(&[], &holiday, ExceptionAction::Work, None);
        let skipped = toggle_exception(&worked, &holiday, ExceptionAction::Skip, None);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].action, ExceptionAction::Skip);
    }

    #[test]
    fn prune_follows_moveable_holiday_to_its_new_date() {
        let old_cal = calendar(
            2025,
            vec![Holiday::moveable(d(2025, 4, 21), "Easter Monday", HolidayKind::Regional)],
        );
        let exceptions = toggle_exception(&[], &old_cal.holidays()[0], ExceptionAction::Work, None);
        let new_cal = calendar(
            2026,
            vec![Holiday::moveable(d(2026, 4, 6), "Easter Monday", HolidayKind::Regional)],
        );
        let (kept, pruned) = prune_exceptions(&exceptions, &new_cal);
        assert!(pruned.is_empty());
        assert_eq!(kept[0].holiday_date, d(2026, 4, 6));
    }

    #[test]
    fn prune_drops_exception_for_vanished_holiday() {
        let old_cal = calendar(
            2025,
            vec![Holiday::new(d(2025, 9, 24), "La Mercè", HolidayKind::Local)],
        );
        let exceptions = toggle_exception(&[], &old_cal.holidays()[0], ExceptionAction::Skip, None);
        let new_cal = calendar(2026, vec![]);
        let (kept, pruned) = prune_exceptions(&exceptions, &new_cal);
        assert!(kept.is_empty());
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].calendar_year, 2026);
    }

    #[test]
    fn prune_drops_exception_when_holiday_changes_kind() {
        let old_cal = calendar(
            2025,
            vec![Holiday::new(d(2025, 6, 24), "Saint John", HolidayKind::Local)],
        );
        let exceptions = toggle_exception(&[], &old_cal.holidays()[0], ExceptionAction::Work, None);
        let new_cal = calendar(
            2026,
            vec![Holiday::new(d(2026, 6, 24), "Saint John", HolidayKind::Regional)],
        );
        let (kept, pruned) = prune_exceptions(&exceptions, &new_cal);
        assert!(kept.is_empty());
        assert_eq!(pruned[0].exception.holiday_kind, HolidayKind::Local);
    }
}
