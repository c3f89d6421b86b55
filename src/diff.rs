//! Year-over-year comparison of resolved calendars.
//!
//! Holidays are matched by `(name, kind)` rather than by date: a moveable
//! holiday lands on a different date every year yet is still the same
//! holiday. The catalog carries no stable holiday id, so two entries that
//! share a name under different kinds (a national and a regional "Good
//! Friday") are treated as unrelated.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::holiday::{Holiday, HolidayKind, RegionalCalendar};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateChange {
    pub name: String,
    pub kind: HolidayKind,
    pub old_date: NaiveDate,
    pub new_date: NaiveDate,
    /// True only when both the old and the new entry are flagged moveable.
    pub moveable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayDiff {
    pub added: Vec<Holiday>,
    pub removed: Vec<Holiday>,
    pub date_changed: Vec<DateChange>,
}

impl HolidayDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.date_changed.is_empty()
    }

    /// No additions or removals, and every date change is on a moveable
    /// holiday.
    pub fn only_moveable_shifts(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.date_changed.iter().all(|change| change.moveable)
    }
}

type MatchKey = (String, HolidayKind);

fn group(calendar: &RegionalCalendar) -> BTreeMap<MatchKey, Vec<&Holiday>> {
    let mut groups: BTreeMap<MatchKey, Vec<&Holiday>> = BTreeMap::new();
    for holiday in calendar.holidays() {
        groups
            .entry((holiday.name.clone(), holiday.kind))
            .or_default()
            .push(holiday);
    }
    groups
}

fn same_day_of_year(a: NaiveDate, b: NaiveDate) -> bool {
    a.month() == b.month() && a.day() == b.day()
}

/// Compare `old` against `new`.
///
/// Entries sharing a key inside one calendar are paired in date order and
/// the leftovers become additions or removals. A matched pair whose
/// month/day differs is a date change whatever its moveable flag says.
pub fn diff(old: &RegionalCalendar, new: &RegionalCalendar) -> HolidayDiff {
    let mut old_groups = group(old);
    let new_groups = group(new);
    let mut result = HolidayDiff::default();

    for (key, new_entries) in new_groups {
        let old_entries = old_groups.remove(&key).unwrap_or_default();
        let paired = old_entries.len().min(new_entries.len());

        for (old_holiday, new_holiday) in old_entries.iter().zip(new_entries.iter()) {
            if !same_day_of_year(old_holiday.date, new_holiday.date) {
                result.date_changed.push(DateChange {
                    name: new_holiday.name.clone(),
                    kind: new_holiday.kind,
                    old_date: old_holiday.date,
                    new_date: new_holiday.date,
                    moveable: old_holiday.moveable && new_holiday.moveable,
                });
            }
        }
        result.added.extend(new_entries.iter().skip(paired).copied().cloned());
        result.removed.extend(old_entries.iter().skip(paired).copied().cloned());
    }
    for (_, old_entries) in old_groups {
        result.removed.extend(old_entries.into_iter().cloned());
    }

    result.added.sort_by_key(|h| h.date);
    result.removed.sort_by_key(|h| h.date);
    result.date_changed.sort_by_key(|c| c.new_date);
    result
}
