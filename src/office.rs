use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::closure::{self, CompanyClosure};
use crate::holiday::{LocationKey, RegionalCalendar};
use crate::overlay::{self, EffectiveHolidaySet, HolidayException};
use crate::update::AnnualUpdateRecord;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfficeId(String);

impl OfficeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OfficeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OfficeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for OfficeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_working_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
}

/// Everything the engine keeps per office.
///
/// `calendar` is a snapshot taken when it was applied; later catalog changes
/// only reach the office through an accepted annual update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficeCalendarConfig {
    pub office_id: OfficeId,
    pub location: LocationKey,
    pub calendar: RegionalCalendar,
    pub auto_update: bool,
    #[serde(default)]
    pub closures: Vec<CompanyClosure>,
    #[serde(default)]
    pub exceptions: Vec<HolidayException>,
    #[serde(default = "default_working_days")]
    pub working_days: Vec<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_update: Option<AnnualUpdateRecord>,
    /// Latest record the annual cycle finished: auto-applied, accepted or
    /// rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<AnnualUpdateRecord>,
}

impl OfficeCalendarConfig {
    pub fn new(
        office_id: OfficeId,
        location: LocationKey,
        calendar: RegionalCalendar,
        auto_update: bool,
    ) -> Self {
        Self {
            office_id,
            location,
            calendar,
            auto_update,
            closures: Vec::new(),
            exceptions: Vec::new(),
            working_days: default_working_days(),
            open_update: None,
            last_update: None,
        }
    }

    pub fn effective_holidays(&self) -> EffectiveHolidaySet {
        overlay::apply(&self.calendar, &self.exceptions)
    }

    pub fn non_working_days(&self) -> BTreeSet<NaiveDate> {
        closure::compute_non_working_days(&self.effective_holidays(), &self.closures)
    }

    /// Swap in a new snapshot and prune exceptions against it.
    pub fn replace_calendar(&mut self, calendar: RegionalCalendar) -> Vec<overlay::StaleException> {
        let (kept, pruned) = overlay::prune_exceptions(&self.exceptions, &calendar);
        self.calendar = calendar;
        self.exceptions = kept;
        pruned
    }
}
