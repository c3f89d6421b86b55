use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diff::{DateChange, HolidayDiff};
use crate::error::{CalendarError, CalendarResult};
use crate::holiday::{Holiday, RegionalCalendar};
use crate::office::{OfficeCalendarConfig, OfficeId};

/// Lifecycle of an annual update record.
///
/// `computed -> classify -> {AutoApplied | ReviewNeeded | Pending}`, then
/// `ReviewNeeded | Pending -> accept -> Applied` or `-> reject -> Discarded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Pending,
    AutoApplied,
    ReviewNeeded,
    Applied,
    Discarded,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Pending => "pending",
            UpdateStatus::AutoApplied => "auto_applied",
            UpdateStatus::ReviewNeeded => "review_needed",
            UpdateStatus::Applied => "applied",
            UpdateStatus::Discarded => "discarded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UpdateStatus::AutoApplied | UpdateStatus::Applied | UpdateStatus::Discarded
        )
    }

    /// Waiting on an operator decision.
    pub fn is_open(&self) -> bool {
        matches!(self, UpdateStatus::Pending | UpdateStatus::ReviewNeeded)
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide what to do with a computed diff for `office`.
pub fn classify(office: &OfficeCalendarConfig, diff: &HolidayDiff) -> UpdateStatus {
    if !office.auto_update {
        UpdateStatus::Pending
    } else if diff.only_moveable_shifts() {
        UpdateStatus::AutoApplied
    } else {
        UpdateStatus::ReviewNeeded
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateChangeSummary {
    pub name: String,
    pub old_date: NaiveDate,
    pub new_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualUpdateRecord {
    pub office_id: OfficeId,
    pub year: i32,
    pub status: UpdateStatus,
    pub added: Vec<Holiday>,
    pub removed: Vec<Holiday>,
    pub date_changed: Vec<DateChange>,
    /// Calendar that replaces the office snapshot once applied.
    pub proposed: RegionalCalendar,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AnnualUpdateRecord {
    /// Build and classify a record in one step.
    pub fn computed(
        office: &OfficeCalendarConfig,
        diff: HolidayDiff,
        proposed: RegionalCalendar,
    ) -> Self {
        let status = classify(office, &diff);
        let now = Utc::now();
        Self {
            office_id: office.office_id.clone(),
            year: proposed.year,
            status,
            added: diff.added,
            removed: diff.removed,
            date_changed: diff.date_changed,
            proposed,
            created_at: now,
            resolved_at: status.is_terminal().then_some(now),
        }
    }

    pub fn date_change_summaries(&self) -> Vec<DateChangeSummary> {
        self.date_changed
            .iter()
            .map(|change| DateChangeSummary {
                name: change.name.clone(),
                old_date: change.old_date,
                new_date: change.new_date,
            })
            .collect()
    }

    pub fn accept(&mut self) -> CalendarResult<()> {
        self.transition(UpdateStatus::Applied, "accept")
    }

    pub fn reject(&mut self) -> CalendarResult<()> {
        self.transition(UpdateStatus::Discarded, "reject")
    }

    fn transition(&mut self, to: UpdateStatus, action: &'static str) -> CalendarResult<()> {
        if !self.status.is_open() {
            return Err(CalendarError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        self.status = to;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}
