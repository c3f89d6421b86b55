use serde::Serialize;
use tracing::info;

use crate::office::OfficeId;
use crate::update::{AnnualUpdateRecord, UpdateStatus};

/// Short operator-facing summary of an update record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateNotice {
    pub office_id: OfficeId,
    pub year: i32,
    pub status: UpdateStatus,
    pub headline: String,
    pub details: Vec<String>,
}

impl UpdateNotice {
    pub fn from_record(record: &AnnualUpdateRecord) -> Self {
        let headline = match record.status {
            UpdateStatus::AutoApplied => format!(
                "{} holidays for {} were applied automatically",
                record.year, record.office_id
            ),
            UpdateStatus::ReviewNeeded => format!(
                "{} holidays for {} need review before they take effect",
                record.year, record.office_id
            ),
            UpdateStatus::Pending => format!(
                "{} holidays for {} are waiting for manual approval",
                record.year, record.office_id
            ),
            UpdateStatus::Applied => format!(
                "{} holidays for {} were accepted",
                record.year, record.office_id
            ),
            UpdateStatus::Discarded => format!(
                "{} holidays for {} were rejected; the previous calendar stays in force",
                record.year, record.office_id
            ),
        };

        let mut details = Vec::new();
        for holiday in &record.added {
            details.push(format!("added: {} on {} ({})", holiday.name, holiday.date, holiday.kind));
        }
        for holiday in &record.removed {
            details.push(format!(
                "removed: {} on {} ({})",
                holiday.name, holiday.date, holiday.kind
            ));
        }
        for change in &record.date_changed {
            let flag = if change.moveable { "" } else { " [fixed holiday moved]" };
            details.push(format!(
                "moved: {} from {} to {}{}",
                change.name, change.old_date, change.new_date, flag
            ));
        }

        Self {
            office_id: record.office_id.clone(),
            year: record.year,
            status: record.status,
            headline,
            details,
        }
    }
}

/// Receives every record produced by an annual cycle and every operator
/// decision on one.
pub trait UpdateNotifier: Send + Sync {
    fn notify(&self, notice: &UpdateNotice);
}

/// Default notifier: writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl UpdateNotifier for TracingNotifier {
    fn notify(&self, notice: &UpdateNotice) {
        info!(
            office_id = %notice.office_id,
            year = notice.year,
            status = %notice.status,
            changes = notice.details.len(),
            "{}",
            notice.headline
        );
    }
}
