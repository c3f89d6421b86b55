use chrono::NaiveDate;
use thiserror::Error;

use crate::holiday::LocationKey;
use crate::office::OfficeId;
use crate::persistence::PersistenceError;
use crate::update::UpdateStatus;

#[derive(Debug, Error)]
pub enum CalendarError {
    /// The catalog has nothing for the location chain; the operator has to
    /// create the calendar manually.
    #[error("no holiday data for {location} in {year}; create the calendar manually")]
    NotFound { location: LocationKey, year: i32 },

    #[error("office {0} not found")]
    UnknownOffice(OfficeId),

    #[error("office {office_id} has no holiday on {date} in its current calendar")]
    HolidayNotInCalendar { office_id: OfficeId, date: NaiveDate },

    #[error("closure '{name}' ends on {end} before it starts on {start}")]
    InvalidClosureRange {
        name: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("office {office_id} has no closure named '{name}'")]
    UnknownClosure { office_id: OfficeId, name: String },

    #[error(
        "office {office_id} already has a {calendar_year} calendar; cannot run the {year} cycle"
    )]
    StaleCycle {
        office_id: OfficeId,
        year: i32,
        calendar_year: i32,
    },

    #[error("office {0} has no open annual update")]
    NoOpenUpdate(OfficeId),

    #[error("cannot {action} an update that is {from}")]
    InvalidTransition {
        from: UpdateStatus,
        action: &'static str,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type CalendarResult<T> = Result<T, CalendarError>;
