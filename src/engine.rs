use chrono::NaiveDate;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::calendar::OfficeWorkCalendar;
use crate::catalog::LocationCatalog;
use crate::closure::{self, CompanyClosure, NonWorkingReason};
use crate::diff;
use crate::error::{CalendarError, CalendarResult};
use crate::holiday::{LocationKey, RegionalCalendar};
use crate::notifier::{TracingNotifier, UpdateNotice, UpdateNotifier};
use crate::office::{OfficeCalendarConfig, OfficeId};
use crate::overlay::{self, ExceptionAction, HolidayException};
use crate::persistence::{OfficeDirectory, PersistenceError};
use crate::resolver;
use crate::update::{AnnualUpdateRecord, UpdateStatus};

/// Result of the annual cycle for one office.
#[derive(Debug)]
pub struct OfficeUpdateOutcome {
    pub office_id: OfficeId,
    pub result: CalendarResult<AnnualUpdateRecord>,
}

impl OfficeUpdateOutcome {
    pub fn record(&self) -> Option<&AnnualUpdateRecord> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CalendarError> {
        self.result.as_ref().err()
    }
}

/// Entry point for every calendar operation on offices.
///
/// Reads go straight to the directory. Every write to an office holds that
/// office's lock for the whole load-modify-store cycle, so two writers never
/// interleave on one office while different offices proceed independently.
pub struct HolidayEngine {
    catalog: Arc<dyn LocationCatalog>,
    directory: Arc<dyn OfficeDirectory>,
    notifier: Arc<dyn UpdateNotifier>,
    office_locks: Mutex<HashMap<OfficeId, Arc<Mutex<()>>>>,
}

impl HolidayEngine {
    pub fn new(catalog: Arc<dyn LocationCatalog>, directory: Arc<dyn OfficeDirectory>) -> Self {
        Self {
            catalog,
            directory,
            notifier: Arc::new(TracingNotifier),
            office_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn UpdateNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn catalog(&self) -> &dyn LocationCatalog {
        self.catalog.as_ref()
    }

    fn office_lock(&self, office_id: &OfficeId) -> Arc<Mutex<()>> {
        self.office_locks
            .lock()
            .entry(office_id.clone())
            .or_default()
            .clone()
    }

    /// Drop the lock entry of an office that turned out not to exist, unless
    /// another caller is holding it.
    fn forget_lock(&self, office_id: &OfficeId, lock: Arc<Mutex<()>>) {
        let mut locks = self.office_locks.lock();
        drop(lock);
        if locks
            .get(office_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(office_id);
        }
    }

    /// Run `work` under the office's lock. The lock entry is released again
    /// when the office does not exist.
    fn locked<T>(
        &self,
        office_id: &OfficeId,
        work: impl FnOnce() -> CalendarResult<T>,
    ) -> CalendarResult<T> {
        let lock = self.office_lock(office_id);
        let result = {
            let _guard = lock.lock();
            work()
        };
        if matches!(result, Err(CalendarError::UnknownOffice(_))) {
            self.forget_lock(office_id, lock);
        }
        result
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.office_locks.lock().len()
    }

    fn load(&self, office_id: &OfficeId) -> CalendarResult<OfficeCalendarConfig> {
        self.directory
            .get(office_id)?
            .ok_or_else(|| CalendarError::UnknownOffice(office_id.clone()))
    }

    /// Load, mutate and store one office under its lock. Nothing is stored
    /// when `mutate` fails.
    fn with_office<T>(
        &self,
        office_id: &OfficeId,
        mutate: impl FnOnce(&mut OfficeCalendarConfig) -> CalendarResult<T>,
    ) -> CalendarResult<T> {
        self.locked(office_id, || {
            let mut office = self.load(office_id)?;
            let value = mutate(&mut office)?;
            self.directory.put(&office)?;
            Ok(value)
        })
    }

    pub fn resolve_calendar(
        &self,
        location: &LocationKey,
        year: i32,
    ) -> CalendarResult<RegionalCalendar> {
        resolver::resolve(self.catalog.as_ref(), location, year)
    }

    pub fn office(&self, office_id: &OfficeId) -> CalendarResult<OfficeCalendarConfig> {
        self.load(office_id)
    }

    pub fn offices(&self) -> CalendarResult<Vec<OfficeCalendarConfig>> {
        let mut offices = Vec::new();
        for office_id in self.directory.list_ids()? {
            offices.push(self.load(&office_id)?);
        }
        Ok(offices)
    }

    /// Create the office or replace its calendar snapshot.
    ///
    /// Existing closures, working days and still-valid exceptions carry
    /// over. An open annual update is discarded.
    pub fn apply_calendar(
        &self,
        office_id: &OfficeId,
        location: LocationKey,
        calendar: RegionalCalendar,
        auto_update: bool,
    ) -> CalendarResult<OfficeCalendarConfig> {
        let lock = self.office_lock(office_id);
        let _guard = lock.lock();

        let (office, superseded) = match self.directory.get(office_id)? {
            Some(mut office) => {
                office.location = location;
                office.auto_update = auto_update;
                office.replace_calendar(calendar);
                let mut superseded = office.open_update.take();
                if let Some(record) = superseded.as_mut() {
                    record.reject()?;
                }
                (office, superseded)
            }
            None => (
                OfficeCalendarConfig::new(office_id.clone(), location, calendar, auto_update),
                None,
            ),
        };
        self.directory.put(&office)?;

        info!(
            office_id = %office_id,
            location = %office.location,
            year = office.calendar.year,
            source = %office.calendar.source,
            holidays = office.calendar.len(),
            auto_update,
            "applied calendar"
        );
        if let Some(record) = superseded {
            self.notifier.notify(&UpdateNotice::from_record(&record));
        }
        Ok(office)
    }

    /// Toggle a work/skip exception on one of the office's holidays.
    pub fn set_exception(
        &self,
        office_id: &OfficeId,
        holiday_date: NaiveDate,
        action: ExceptionAction,
        reason: Option<String>,
    ) -> CalendarResult<Vec<HolidayException>> {
        self.with_office(office_id, |office| {
            let holiday = office.calendar.holiday_on(holiday_date).cloned().ok_or_else(|| {
                CalendarError::HolidayNotInCalendar {
                    office_id: office_id.clone(),
                    date: holiday_date,
                }
            })?;
            office.exceptions =
                overlay::toggle_exception(&office.exceptions, &holiday, action, reason);
            info!(
                office_id = %office_id,
                date = %holiday_date,
                holiday = %holiday.name,
                action = %action,
                active = office.exceptions.iter().any(|e| e.holiday_date == holiday_date),
                "toggled holiday exception"
            );
            Ok(office.exceptions.clone())
        })
    }

    /// Add a closure, replacing any closure with the same name.
    pub fn add_closure(
        &self,
        office_id: &OfficeId,
        closure: CompanyClosure,
    ) -> CalendarResult<Vec<CompanyClosure>> {
        closure.validate()?;
        self.with_office(office_id, |office| {
            office.closures.retain(|existing| existing.name != closure.name);
            office.closures.push(closure);
            office.closures.sort_by_key(|c| c.start_date);
            Ok(office.closures.clone())
        })
    }

    pub fn remove_closure(
        &self,
        office_id: &OfficeId,
        name: &str,
    ) -> CalendarResult<Vec<CompanyClosure>> {
        self.with_office(office_id, |office| {
            let before = office.closures.len();
            office.closures.retain(|existing| existing.name != name);
            if office.closures.len() == before {
                return Err(CalendarError::UnknownClosure {
                    office_id: office_id.clone(),
                    name: name.to_string(),
                });
            }
            Ok(office.closures.clone())
        })
    }

    pub fn effective_non_working_days(
        &self,
        office_id: &OfficeId,
    ) -> CalendarResult<BTreeSet<NaiveDate>> {
        Ok(self.load(office_id)?.non_working_days())
    }

    pub fn describe_non_working_days(
        &self,
        office_id: &OfficeId,
    ) -> CalendarResult<BTreeMap<NaiveDate, NonWorkingReason>> {
        let office = self.load(office_id)?;
        Ok(closure::describe_non_working_days(
            &office.effective_holidays(),
            &office.closures,
        ))
    }

    pub fn work_calendar(&self, office_id: &OfficeId) -> CalendarResult<OfficeWorkCalendar> {
        let office = self.load(office_id)?;
        OfficeWorkCalendar::for_office(&office).ok_or_else(|| {
            PersistenceError::InvalidData(format!("office {office_id} has no working days")).into()
        })
    }

    /// Run the yearly refresh for every office.
    ///
    /// Offices are processed in parallel and independently; each one yields
    /// an outcome, including failures such as a location the catalog no
    /// longer covers.
    pub fn run_annual_update(&self, year: i32) -> Vec<OfficeUpdateOutcome> {
        let office_ids = match self.directory.list_ids() {
            Ok(ids) => ids,
            Err(err) => {
                error!(year, error = %err, "could not list offices for the annual update");
                return Vec::new();
            }
        };

        let outcomes: Vec<OfficeUpdateOutcome> = office_ids
            .into_par_iter()
            .map(|office_id| {
                let result = self.update_office(&office_id, year);
                if let Err(err) = &result {
                    warn!(office_id = %office_id, year, error = %err, "annual update failed");
                }
                OfficeUpdateOutcome { office_id, result }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(year, offices = outcomes.len(), failed, "annual update finished");
        outcomes
    }

    fn update_office(&self, office_id: &OfficeId, year: i32) -> CalendarResult<AnnualUpdateRecord> {
        self.locked(office_id, || self.update_office_locked(office_id, year))
    }

    /// One record per office and cycle: a cycle already run hands back its
    /// record, and a cycle not newer than the office calendar is refused.
    fn update_office_locked(
        &self,
        office_id: &OfficeId,
        year: i32,
    ) -> CalendarResult<AnnualUpdateRecord> {
        let mut office = self.load(office_id)?;

        let mut earlier = office.open_update.iter().chain(office.last_update.iter());
        if let Some(record) = earlier.find(|record| record.year == year) {
            return Ok(record.clone());
        }
        if year <= office.calendar.year {
            return Err(CalendarError::StaleCycle {
                office_id: office_id.clone(),
                year,
                calendar_year: office.calendar.year,
            });
        }

        let proposed = resolver::resolve(self.catalog.as_ref(), &office.location, year)?;
        let changes = diff::diff(&office.calendar, &proposed);
        let record = AnnualUpdateRecord::computed(&office, changes, proposed);

        let superseded = office.open_update.take().map(|mut old| {
            // still open, so reject cannot fail
            let _ = old.reject();
            old
        });

        if record.status == UpdateStatus::AutoApplied {
            office.replace_calendar(record.proposed.clone());
            office.last_update = Some(record.clone());
        } else {
            office.open_update = Some(record.clone());
        }
        self.directory.put(&office)?;

        if let Some(old) = superseded {
            self.notifier.notify(&UpdateNotice::from_record(&old));
        }
        self.notifier.notify(&UpdateNotice::from_record(&record));
        Ok(record)
    }

    /// Apply the office's open update and prune exceptions against it.
    pub fn accept_update(&self, office_id: &OfficeId) -> CalendarResult<AnnualUpdateRecord> {
        let record = self.with_office(office_id, |office| {
            let mut record = office
                .open_update
                .take()
                .ok_or_else(|| CalendarError::NoOpenUpdate(office_id.clone()))?;
            record.accept()?;
            let pruned = office.replace_calendar(record.proposed.clone());
            office.last_update = Some(record.clone());
            info!(
                office_id = %office_id,
                year = record.year,
                pruned_exceptions = pruned.len(),
                "accepted annual update"
            );
            Ok(record)
        })?;
        self.notifier.notify(&UpdateNotice::from_record(&record));
        Ok(record)
    }

    /// Discard the office's open update; the current calendar stays in force.
    pub fn reject_update(&self, office_id: &OfficeId) -> CalendarResult<AnnualUpdateRecord> {
        let record = self.with_office(office_id, |office| {
            let mut record = office
                .open_update
                .take()
                .ok_or_else(|| CalendarError::NoOpenUpdate(office_id.clone()))?;
            record.reject()?;
            office.last_update = Some(record.clone());
            info!(office_id = %office_id, year = record.year, "rejected annual update");
            Ok(record)
        })?;
        self.notifier.notify(&UpdateNotice::from_record(&record));
        Ok(record)
    }

    /// Records waiting on an operator decision, one per office at most.
    pub fn open_updates(&self) -> CalendarResult<Vec<AnnualUpdateRecord>> {
        Ok(self
            .offices()?
            .into_iter()
            .filter_map(|office| office.open_update)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_catalog;
    use crate::persistence::InMemoryOfficeDirectory;

    fn engine() -> HolidayEngine {
        HolidayEngine::new(
            Arc::new(builtin_catalog(2025..=2025)),
            Arc::new(InMemoryOfficeDirectory::new()),
        )
    }

    #[test]
    fn unknown_offices_leave_no_lock_behind() {
        let engine = engine();
        let missing = OfficeId::from("nope");
        for _ in 0..3 {
            let result =
                engine.set_exception(&missing, NaiveDate::MIN, ExceptionAction::Work, None);
            assert!(matches!(result, Err(CalendarError::UnknownOffice(_))));
            assert!(engine.remove_closure(&missing, "August").is_err());
            assert!(engine.accept_update(&missing).is_err());
        }
        assert_eq!(engine.tracked_locks(), 0);
    }

    #[test]
    fn known_offices_keep_their_lock() {
        let engine = engine();
        let location = LocationKey::new("ES", "Madrid");
        let calendar = engine.resolve_calendar(&location, 2025).unwrap();
        let office_id = OfficeId::from("mad");
        engine.apply_calendar(&office_id, location, calendar, true).unwrap();
        engine.remove_closure(&office_id, "August").unwrap_err();
        assert_eq!(engine.tracked_locks(), 1);
    }
}
