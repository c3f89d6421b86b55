pub mod calendar;
pub mod catalog;
pub mod closure;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod holiday;
pub mod notifier;
pub mod office;
pub mod overlay;
pub mod persistence;
pub mod resolver;
pub mod update;

#[cfg(feature = "http_api")]
pub mod http_api;
#[cfg(any(feature = "cli", feature = "http_api"))]
pub mod telemetry;

pub use calendar::OfficeWorkCalendar;
pub use catalog::{InMemoryCatalog, LocationCatalog, builtin_catalog};
pub use closure::{CompanyClosure, NonWorkingReason, compute_non_working_days};
pub use config::{ConfigError, EngineConfig};
pub use diff::{DateChange, HolidayDiff, diff};
pub use engine::{HolidayEngine, OfficeUpdateOutcome};
pub use error::{CalendarError, CalendarResult};
pub use holiday::{CatalogScope, Holiday, HolidayKind, LocationKey, RegionalCalendar};
pub use notifier::{TracingNotifier, UpdateNotice, UpdateNotifier};
pub use office::{OfficeCalendarConfig, OfficeId};
pub use overlay::{
    EffectiveHoliday, EffectiveHolidaySet, ExceptionAction, HolidayException, HolidayStatus,
    StaleException,
};
pub use persistence::{
    InMemoryOfficeDirectory, OfficeDirectory, PersistenceError, load_catalog_from_csv,
    load_catalog_from_json, load_offices_from_json, save_catalog_to_csv, save_catalog_to_json,
    save_offices_to_json,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteOfficeDirectory;
pub use resolver::{resolve, resolve_at};
pub use update::{AnnualUpdateRecord, DateChangeSummary, UpdateStatus, classify};
