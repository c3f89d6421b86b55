use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AnnualUpdateRecord, CalendarError, CompanyClosure, ExceptionAction, Holiday, HolidayEngine,
    HolidayException, HolidayKind, LocationKey, OfficeCalendarConfig, OfficeId,
    OfficeUpdateOutcome, RegionalCalendar,
};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<HolidayEngine>,
}

impl AppState {
    pub fn new(engine: HolidayEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn with_shared(engine: Arc<HolidayEngine>) -> Self {
        Self { engine }
    }

    fn engine(&self) -> Arc<HolidayEngine> {
        self.engine.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<CalendarError> for ApiError {
    fn from(value: CalendarError) -> Self {
        let message = value.to_string();
        match value {
            CalendarError::NotFound { .. }
            | CalendarError::UnknownOffice(_)
            | CalendarError::UnknownClosure { .. } => ApiError::NotFound(message),
            CalendarError::HolidayNotInCalendar { .. }
            | CalendarError::InvalidClosureRange { .. } => ApiError::Invalid(message),
            CalendarError::NoOpenUpdate(_)
            | CalendarError::InvalidTransition { .. }
            | CalendarError::StaleCycle { .. } => ApiError::Conflict(message),
            CalendarError::Persistence(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    year: i32,
    city: Option<String>,
}

/// Body of `PUT /offices/:id`. Without `holidays` the calendar is resolved
/// from the catalog; with them a manual calendar is created.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyCalendarPayload {
    pub location: LocationKey,
    pub year: i32,
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holidays: Option<Vec<Holiday>>,
}

fn default_auto_update() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExceptionPayload {
    pub date: NaiveDate,
    pub action: ExceptionAction,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClosureQuery {
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonWorkingDayBody {
    pub date: NaiveDate,
    pub name: String,
    pub kind: HolidayKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOutcomeBody {
    pub office_id: OfficeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<AnnualUpdateRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<OfficeUpdateOutcome> for UpdateOutcomeBody {
    fn from(outcome: OfficeUpdateOutcome) -> Self {
        let (record, error) = match outcome.result {
            Ok(record) => (Some(record), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            office_id: outcome.office_id,
            record,
            error,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calendars/:country/:region", get(get_calendar))
        .route("/offices", get(list_offices))
        .route("/offices/:id", get(get_office).put(apply_calendar))
        .route("/offices/:id/exceptions", post(set_exception))
        .route(
            "/offices/:id/closures",
            post(add_closure).delete(remove_closure),
        )
        .route("/offices/:id/non-working-days", get(non_working_days))
        .route("/offices/:id/update/accept", post(accept_update))
        .route("/offices/:id/update/reject", post(reject_update))
        .route("/annual-updates", get(open_updates))
        .route("/annual-updates/:year", post(run_annual_update))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, engine: HolidayEngine) -> std::io::Result<()> {
    let state = AppState::new(engine);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_calendar(
    State(state): State<AppState>,
    Path((country, region)): Path<(String, String)>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<RegionalCalendar>, ApiError> {
    let mut location = LocationKey::new(country, region);
    if let Some(city) = query.city.filter(|c| !c.trim().is_empty()) {
        location = location.with_city(city);
    }
    let calendar = state.engine().resolve_calendar(&location, query.year)?;
    Ok(Json(calendar))
}

async fn list_offices(
    State(state): State<AppState>,
) -> Result<Json<Vec<OfficeCalendarConfig>>, ApiError> {
    Ok(Json(state.engine().offices()?))
}

async fn get_office(
    State(state): State<AppState>,
    Path(office_id): Path<String>,
) -> Result<Json<OfficeCalendarConfig>, ApiError> {
    let office = state.engine().office(&OfficeId::from(office_id))?;
    Ok(Json(office))
}

async fn apply_calendar(
    State(state): State<AppState>,
    Path(office_id): Path<String>,
    Json(payload): Json<ApplyCalendarPayload>,
) -> Result<Json<OfficeCalendarConfig>, ApiError> {
    let engine = state.engine();
    let calendar = match payload.holidays {
        Some(holidays) => {
            if holidays.iter().any(|h| h.kind == HolidayKind::Company) {
                return Err(ApiError::invalid(
                    "calendar holidays cannot use the company kind",
                ));
            }
            RegionalCalendar::manual(payload.location.clone(), payload.year, holidays)
        }
        None => engine.resolve_calendar(&payload.location, payload.year)?,
    };
    let office = engine.apply_calendar(
        &OfficeId::from(office_id),
        payload.location,
        calendar,
        payload.auto_update,
    )?;
    Ok(Json(office))
}

async fn set_exception(
    State(state): State<AppState>,
    Path(office_id): Path<String>,
    Json(payload): Json<ExceptionPayload>,
) -> Result<Json<Vec<HolidayException>>, ApiError> {
    let exceptions = state.engine().set_exception(
        &OfficeId::from(office_id),
        payload.date,
        payload.action,
        payload.reason,
    )?;
    Ok(Json(exceptions))
}

async fn add_closure(
    State(state): State<AppState>,
    Path(office_id): Path<String>,
    Json(closure): Json<CompanyClosure>,
) -> Result<(StatusCode, Json<Vec<CompanyClosure>>), ApiError> {
    if closure.name.trim().is_empty() {
        return Err(ApiError::invalid("closure name must not be empty"));
    }
    let closures = state
        .engine()
        .add_closure(&OfficeId::from(office_id), closure)?;
    Ok((StatusCode::CREATED, Json(closures)))
}

async fn remove_closure(
    State(state): State<AppState>,
    Path(office_id): Path<String>,
    Query(query): Query<ClosureQuery>,
) -> Result<Json<Vec<CompanyClosure>>, ApiError> {
    let closures = state
        .engine()
        .remove_closure(&OfficeId::from(office_id), &query.name)?;
    Ok(Json(closures))
}

async fn non_working_days(
    State(state): State<AppState>,
    Path(office_id): Path<String>,
) -> Result<Json<Vec<NonWorkingDayBody>>, ApiError> {
    let described = state
        .engine()
        .describe_non_working_days(&OfficeId::from(office_id))?;
    let days = described
        .into_iter()
        .map(|(date, reason)| NonWorkingDayBody {
            date,
            name: reason.name,
            kind: reason.kind,
        })
        .collect();
    Ok(Json(days))
}

async fn run_annual_update(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<Vec<UpdateOutcomeBody>>, ApiError> {
    let engine = state.engine();
    let outcomes = tokio::task::spawn_blocking(move || engine.run_annual_update(year))
        .await
        .map_err(|err| ApiError::internal(format!("annual update task failed: {err}")))?;
    Ok(Json(outcomes.into_iter().map(UpdateOutcomeBody::from).collect()))
}

async fn open_updates(
    State(state): State<AppState>,
) -> Result<Json<Vec<AnnualUpdateRecord>>, ApiError> {
    Ok(Json(state.engine().open_updates()?))
}

async fn accept_update(
    State(state): State<AppState>,
    Path(office_id): Path<String>,
) -> Result<Json<AnnualUpdateRecord>, ApiError> {
    let record = state.engine().accept_update(&OfficeId::from(office_id))?;
    Ok(Json(record))
}

async fn reject_update(
    State(state): State<AppState>,
    Path(office_id): Path<String>,
) -> Result<Json<AnnualUpdateRecord>, ApiError> {
    let record = state.engine().reject_update(&OfficeId::from(office_id))?;
    Ok(Json(record))
}
