#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    response::Response,
};
use office_holidays::http_api::{self, ApplyCalendarPayload, NonWorkingDayBody, UpdateOutcomeBody};
use office_holidays::{
    AnnualUpdateRecord, HolidayEngine, HolidayException, InMemoryOfficeDirectory, LocationKey,
    OfficeCalendarConfig, RegionalCalendar, UpdateStatus, builtin_catalog,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let engine = HolidayEngine::new(
        Arc::new(builtin_catalog(2025..=2026)),
        Arc::new(InMemoryOfficeDirectory::new()),
    );
    http_api::router(http_api::AppState::new(engine))
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body<T: DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn barcelona_payload(auto_update: bool) -> Value {
    serde_json::to_value(ApplyCalendarPayload {
        location: LocationKey::new("ES", "Catalonia").with_city("Barcelona"),
        year: 2025,
        auto_update,
        holidays: None,
    })
    .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = new_router();
    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn calendar_resolution_via_http_api() {
    let app = new_router();
    let response = send(
        &app,
        "GET",
        "/calendars/ES/Catalonia?year=2025&city=Barcelona",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let calendar: RegionalCalendar = json_body(response).await;
    assert_eq!(calendar.len(), 14);

    let response = send(&app, "GET", "/calendars/JP/Tokyo?year=2025", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("manually"));
}

#[tokio::test]
async fn office_lifecycle_via_http_api() {
    let app = new_router();

    let response = send(&app, "PUT", "/offices/bcn", Some(barcelona_payload(false))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let office: OfficeCalendarConfig = json_body(response).await;
    assert_eq!(office.calendar.len(), 14);
    assert!(!office.auto_update);

    // Work through Immaculate Conception
    let response = send(
        &app,
        "POST",
        "/offices/bcn/exceptions",
        Some(json!({ "date": "2025-12-08", "action": "work" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let exceptions: Vec<HolidayException> = json_body(response).await;
    assert_eq!(exceptions.len(), 1);

    let response = send(
        &app,
        "POST",
        "/offices/bcn/exceptions",
        Some(json!({ "date": "2025-12-09", "action": "work" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        "/offices/bcn/closures",
        Some(json!({ "name": "Shutdown", "start_date": "2025-12-24", "end_date": "2025-12-31" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, "GET", "/offices/bcn/non-working-days", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let days: Vec<NonWorkingDayBody> = json_body(response).await;
    assert!(!days.iter().any(|day| day.date.to_string() == "2025-12-08"));
    let year_end: Vec<&NonWorkingDayBody> = days
        .iter()
        .filter(|day| day.date.to_string().as_str() >= "2025-12-24")
        .collect();
    assert_eq!(year_end.len(), 8);

    let response = send(&app, "DELETE", "/offices/bcn/closures?name=Shutdown", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, "DELETE", "/offices/bcn/closures?name=Shutdown", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", "/offices/nowhere", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn annual_update_review_via_http_api() {
    let app = new_router();
    send(&app, "PUT", "/offices/bcn", Some(barcelona_payload(false))).await;

    let manual = json!({
        "location": { "country": "JP", "region": "Tokyo" },
        "year": 2025,
        "holidays": [{ "date": "2025-01-01", "name": "Ganjitsu", "kind": "national" }]
    });
    let response = send(&app, "PUT", "/offices/tyo", Some(manual)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "POST", "/annual-updates/2026", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcomes: Vec<UpdateOutcomeBody> = json_body(response).await;
    assert_eq!(outcomes.len(), 2);
    let bcn = outcomes.iter().find(|o| o.office_id.as_str() == "bcn").unwrap();
    assert_eq!(bcn.record.as_ref().unwrap().status, UpdateStatus::Pending);
    let tyo = outcomes.iter().find(|o| o.office_id.as_str() == "tyo").unwrap();
    assert!(tyo.error.is_some());

    let response = send(&app, "GET", "/annual-updates", None).await;
    let open: Vec<AnnualUpdateRecord> = json_body(response).await;
    assert_eq!(open.len(), 1);

    let response = send(&app, "POST", "/offices/bcn/update/accept", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let record: AnnualUpdateRecord = json_body(response).await;
    assert_eq!(record.status, UpdateStatus::Applied);

    let response = send(&app, "POST", "/offices/bcn/update/reject", None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = json_body(response).await;
    assert_eq!(body["error"], "conflict");

    let response = send(&app, "GET", "/offices/bcn", None).await;
    let office: OfficeCalendarConfig = json_body(response).await;
    assert_eq!(office.calendar.year, 2026);
}

#[tokio::test]
async fn stale_cycle_and_long_closure_via_http_api() {
    let app = new_router();
    send(&app, "PUT", "/offices/bcn", Some(barcelona_payload(true))).await;

    let response = send(&app, "POST", "/annual-updates/2025", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcomes: Vec<UpdateOutcomeBody> = json_body(response).await;
    assert!(outcomes[0].record.is_none());
    assert!(
        outcomes[0]
            .error
            .as_deref()
            .unwrap()
            .contains("cannot run the 2025 cycle")
    );

    let closure = json!({
        "name": "Sabbatical",
        "start_date": "2025-12-31",
        "end_date": "9999-12-31",
        "recurring": true
    });
    let response = send(&app, "POST", "/offices/bcn/closures", Some(closure)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, "GET", "/offices/bcn/non-working-days", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let days: Vec<NonWorkingDayBody> = json_body(response).await;
    assert_eq!(days.len(), 365);
}
