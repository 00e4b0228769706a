use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header::AUTHORIZATION};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use timetable_api::middleware::{auth::bearer_credential, error_handling::{map_error, status_for}};
use timetable_core::{
    errors::{TimeError, ValidationError},
    mock::MockTimetableStore,
};

use crate::test_utils::{MANAGER, TestApp, send};

#[rstest]
#[case(TimeError::NotFound("Timetable".to_string()), StatusCode::NOT_FOUND)]
#[case(TimeError::Validation(ValidationError::MisalignedTime), StatusCode::BAD_REQUEST)]
#[case(TimeError::Validation(ValidationError::OutOfRange), StatusCode::BAD_REQUEST)]
#[case(TimeError::NotADoctor, StatusCode::BAD_REQUEST)]
#[case(TimeError::InvalidRoom("101".to_string()), StatusCode::BAD_REQUEST)]
#[case(TimeError::RoomConflict, StatusCode::CONFLICT)]
#[case(TimeError::DoctorConflict, StatusCode::CONFLICT)]
#[case(TimeError::SlotTaken, StatusCode::CONFLICT)]
#[case(TimeError::TimetableLocked, StatusCode::CONFLICT)]
#[case(TimeError::UpstreamUnavailable("timeout".to_string()), StatusCode::SERVICE_UNAVAILABLE)]
#[case(TimeError::Authentication("no token".to_string()), StatusCode::UNAUTHORIZED)]
#[case(TimeError::Authorization("no role".to_string()), StatusCode::FORBIDDEN)]
#[case(TimeError::Database(eyre::eyre!("boom")), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_status_for(#[case] err: TimeError, #[case] expected: StatusCode) {
    assert_eq!(status_for(&err), expected);
    assert_eq!(map_error(err).status(), expected);
}

fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

#[rstest]
#[case("Bearer abc", "abc")]
#[case("bearer abc", "abc")]
#[case("BEARER   abc", "abc")]
fn test_bearer_credential_accepts(#[case] header: &str, #[case] token: &str) {
    let credential = bearer_credential(&headers(header)).unwrap();
    assert_eq!(credential.as_str(), token);
}

#[rstest]
#[case("Token abc")]
#[case("Bearer")]
#[case("Bearer a b")]
#[case("abc")]
fn test_bearer_credential_rejects(#[case] header: &str) {
    let err = bearer_credential(&headers(header)).unwrap_err();
    assert!(matches!(err, TimeError::Authentication(_)));
}

#[test]
fn test_missing_header_is_authentication_error() {
    let err = bearer_credential(&HeaderMap::new()).unwrap_err();
    assert!(matches!(err, TimeError::Authentication(_)));
}

#[tokio::test]
async fn test_invalid_authorization_headers_are_unauthorized() {
    let app = TestApp::new();
    let router = TestApp::router_over(Arc::new(app.store.clone()));

    for authorization in [None, Some("Token manager-token"), Some("Bearer unknown")] {
        let (status, body) = send(
            &router,
            Method::GET,
            "/api/Timetable/Doctor/7",
            authorization.map(str::to_string),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], json!("UNAUTHORIZED"));
    }

    let (status, _) = send(
        &router,
        Method::GET,
        "/api/Timetable/Doctor/7",
        Some(format!("bearer {}", MANAGER)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_storage_failure_hides_detail() {
    let mut store = MockTimetableStore::new();
    store
        .expect_list_timetables()
        .returning(|_, _| Err(TimeError::Database(eyre::eyre!("connection reset by peer"))));
    let router = TestApp::router_over(Arc::new(store));

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/Timetable/Hospital/1",
        Some(format!("Bearer {}", MANAGER)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "Internal server error", "code": "INTERNAL" })
    );
}

#[tokio::test]
async fn test_health_and_version_need_no_credential() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "service": "timetable" }));

    let (status, body) = app.request(Method::GET, "/version", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], json!("timetable"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}
