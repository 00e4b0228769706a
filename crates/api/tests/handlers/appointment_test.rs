use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::test_utils::{MANAGER, OTHER_USER, TestApp, USER, USER_ID, at};

async fn book(app: &TestApp, timetable_id: &str, token: &str, time: &str) -> (StatusCode, serde_json::Value) {
    app.request(
        Method::POST,
        &format!("/api/Timetable/{}/Appointments", timetable_id),
        Some(token),
        Some(json!({ "time": time })),
    )
    .await
}

#[tokio::test]
async fn test_list_available_slots() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(10, 30)).await;

    let (status, slots) = app
        .request(
            Method::GET,
            &format!("/api/Timetable/{}/Appointments", id),
            Some(USER),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        slots,
        json!([
            "2024-04-20T09:00:00Z",
            "2024-04-20T09:30:00Z",
            "2024-04-20T10:00:00Z"
        ])
    );
}

#[tokio::test]
async fn test_book_appointment() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(10, 0)).await;

    let (status, body) = book(&app, &id, USER, "2024-04-20T09:30:00Z").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["timetableId"], json!(id));
    assert_eq!(body["userId"], json!(USER_ID));
    assert_eq!(body["time"], json!("2024-04-20T09:30:00Z"));

    let (_, slots) = app
        .request(
            Method::GET,
            &format!("/api/Timetable/{}/Appointments", id),
            Some(USER),
            None,
        )
        .await;
    assert_eq!(slots, json!(["2024-04-20T09:00:00Z"]));
}

#[tokio::test]
async fn test_double_booking_is_conflict() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(10, 0)).await;

    let (first, _) = book(&app, &id, USER, "2024-04-20T09:00:00Z").await;
    let (second, body) = book(&app, &id, OTHER_USER, "2024-04-20T09:00:00Z").await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("SLOT_TAKEN"));
}

#[tokio::test]
async fn test_booking_rejections() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(10, 0)).await;

    let (status, body) = book(&app, &id, USER, "2024-04-20T11:00:00Z").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("OUT_OF_RANGE"));

    let (status, body) = book(&app, &id, USER, "2024-04-20T09:10:00Z").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("MISALIGNED_TIME"));

    let (status, body) = book(
        &app,
        "7c9e6679-7425-40de-944b-e07fc1f90ae7",
        USER,
        "2024-04-20T09:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_booking_requires_authentication() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(10, 0)).await;

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/Timetable/{}/Appointments", id),
            None,
            Some(json!({ "time": "2024-04-20T09:00:00Z" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("UNAUTHORIZED"));
}

#[tokio::test]
async fn test_cancel_appointment_permissions() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(10, 0)).await;
    let (_, first) = book(&app, &id, USER, "2024-04-20T09:00:00Z").await;
    let (_, second) = book(&app, &id, USER, "2024-04-20T09:30:00Z").await;
    let first = format!("/api/Appointment/{}", first["id"].as_str().unwrap());
    let second = format!("/api/Appointment/{}", second["id"].as_str().unwrap());

    let (status, body) = app.request(Method::DELETE, &first, Some(OTHER_USER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("FORBIDDEN"));

    let (status, _) = app.request(Method::DELETE, &first, Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::DELETE, &second, Some(MANAGER), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request(Method::DELETE, &first, Some(USER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_cancelled_slot_can_be_rebooked() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(10, 0)).await;
    let (_, booked) = book(&app, &id, USER, "2024-04-20T09:00:00Z").await;

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/Appointment/{}", booked["id"].as_str().unwrap()),
            Some(USER),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = book(&app, &id, OTHER_USER, "2024-04-20T09:00:00Z").await;
    assert_eq!(status, StatusCode::CREATED);
}
