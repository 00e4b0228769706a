use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::test_utils::{
    ADMIN, DOCTOR, MANAGER, TestApp, UNKNOWN_DOCTOR, UNKNOWN_ROOM, USER, at, timetable_body,
};

#[tokio::test]
async fn test_create_timetable_as_manager() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/Timetable",
            Some(MANAGER),
            Some(timetable_body(1, 7, "101", at(9, 0), at(12, 0))),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["hospitalId"], json!(1));
    assert_eq!(body["doctorId"], json!(7));
    assert_eq!(body["room"], json!("101"));
    assert_eq!(body["from"], json!("2024-04-20T09:00:00Z"));
    assert_eq!(body["to"], json!("2024-04-20T12:00:00Z"));
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn test_create_timetable_requires_manager_role() {
    let app = TestApp::new();

    for token in [USER, DOCTOR] {
        let (status, body) = app
            .request(
                Method::POST,
                "/api/Timetable",
                Some(token),
                Some(timetable_body(1, 7, "101", at(9, 0), at(12, 0))),
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], json!("FORBIDDEN"));
    }

    let (status, _) = app
        .request(
            Method::POST,
            "/api/Timetable",
            Some(ADMIN),
            Some(timetable_body(1, 7, "101", at(9, 0), at(12, 0))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_overlapping_room_is_conflict() {
    let app = TestApp::new();
    app.create_timetable(1, 7, "101", at(9, 0), at(12, 0)).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/Timetable",
            Some(MANAGER),
            Some(timetable_body(1, 8, "101", at(11, 0), at(14, 0))),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("ROOM_CONFLICT"));
    assert_eq!(
        body["error"],
        json!("Room is already booked for this time period")
    );
}

#[tokio::test]
async fn test_overlapping_doctor_is_conflict() {
    let app = TestApp::new();
    app.create_timetable(1, 7, "101", at(9, 0), at(12, 0)).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/Timetable",
            Some(MANAGER),
            Some(timetable_body(2, 7, "301", at(10, 0), at(11, 0))),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("DOCTOR_CONFLICT"));
}

#[tokio::test]
async fn test_touching_timetables_are_accepted() {
    let app = TestApp::new();
    app.create_timetable(1, 7, "101", at(9, 0), at(12, 0)).await;
    app.create_timetable(1, 7, "101", at(12, 0), at(15, 0)).await;
}

#[tokio::test]
async fn test_grid_violations_are_bad_requests() {
    let app = TestApp::new();
    let cases = [
        (at(9, 15), at(12, 0), "MISALIGNED_TIME"),
        (at(12, 0), at(9, 0), "INVALID_SPAN"),
        (at(6, 0), at(18, 30), "SPAN_TOO_LONG"),
    ];

    for (from, to, code) in cases {
        let (status, body) = app
            .request(
                Method::POST,
                "/api/Timetable",
                Some(MANAGER),
                Some(timetable_body(1, 7, "101", from, to)),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!(code));
    }
}

#[tokio::test]
async fn test_referential_failures_are_bad_requests() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/Timetable",
            Some(MANAGER),
            Some(timetable_body(1, 7, UNKNOWN_ROOM, at(9, 0), at(12, 0))),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ROOM"));

    let (status, body) = app
        .request(
            Method::POST,
            "/api/Timetable",
            Some(MANAGER),
            Some(timetable_body(1, UNKNOWN_DOCTOR, "101", at(9, 0), at(12, 0))),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("NOT_A_DOCTOR"));
}

#[tokio::test]
async fn test_malformed_payload_is_bad_request() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/Timetable",
            Some(MANAGER),
            Some(json!({ "hospitalId": "one", "room": 5 })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_update_timetable() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(12, 0)).await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/Timetable/{}", id),
            Some(MANAGER),
            Some(json!({ "room": "102", "to": "2024-04-20T13:00:00Z" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(id));
    assert_eq!(body["room"], json!("102"));
    assert_eq!(body["to"], json!("2024-04-20T13:00:00Z"));
}

#[tokio::test]
async fn test_update_with_appointments_is_locked() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(12, 0)).await;
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/Timetable/{}/Appointments", id),
            Some(USER),
            Some(json!({ "time": "2024-04-20T09:30:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/Timetable/{}", id),
            Some(MANAGER),
            Some(json!({ "from": "2024-04-20T08:00:00Z" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("TIMETABLE_LOCKED"));
}

#[tokio::test]
async fn test_update_unknown_timetable_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/Timetable/7c9e6679-7425-40de-944b-e07fc1f90ae7",
            Some(MANAGER),
            Some(json!({ "room": "102" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn test_invalid_path_id_is_bad_request() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::DELETE,
            "/api/Timetable/not-a-uuid",
            Some(MANAGER),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_delete_timetable_is_idempotent() {
    let app = TestApp::new();
    let id = app.create_timetable(1, 7, "101", at(9, 0), at(12, 0)).await;
    let uri = format!("/api/Timetable/{}", id);

    let (first, _) = app.request(Method::DELETE, &uri, Some(MANAGER), None).await;
    let (second, _) = app.request(Method::DELETE, &uri, Some(MANAGER), None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);

    let (status, _) = app
        .request(
            Method::GET,
            &format!("/api/Timetable/{}/Appointments", id),
            Some(USER),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_deletes() {
    let app = TestApp::new();
    app.create_timetable(1, 7, "101", at(8, 0), at(9, 0)).await;
    app.create_timetable(2, 7, "201", at(10, 0), at(11, 0)).await;
    app.create_timetable(1, 8, "102", at(8, 0), at(9, 0)).await;

    let (status, _) = app
        .request(Method::DELETE, "/api/Timetable/Doctor/7", Some(ADMIN), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = app
        .request(Method::GET, "/api/Timetable/Doctor/7", Some(USER), None)
        .await;
    assert_eq!(listed, json!([]));

    let (status, _) = app
        .request(Method::DELETE, "/api/Timetable/Hospital/1", Some(MANAGER), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = app
        .request(Method::GET, "/api/Timetable/Hospital/1", Some(USER), None)
        .await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_list_hospital_timetables_with_window() {
    let app = TestApp::new();
    app.create_timetable(1, 7, "101", at(8, 0), at(10, 0)).await;
    let noon = app.create_timetable(1, 8, "102", at(11, 0), at(13, 0)).await;

    let (status, listed) = app
        .request(Method::GET, "/api/Timetable/Hospital/1", Some(USER), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let (status, listed) = app
        .request(
            Method::GET,
            "/api/Timetable/Hospital/1?from=2024-04-20T10:30:00Z&to=2024-04-20T13:00:00Z",
            Some(USER),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], json!(noon));
}

#[tokio::test]
async fn test_window_accepts_numeric_offsets() {
    let app = TestApp::new();
    app.create_timetable(1, 7, "101", at(8, 0), at(10, 0)).await;
    let noon = app.create_timetable(1, 8, "102", at(11, 0), at(13, 0)).await;

    for uri in [
        "/api/Timetable/Hospital/1?from=2024-04-20T10:30:00+00:00",
        "/api/Timetable/Hospital/1?from=2024-04-20T10:30:00%2B00:00",
        "/api/Timetable/Hospital/1?from=2024-04-20T12:30:00%2B02:00",
    ] {
        let (status, listed) = app.request(Method::GET, uri, Some(USER), None).await;

        assert_eq!(status, StatusCode::OK, "unexpected body for {}: {}", uri, listed);
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], json!(noon));
    }
}

#[tokio::test]
async fn test_invalid_window_parameter_is_bad_request() {
    let app = TestApp::new();

    let (status, body) = app
        .request(
            Method::GET,
            "/api/Timetable/Doctor/7?from=yesterday",
            Some(USER),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
}

#[tokio::test]
async fn test_room_listing_requires_staff_role() {
    let app = TestApp::new();
    app.create_timetable(1, 7, "101", at(8, 0), at(10, 0)).await;
    app.create_timetable(1, 8, "102", at(8, 0), at(10, 0)).await;

    let (status, _) = app
        .request(Method::GET, "/api/Timetable/Hospital/1/Room/101", Some(USER), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listed) = app
        .request(Method::GET, "/api/Timetable/Hospital/1/Room/101", Some(DOCTOR), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["room"], json!("101"));
}
