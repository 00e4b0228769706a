use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use timetable_api::{ApiState, build_router};
use timetable_core::{
    errors::TimeError,
    memory::InMemoryStore,
    mock::{MockFacilityService, MockIdentityService},
    models::identity::{CallerIdentity, Role},
    ports::TimetableStore,
};
use tower::ServiceExt;

pub const ADMIN: &str = "admin-token";
pub const MANAGER: &str = "manager-token";
pub const DOCTOR: &str = "doctor-token";
pub const USER: &str = "user-token";
pub const OTHER_USER: &str = "other-user-token";

pub const USER_ID: i64 = 40;
pub const UNKNOWN_DOCTOR: i64 = 999;
pub const UNKNOWN_ROOM: &str = "404";

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 20, hour, minute, 0).unwrap()
}

/// Identity service that knows a fixed set of tokens.
pub fn identity() -> MockIdentityService {
    let mut identity = MockIdentityService::new();
    identity.expect_resolve_caller().returning(|credential| {
        let (user_id, roles) = match credential.as_str() {
            ADMIN => (1, vec![Role::Admin]),
            MANAGER => (2, vec![Role::Manager]),
            DOCTOR => (3, vec![Role::Doctor]),
            USER => (USER_ID, vec![Role::User]),
            OTHER_USER => (41, vec![Role::User]),
            _ => {
                return Err(TimeError::Authentication(
                    "Invalid or expired token".to_string(),
                ));
            }
        };
        Ok(CallerIdentity::new(user_id, roles))
    });
    identity
        .expect_validate_doctor()
        .returning(|doctor_id, _| Ok(doctor_id != UNKNOWN_DOCTOR));
    identity
}

pub fn facility() -> MockFacilityService {
    let mut facility = MockFacilityService::new();
    facility
        .expect_validate_hospital_room()
        .returning(|_, room, _| Ok(room != UNKNOWN_ROOM));
    facility
}

pub struct TestApp {
    pub store: InMemoryStore,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let router = Self::router_over(Arc::new(store.clone()));
        Self { store, router }
    }

    pub fn router_over(store: Arc<dyn TimetableStore>) -> Router {
        let state = ApiState::new(store, Arc::new(identity()), Arc::new(facility()));
        build_router(Arc::new(state))
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send(&self.router, method, uri, token.map(|t| format!("Bearer {}", t)), body).await
    }

    /// Creates a timetable through the API as a manager and returns its id.
    pub async fn create_timetable(
        &self,
        hospital_id: i64,
        doctor_id: i64,
        room: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/Timetable",
                Some(MANAGER),
                Some(timetable_body(hospital_id, doctor_id, room, from, to)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

pub fn timetable_body(
    hospital_id: i64,
    doctor_id: i64,
    room: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Value {
    serde_json::json!({
        "hospitalId": hospital_id,
        "doctorId": doctor_id,
        "room": room,
        "from": from,
        "to": to,
    })
}

/// Sends one request with a raw `Authorization` header value.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    authorization: Option<String>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, value)
}
