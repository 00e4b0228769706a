use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use timetable_core::models::appointment::{Appointment, CreateAppointmentRequest};
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::CurrentCaller, error_handling::AppError},
};

#[axum::debug_handler]
pub async fn list_available_slots(
    State(state): State<Arc<ApiState>>,
    _caller: CurrentCaller,
    timetable_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<DateTime<Utc>>>, AppError> {
    let Path(timetable_id) = timetable_id?;
    let slots = state.bookings.list_available_slots(timetable_id).await?;
    Ok(Json(slots))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    timetable_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let Path(timetable_id) = timetable_id?;
    let Json(payload) = payload?;

    let appointment = state
        .bookings
        .create_appointment(timetable_id, payload.time, &caller)
        .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentCaller(caller): CurrentCaller,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    state.bookings.delete_appointment(id, &caller.identity).await?;
    Ok(StatusCode::OK)
}
