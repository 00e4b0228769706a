use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use timetable_core::models::timetable::{
    CreateTimetableRequest, TimeWindow, Timetable, TimetableScope, UpdateTimetableRequest,
};
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{
        auth::{Authorized, CurrentCaller, RoomViewers, TimetableManagers},
        error_handling::AppError,
    },
};

#[axum::debug_handler]
pub async fn create_timetable(
    State(state): State<Arc<ApiState>>,
    manager: Authorized<TimetableManagers>,
    payload: Result<Json<CreateTimetableRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Timetable>), AppError> {
    let Json(payload) = payload?;

    let timetable = state
        .timetables
        .create_timetable(&payload, &manager.caller().credential)
        .await?;

    Ok((StatusCode::CREATED, Json(timetable)))
}

#[axum::debug_handler]
pub async fn update_timetable(
    State(state): State<Arc<ApiState>>,
    manager: Authorized<TimetableManagers>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTimetableRequest>, JsonRejection>,
) -> Result<Json<Timetable>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;

    let timetable = state
        .timetables
        .update_timetable(id, &payload, &manager.caller().credential)
        .await?;

    Ok(Json(timetable))
}

#[axum::debug_handler]
pub async fn delete_timetable(
    State(state): State<Arc<ApiState>>,
    _manager: Authorized<TimetableManagers>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    state.timetables.delete_timetable(id).await?;
    Ok(StatusCode::OK)
}

#[axum::debug_handler]
pub async fn delete_doctor_timetables(
    State(state): State<Arc<ApiState>>,
    _manager: Authorized<TimetableManagers>,
    doctor_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(doctor_id) = doctor_id?;
    state.timetables.delete_timetables_by_doctor(doctor_id).await?;
    Ok(StatusCode::OK)
}

#[axum::debug_handler]
pub async fn delete_hospital_timetables(
    State(state): State<Arc<ApiState>>,
    _manager: Authorized<TimetableManagers>,
    hospital_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(hospital_id) = hospital_id?;
    state
        .timetables
        .delete_timetables_by_hospital(hospital_id)
        .await?;
    Ok(StatusCode::OK)
}

#[axum::debug_handler]
pub async fn list_hospital_timetables(
    State(state): State<Arc<ApiState>>,
    _caller: CurrentCaller,
    hospital_id: Result<Path<i64>, PathRejection>,
    window: Result<Query<TimeWindow>, QueryRejection>,
) -> Result<Json<Vec<Timetable>>, AppError> {
    let Path(hospital_id) = hospital_id?;
    let Query(window) = window?;

    let timetables = state
        .timetables
        .list_timetables(&TimetableScope::Hospital(hospital_id), &window)
        .await?;

    Ok(Json(timetables))
}

#[axum::debug_handler]
pub async fn list_doctor_timetables(
    State(state): State<Arc<ApiState>>,
    _caller: CurrentCaller,
    doctor_id: Result<Path<i64>, PathRejection>,
    window: Result<Query<TimeWindow>, QueryRejection>,
) -> Result<Json<Vec<Timetable>>, AppError> {
    let Path(doctor_id) = doctor_id?;
    let Query(window) = window?;

    let timetables = state
        .timetables
        .list_timetables(&TimetableScope::Doctor(doctor_id), &window)
        .await?;

    Ok(Json(timetables))
}

#[axum::debug_handler]
pub async fn list_room_timetables(
    State(state): State<Arc<ApiState>>,
    _viewer: Authorized<RoomViewers>,
    path: Result<Path<(i64, String)>, PathRejection>,
    window: Result<Query<TimeWindow>, QueryRejection>,
) -> Result<Json<Vec<Timetable>>, AppError> {
    let Path((hospital_id, room)) = path?;
    let Query(window) = window?;

    let timetables = state
        .timetables
        .list_timetables(&TimetableScope::Room { hospital_id, room }, &window)
        .await?;

    Ok(Json(timetables))
}
