use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers, middleware::auth};

pub fn routes(state: Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/Timetable", post(handlers::timetable::create_timetable))
        .route(
            "/api/Timetable/:id",
            put(handlers::timetable::update_timetable).delete(handlers::timetable::delete_timetable),
        )
        .route(
            "/api/Timetable/Doctor/:id",
            get(handlers::timetable::list_doctor_timetables)
                .delete(handlers::timetable::delete_doctor_timetables),
        )
        .route(
            "/api/Timetable/Hospital/:id",
            get(handlers::timetable::list_hospital_timetables)
                .delete(handlers::timetable::delete_hospital_timetables),
        )
        .route(
            "/api/Timetable/Hospital/:id/Room/:room",
            get(handlers::timetable::list_room_timetables),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::authenticate))
}
