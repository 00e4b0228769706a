use axum::{
    Router, middleware,
    routing::{delete, get},
};
use std::sync::Arc;

use crate::{ApiState, handlers, middleware::auth};

pub fn routes(state: Arc<ApiState>) -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/Timetable/:id/Appointments",
            get(handlers::appointment::list_available_slots)
                .post(handlers::appointment::create_appointment),
        )
        .route(
            "/api/Appointment/:id",
            delete(handlers::appointment::delete_appointment),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::authenticate))
}
