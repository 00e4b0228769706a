//! # Timetable API
//!
//! The HTTP surface of the timetable service: doctors' availability windows
//! in hospital rooms, and the 30-minute appointments booked inside them.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate HTTP requests into service calls
//! - **Middleware**: Authentication, role gates and error mapping
//! - **Config**: Handle environment and application configuration
//!
//! All scheduling rules live in `timetable-core`; this crate only wires them
//! to axum.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Middleware for authentication and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use eyre::{Result, WrapErr};
use timetable_core::{
    ports::{FacilityService, IdentityService, TimetableStore},
    services::{BookingService, TimetableService},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
#[derive(Clone)]
pub struct ApiState {
    pub timetables: TimetableService,
    pub bookings: BookingService,
    /// Resolves bearer credentials into callers
    pub identity: Arc<dyn IdentityService>,
}

impl ApiState {
    pub fn new(
        store: Arc<dyn TimetableStore>,
        identity: Arc<dyn IdentityService>,
        facility: Arc<dyn FacilityService>,
    ) -> Self {
        Self {
            timetables: TimetableService::new(store.clone(), identity.clone(), facility),
            bookings: BookingService::new(store),
            identity,
        }
    }
}

/// Installs the global tracing subscriber.
pub fn init_tracing(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Builds the application router with all routes and the tracing layer.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Timetable management endpoints
        .merge(routes::timetable::routes(state.clone()))
        // Slot and appointment endpoints
        .merge(routes::appointment::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        // Attach shared state to all routes
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .wrap_err_with(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_origin(origins)
        .allow_credentials(true))
}

/// Serves the API until the listener fails.
pub async fn start_server(config: config::ApiConfig, state: ApiState) -> Result<()> {
    let app = build_router(Arc::new(state));

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)?),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(TimeoutLayer::new(config.request_timeout()));

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
