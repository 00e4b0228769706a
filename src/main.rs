use std::sync::Arc;

use color_eyre::eyre::Result;
use dotenv::dotenv;
use timetable_api::{ApiState, config::ApiConfig, init_tracing};
use timetable_clients::{AccountServiceClient, HospitalServiceClient};
use timetable_db::{PgTimetableStore, create_pool, schema::initialize_database};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;
    init_tracing(config.log_level)?;
    info!("Starting timetable service");

    // Create database connection pool
    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    // Remote account and hospital services
    let identity = AccountServiceClient::from_config(&config.clients)?;
    let facility = HospitalServiceClient::from_config(&config.clients)?;

    let state = ApiState::new(
        Arc::new(PgTimetableStore::new(db_pool)),
        Arc::new(identity),
        Arc::new(facility),
    );

    // Start API server
    timetable_api::start_server(config, state).await?;

    Ok(())
}
