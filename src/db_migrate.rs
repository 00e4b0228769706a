use color_eyre::eyre::{Result, eyre};
use dotenv::dotenv;
use timetable_api::init_tracing;
use timetable_db::{create_pool, schema::initialize_database};
use tracing::{Level, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;
    init_tracing(Level::INFO)?;

    // Load environment variables
    dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| eyre!("DATABASE_URL environment variable must be set"))?;

    info!("Connecting to database...");
    let db_pool = create_pool(&database_url, 1).await?;

    info!("Initializing database schema...");
    initialize_database(&db_pool).await?;
    info!("Database schema initialized successfully.");

    Ok(())
}
