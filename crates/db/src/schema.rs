use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Constraint names the store translates back into domain errors.
pub const ROOM_NO_OVERLAP: &str = "timetables_room_no_overlap";
pub const DOCTOR_NO_OVERLAP: &str = "timetables_doctor_no_overlap";
pub const APPOINTMENT_SLOT_UNIQUE: &str = "appointments_slot_unique";

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Needed for `=` on scalar columns inside a GiST exclusion constraint
    sqlx::query("CREATE EXTENSION IF NOT EXISTS btree_gist")
        .execute(pool)
        .await?;

    // Create timetables table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS timetables (
            id UUID PRIMARY KEY,
            hospital_id BIGINT NOT NULL,
            doctor_id BIGINT NOT NULL,
            room TEXT NOT NULL,
            start_time TIMESTAMP WITH TIME ZONE NOT NULL,
            end_time TIMESTAMP WITH TIME ZONE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            deleted_at TIMESTAMP WITH TIME ZONE NULL,
            CONSTRAINT valid_time_range CHECK (end_time > start_time),
            CONSTRAINT max_time_range CHECK (end_time - start_time <= INTERVAL '12 hours'),
            CONSTRAINT timetables_room_no_overlap EXCLUDE USING gist (
                hospital_id WITH =,
                room WITH =,
                tstzrange(start_time, end_time, '[)') WITH &&
            ) WHERE (deleted_at IS NULL),
            CONSTRAINT timetables_doctor_no_overlap EXCLUDE USING gist (
                doctor_id WITH =,
                tstzrange(start_time, end_time, '[)') WITH &&
            ) WHERE (deleted_at IS NULL)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create appointments table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id UUID PRIMARY KEY,
            timetable_id UUID NOT NULL REFERENCES timetables(id) ON DELETE CASCADE,
            user_id BIGINT NOT NULL,
            slot_time TIMESTAMP WITH TIME ZONE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            deleted_at TIMESTAMP WITH TIME ZONE NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    for statement in [
        "CREATE UNIQUE INDEX IF NOT EXISTS appointments_slot_unique ON appointments(timetable_id, slot_time) WHERE deleted_at IS NULL",
        "CREATE INDEX IF NOT EXISTS idx_timetables_hospital_room ON timetables(hospital_id, room) WHERE deleted_at IS NULL",
        "CREATE INDEX IF NOT EXISTS idx_timetables_doctor_id ON timetables(doctor_id) WHERE deleted_at IS NULL",
        "CREATE INDEX IF NOT EXISTS idx_timetables_start_time ON timetables(start_time)",
        "CREATE INDEX IF NOT EXISTS idx_appointments_timetable_id ON appointments(timetable_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
