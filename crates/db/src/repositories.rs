pub mod appointment;
pub mod timetable;

use sqlx::{Executor, Postgres};

/// Serialises writers of one scope for the rest of the transaction.
///
/// Must run inside a transaction; the lock is released on commit or rollback.
pub async fn lock_scope<'e, E>(executor: E, key: &str) -> sqlx::Result<()>
where
    E: Executor<'e, Database = Postgres>,
{
    tracing::debug!("Taking scope lock {}", key);

    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(key)
        .execute(executor)
        .await?;

    Ok(())
}

pub fn room_scope_key(hospital_id: i64, room: &str) -> String {
    format!("room:{}:{}", hospital_id, room)
}

pub fn doctor_scope_key(doctor_id: i64) -> String {
    format!("doctor:{}", doctor_id)
}
