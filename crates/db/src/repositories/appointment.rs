use crate::models::DbAppointment;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

pub async fn create_appointment<'e, E>(
    executor: E,
    timetable_id: Uuid,
    user_id: i64,
    slot_time: DateTime<Utc>,
) -> sqlx::Result<DbAppointment>
where
    E: Executor<'e, Database = Postgres>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, DbAppointment>(
        r#"
        INSERT INTO appointments (id, timetable_id, user_id, slot_time, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, timetable_id, user_id, slot_time, created_at
        "#,
    )
    .bind(id)
    .bind(timetable_id)
    .bind(user_id)
    .bind(slot_time)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn get_appointment_by_id<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Option<DbAppointment>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DbAppointment>(
        r#"
        SELECT id, timetable_id, user_id, slot_time, created_at
        FROM appointments
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn get_appointment_at<'e, E>(
    executor: E,
    timetable_id: Uuid,
    slot_time: DateTime<Utc>,
) -> sqlx::Result<Option<DbAppointment>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DbAppointment>(
        r#"
        SELECT id, timetable_id, user_id, slot_time, created_at
        FROM appointments
        WHERE timetable_id = $1 AND slot_time = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(timetable_id)
    .bind(slot_time)
    .fetch_optional(executor)
    .await
}

pub async fn get_appointments_by_timetable_id<'e, E>(
    executor: E,
    timetable_id: Uuid,
) -> sqlx::Result<Vec<DbAppointment>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DbAppointment>(
        r#"
        SELECT id, timetable_id, user_id, slot_time, created_at
        FROM appointments
        WHERE timetable_id = $1 AND deleted_at IS NULL
        ORDER BY slot_time ASC
        "#,
    )
    .bind(timetable_id)
    .fetch_all(executor)
    .await
}

pub async fn count_appointments<'e, E>(executor: E, timetable_id: Uuid) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM appointments
        WHERE timetable_id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(timetable_id)
    .fetch_one(executor)
    .await
}

pub async fn soft_delete_appointment<'e, E>(executor: E, id: Uuid) -> sqlx::Result<bool>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET deleted_at = $2
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Cascades a timetable deletion to its active appointments.
pub async fn soft_delete_appointments_by_timetable_ids<'e, E>(
    executor: E,
    timetable_ids: &[Uuid],
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET deleted_at = $2
        WHERE timetable_id = ANY($1) AND deleted_at IS NULL
        "#,
    )
    .bind(timetable_ids)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
