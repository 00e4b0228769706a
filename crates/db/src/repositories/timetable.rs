use crate::models::DbTimetable;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres, QueryBuilder};
use timetable_core::models::timetable::{TimeWindow, TimetableFields, TimetableScope};
use timetable_core::ports::LockMode;
use uuid::Uuid;

const COLUMNS: &str =
    "id, hospital_id, doctor_id, room, start_time, end_time, created_at, updated_at";

pub async fn create_timetable<'e, E>(executor: E, fields: &TimetableFields) -> sqlx::Result<DbTimetable>
where
    E: Executor<'e, Database = Postgres>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Creating timetable: id={}, hospital={}, doctor={}, room={}",
        id, fields.hospital_id, fields.doctor_id, fields.room
    );

    sqlx::query_as::<_, DbTimetable>(&format!(
        r#"
        INSERT INTO timetables (id, hospital_id, doctor_id, room, start_time, end_time, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(fields.hospital_id)
    .bind(fields.doctor_id)
    .bind(&fields.room)
    .bind(fields.from)
    .bind(fields.to)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn get_timetable_by_id<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Option<DbTimetable>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DbTimetable>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM timetables
        WHERE id = $1 AND deleted_at IS NULL
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Loads an active timetable and row-locks it for the rest of the
/// transaction.
pub async fn lock_timetable_by_id<'e, E>(
    executor: E,
    id: Uuid,
    mode: LockMode,
) -> sqlx::Result<Option<DbTimetable>>
where
    E: Executor<'e, Database = Postgres>,
{
    let clause = match mode {
        LockMode::Update => "FOR UPDATE",
        LockMode::Share => "FOR SHARE",
    };

    sqlx::query_as::<_, DbTimetable>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM timetables
        WHERE id = $1 AND deleted_at IS NULL
        {clause}
        "#
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_timetables<'e, E>(
    executor: E,
    scope: &TimetableScope,
    window: &TimeWindow,
) -> sqlx::Result<Vec<DbTimetable>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut query = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM timetables WHERE deleted_at IS NULL"
    ));
    push_scope(&mut query, scope);

    if let Some(from) = window.from {
        query.push(" AND start_time >= ").push_bind(from);
    }
    if let Some(to) = window.to {
        query.push(" AND end_time <= ").push_bind(to);
    }
    query.push(" ORDER BY start_time ASC");

    query.build_query_as::<DbTimetable>().fetch_all(executor).await
}

/// First active timetable in the room whose `[start, end)` intersects
/// `[from, to)`.
pub async fn find_room_overlap<'e, E>(
    executor: E,
    hospital_id: i64,
    room: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> sqlx::Result<Option<DbTimetable>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DbTimetable>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM timetables
        WHERE deleted_at IS NULL
          AND hospital_id = $1
          AND room = $2
          AND start_time < $4
          AND end_time > $3
          AND ($5::uuid IS NULL OR id <> $5)
        LIMIT 1
        "#
    ))
    .bind(hospital_id)
    .bind(room)
    .bind(from)
    .bind(to)
    .bind(exclude)
    .fetch_optional(executor)
    .await
}

pub async fn find_doctor_overlap<'e, E>(
    executor: E,
    doctor_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> sqlx::Result<Option<DbTimetable>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DbTimetable>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM timetables
        WHERE deleted_at IS NULL
          AND doctor_id = $1
          AND start_time < $3
          AND end_time > $2
          AND ($4::uuid IS NULL OR id <> $4)
        LIMIT 1
        "#
    ))
    .bind(doctor_id)
    .bind(from)
    .bind(to)
    .bind(exclude)
    .fetch_optional(executor)
    .await
}

pub async fn update_timetable<'e, E>(
    executor: E,
    id: Uuid,
    fields: &TimetableFields,
) -> sqlx::Result<Option<DbTimetable>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DbTimetable>(&format!(
        r#"
        UPDATE timetables
        SET hospital_id = $2, doctor_id = $3, room = $4, start_time = $5, end_time = $6, updated_at = $7
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(fields.hospital_id)
    .bind(fields.doctor_id)
    .bind(&fields.room)
    .bind(fields.from)
    .bind(fields.to)
    .bind(Utc::now())
    .fetch_optional(executor)
    .await
}

/// Marks every active timetable in `scope` deleted and returns their ids.
pub async fn soft_delete_timetables<'e, E>(
    executor: E,
    scope: &TimetableScope,
) -> sqlx::Result<Vec<Uuid>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut query = QueryBuilder::<Postgres>::new("UPDATE timetables SET deleted_at = ");
    query.push_bind(Utc::now());
    query.push(" WHERE deleted_at IS NULL");
    push_scope(&mut query, scope);
    query.push(" RETURNING id");

    query
        .build_query_scalar::<Uuid>()
        .fetch_all(executor)
        .await
}

pub async fn soft_delete_timetable<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Vec<Uuid>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE timetables
        SET deleted_at = $2
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_all(executor)
    .await
}

fn push_scope(query: &mut QueryBuilder<'_, Postgres>, scope: &TimetableScope) {
    match scope {
        TimetableScope::Hospital(hospital_id) => {
            query.push(" AND hospital_id = ").push_bind(*hospital_id);
        }
        TimetableScope::Doctor(doctor_id) => {
            query.push(" AND doctor_id = ").push_bind(*doctor_id);
        }
        TimetableScope::Room { hospital_id, room } => {
            query.push(" AND hospital_id = ").push_bind(*hospital_id);
            query.push(" AND room = ").push_bind(room.clone());
        }
    }
}
