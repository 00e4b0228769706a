use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use timetable_core::models::{appointment::Appointment, timetable::Timetable};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTimetable {
    pub id: Uuid,
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub room: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbTimetable> for Timetable {
    fn from(row: DbTimetable) -> Self {
        Timetable {
            id: row.id,
            hospital_id: row.hospital_id,
            doctor_id: row.doctor_id,
            room: row.room,
            from: row.start_time,
            to: row.end_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAppointment {
    pub id: Uuid,
    pub timetable_id: Uuid,
    pub user_id: i64,
    pub slot_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<DbAppointment> for Appointment {
    fn from(row: DbAppointment) -> Self {
        Appointment {
            id: row.id,
            timetable_id: row.timetable_id,
            user_id: row.user_id,
            time: row.slot_time,
            created_at: row.created_at,
        }
    }
}
