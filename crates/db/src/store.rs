//! PostgreSQL implementation of the storage ports.
//!
//! Conflict queries take a transaction-scoped advisory lock on the scope they
//! inspect (`room:{hospital}:{room}` or `doctor:{id}`) before reading, so two
//! writers of the same scope queue behind each other. Room locks are always
//! taken before doctor locks. The exclusion constraints and the partial
//! unique index in [`crate::schema`] catch anything that slips past.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use timetable_core::{
    errors::{TimeError, TimeResult},
    grid::Span,
    models::{
        appointment::Appointment,
        timetable::{TimeWindow, Timetable, TimetableFields, TimetableScope},
    },
    ports::{LockMode, StoreTransaction, TimetableStore},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::DbPool;
use crate::repositories::{self, appointment, timetable};
use crate::schema::{APPOINTMENT_SLOT_UNIQUE, DOCTOR_NO_OVERLAP, ROOM_NO_OVERLAP};

/// Translates constraint violations into their domain errors; everything
/// else is an opaque storage fault.
pub fn db_error(error: sqlx::Error) -> TimeError {
    if let sqlx::Error::Database(db) = &error {
        match (db.code().as_deref(), db.constraint()) {
            (Some("23505"), Some(APPOINTMENT_SLOT_UNIQUE)) => return TimeError::SlotTaken,
            (Some("23P01"), Some(ROOM_NO_OVERLAP)) => return TimeError::RoomConflict,
            (Some("23P01"), Some(DOCTOR_NO_OVERLAP)) => return TimeError::DoctorConflict,
            _ => {}
        }
    }

    TimeError::Database(eyre::Report::new(error))
}

enum DeleteTarget<'a> {
    One(Uuid),
    Scope(&'a TimetableScope),
}

#[derive(Debug, Clone)]
pub struct PgTimetableStore {
    pool: DbPool,
}

impl PgTimetableStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Soft-deletes the targeted timetables and their appointments in one
    /// transaction.
    async fn soft_delete(&self, target: DeleteTarget<'_>) -> TimeResult<u64> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let deleted = match target {
            DeleteTarget::One(id) => timetable::soft_delete_timetable(&mut *tx, id).await,
            DeleteTarget::Scope(scope) => timetable::soft_delete_timetables(&mut *tx, scope).await,
        }
        .map_err(db_error)?;

        if !deleted.is_empty() {
            let cancelled = appointment::soft_delete_appointments_by_timetable_ids(&mut *tx, &deleted)
                .await
                .map_err(db_error)?;
            debug!(
                "Soft-deleted {} timetable(s) and {} appointment(s)",
                deleted.len(),
                cancelled
            );
        }

        tx.commit().await.map_err(db_error)?;
        Ok(deleted.len() as u64)
    }
}

#[async_trait]
impl TimetableStore for PgTimetableStore {
    async fn begin(&self) -> TimeResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await.map_err(db_error)?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn get_timetable(&self, id: Uuid) -> TimeResult<Option<Timetable>> {
        let row = timetable::get_timetable_by_id(&self.pool, id)
            .await
            .map_err(db_error)?;
        Ok(row.map(Timetable::from))
    }

    async fn list_timetables(
        &self,
        scope: &TimetableScope,
        window: &TimeWindow,
    ) -> TimeResult<Vec<Timetable>> {
        let rows = timetable::list_timetables(&self.pool, scope, window)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Timetable::from).collect())
    }

    async fn list_appointments(&self, timetable_id: Uuid) -> TimeResult<Vec<Appointment>> {
        let rows = appointment::get_appointments_by_timetable_id(&self.pool, timetable_id)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    async fn get_appointment(&self, id: Uuid) -> TimeResult<Option<Appointment>> {
        let row = appointment::get_appointment_by_id(&self.pool, id)
            .await
            .map_err(db_error)?;
        Ok(row.map(Appointment::from))
    }

    async fn delete_timetable(&self, id: Uuid) -> TimeResult<u64> {
        self.soft_delete(DeleteTarget::One(id)).await
    }

    async fn delete_timetables(&self, scope: &TimetableScope) -> TimeResult<u64> {
        let deleted = self.soft_delete(DeleteTarget::Scope(scope)).await?;
        info!("Soft-deleted {} timetable(s) in {:?}", deleted, scope);
        Ok(deleted)
    }

    async fn delete_appointment(&self, id: Uuid) -> TimeResult<bool> {
        appointment::soft_delete_appointment(&self.pool, id)
            .await
            .map_err(db_error)
    }
}

/// Dropping without [`StoreTransaction::commit`] rolls back.
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn lock_timetable(&mut self, id: Uuid, mode: LockMode) -> TimeResult<Option<Timetable>> {
        let row = timetable::lock_timetable_by_id(&mut *self.tx, id, mode)
            .await
            .map_err(db_error)?;
        Ok(row.map(Timetable::from))
    }

    async fn find_room_conflict(
        &mut self,
        hospital_id: i64,
        room: &str,
        span: &Span,
        exclude: Option<Uuid>,
    ) -> TimeResult<Option<Timetable>> {
        repositories::lock_scope(&mut *self.tx, &repositories::room_scope_key(hospital_id, room))
            .await
            .map_err(db_error)?;

        let row = timetable::find_room_overlap(&mut *self.tx, hospital_id, room, span.from, span.to, exclude)
            .await
            .map_err(db_error)?;
        Ok(row.map(Timetable::from))
    }

    async fn find_doctor_conflict(
        &mut self,
        doctor_id: i64,
        span: &Span,
        exclude: Option<Uuid>,
    ) -> TimeResult<Option<Timetable>> {
        repositories::lock_scope(&mut *self.tx, &repositories::doctor_scope_key(doctor_id))
            .await
            .map_err(db_error)?;

        let row = timetable::find_doctor_overlap(&mut *self.tx, doctor_id, span.from, span.to, exclude)
            .await
            .map_err(db_error)?;
        Ok(row.map(Timetable::from))
    }

    async fn count_appointments(&mut self, timetable_id: Uuid) -> TimeResult<i64> {
        appointment::count_appointments(&mut *self.tx, timetable_id)
            .await
            .map_err(db_error)
    }

    async fn find_appointment_at(
        &mut self,
        timetable_id: Uuid,
        time: DateTime<Utc>,
    ) -> TimeResult<Option<Appointment>> {
        let row = appointment::get_appointment_at(&mut *self.tx, timetable_id, time)
            .await
            .map_err(db_error)?;
        Ok(row.map(Appointment::from))
    }

    async fn insert_timetable(&mut self, fields: &TimetableFields) -> TimeResult<Timetable> {
        let row = timetable::create_timetable(&mut *self.tx, fields)
            .await
            .map_err(db_error)?;
        Ok(row.into())
    }

    async fn update_timetable(&mut self, id: Uuid, fields: &TimetableFields) -> TimeResult<Timetable> {
        timetable::update_timetable(&mut *self.tx, id, fields)
            .await
            .map_err(db_error)?
            .map(Timetable::from)
            .ok_or_else(|| TimeError::NotFound(format!("Timetable with ID {} not found", id)))
    }

    async fn insert_appointment(
        &mut self,
        timetable_id: Uuid,
        user_id: i64,
        time: DateTime<Utc>,
    ) -> TimeResult<Appointment> {
        let row = appointment::create_appointment(&mut *self.tx, timetable_id, user_id, time)
            .await
            .map_err(db_error)?;
        Ok(row.into())
    }

    async fn commit(self: Box<Self>) -> TimeResult<()> {
        self.tx.commit().await.map_err(db_error)
    }
}
