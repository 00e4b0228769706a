//! In-memory [`TimetableStore`] for tests and local runs.
//!
//! Transactions are fully serialised: `begin` takes an exclusive lock on the
//! whole state and works on a private copy, `commit` publishes the copy, and
//! dropping the transaction discards it. The same uniqueness and overlap
//! backstops the PostgreSQL schema enforces are applied on insert.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::errors::{TimeError, TimeResult};
use crate::grid::Span;
use crate::models::{
    appointment::Appointment,
    timetable::{TimeWindow, Timetable, TimetableFields, TimetableScope},
};
use crate::ports::{LockMode, StoreTransaction, TimetableStore};

#[derive(Debug, Clone)]
struct StoredTimetable {
    timetable: Timetable,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct StoredAppointment {
    appointment: Appointment,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    timetables: Vec<StoredTimetable>,
    appointments: Vec<StoredAppointment>,
}

impl MemoryState {
    fn active_timetables(&self) -> impl Iterator<Item = &Timetable> {
        self.timetables
            .iter()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| &row.timetable)
    }

    fn active_appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.appointments
            .iter()
            .filter(|row| row.deleted_at.is_none())
            .map(|row| &row.appointment)
    }

    fn timetable(&self, id: Uuid) -> Option<Timetable> {
        self.active_timetables().find(|t| t.id == id).cloned()
    }

    fn room_conflict(
        &self,
        hospital_id: i64,
        room: &str,
        span: &Span,
        exclude: Option<Uuid>,
    ) -> Option<Timetable> {
        self.active_timetables()
            .filter(|t| Some(t.id) != exclude)
            .find(|t| t.hospital_id == hospital_id && t.room == room && t.span().overlaps(span))
            .cloned()
    }

    fn doctor_conflict(&self, doctor_id: i64, span: &Span, exclude: Option<Uuid>) -> Option<Timetable> {
        self.active_timetables()
            .filter(|t| Some(t.id) != exclude)
            .find(|t| t.doctor_id == doctor_id && t.span().overlaps(span))
            .cloned()
    }

    fn check_overlap_constraints(&self, fields: &TimetableFields, exclude: Option<Uuid>) -> TimeResult<()> {
        let span = fields.span();
        if self
            .room_conflict(fields.hospital_id, &fields.room, &span, exclude)
            .is_some()
        {
            return Err(TimeError::RoomConflict);
        }
        if self.doctor_conflict(fields.doctor_id, &span, exclude).is_some() {
            return Err(TimeError::DoctorConflict);
        }
        Ok(())
    }

    /// Marks matching active timetables and their appointments deleted.
    fn soft_delete_where(&mut self, predicate: impl Fn(&Timetable) -> bool) -> u64 {
        let now = Utc::now();
        let mut deleted_ids = Vec::new();

        for row in self.timetables.iter_mut() {
            if row.deleted_at.is_none() && predicate(&row.timetable) {
                row.deleted_at = Some(now);
                deleted_ids.push(row.timetable.id);
            }
        }

        for row in self.appointments.iter_mut() {
            if row.deleted_at.is_none() && deleted_ids.contains(&row.appointment.timetable_id) {
                row.deleted_at = Some(now);
            }
        }

        deleted_ids.len() as u64
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimetableStore for InMemoryStore {
    async fn begin(&self) -> TimeResult<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }

    async fn get_timetable(&self, id: Uuid) -> TimeResult<Option<Timetable>> {
        Ok(self.state.lock().await.timetable(id))
    }

    async fn list_timetables(
        &self,
        scope: &TimetableScope,
        window: &TimeWindow,
    ) -> TimeResult<Vec<Timetable>> {
        let state = self.state.lock().await;
        let mut timetables: Vec<Timetable> = state
            .active_timetables()
            .filter(|t| scope.matches(t) && window.contains(t))
            .cloned()
            .collect();
        timetables.sort_by_key(|t| t.from);
        Ok(timetables)
    }

    async fn list_appointments(&self, timetable_id: Uuid) -> TimeResult<Vec<Appointment>> {
        let state = self.state.lock().await;
        let mut appointments: Vec<Appointment> = state
            .active_appointments()
            .filter(|a| a.timetable_id == timetable_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.time);
        Ok(appointments)
    }

    async fn get_appointment(&self, id: Uuid) -> TimeResult<Option<Appointment>> {
        let state = self.state.lock().await;
        Ok(state.active_appointments().find(|a| a.id == id).cloned())
    }

    async fn delete_timetable(&self, id: Uuid) -> TimeResult<u64> {
        let mut state = self.state.lock().await;
        Ok(state.soft_delete_where(|t| t.id == id))
    }

    async fn delete_timetables(&self, scope: &TimetableScope) -> TimeResult<u64> {
        let mut state = self.state.lock().await;
        Ok(state.soft_delete_where(|t| scope.matches(t)))
    }

    async fn delete_appointment(&self, id: Uuid) -> TimeResult<bool> {
        let mut state = self.state.lock().await;
        let row = state
            .appointments
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.appointment.id == id);

        Ok(match row {
            Some(row) => {
                row.deleted_at = Some(Utc::now());
                true
            }
            None => false,
        })
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn lock_timetable(&mut self, id: Uuid, _mode: LockMode) -> TimeResult<Option<Timetable>> {
        Ok(self.staged.timetable(id))
    }

    async fn find_room_conflict(
        &mut self,
        hospital_id: i64,
        room: &str,
        span: &Span,
        exclude: Option<Uuid>,
    ) -> TimeResult<Option<Timetable>> {
        Ok(self.staged.room_conflict(hospital_id, room, span, exclude))
    }

    async fn find_doctor_conflict(
        &mut self,
        doctor_id: i64,
        span: &Span,
        exclude: Option<Uuid>,
    ) -> TimeResult<Option<Timetable>> {
        Ok(self.staged.doctor_conflict(doctor_id, span, exclude))
    }

    async fn count_appointments(&mut self, timetable_id: Uuid) -> TimeResult<i64> {
        Ok(self
            .staged
            .active_appointments()
            .filter(|a| a.timetable_id == timetable_id)
            .count() as i64)
    }

    async fn find_appointment_at(
        &mut self,
        timetable_id: Uuid,
        time: DateTime<Utc>,
    ) -> TimeResult<Option<Appointment>> {
        Ok(self
            .staged
            .active_appointments()
            .find(|a| a.timetable_id == timetable_id && a.time == time)
            .cloned())
    }

    async fn insert_timetable(&mut self, fields: &TimetableFields) -> TimeResult<Timetable> {
        self.staged.check_overlap_constraints(fields, None)?;

        let now = Utc::now();
        let timetable = Timetable {
            id: Uuid::new_v4(),
            hospital_id: fields.hospital_id,
            doctor_id: fields.doctor_id,
            room: fields.room.clone(),
            from: fields.from,
            to: fields.to,
            created_at: now,
            updated_at: now,
        };
        self.staged.timetables.push(StoredTimetable {
            timetable: timetable.clone(),
            deleted_at: None,
        });
        Ok(timetable)
    }

    async fn update_timetable(&mut self, id: Uuid, fields: &TimetableFields) -> TimeResult<Timetable> {
        self.staged.check_overlap_constraints(fields, Some(id))?;

        let row = self
            .staged
            .timetables
            .iter_mut()
            .find(|row| row.deleted_at.is_none() && row.timetable.id == id)
            .ok_or_else(|| TimeError::NotFound(format!("Timetable with ID {} not found", id)))?;

        row.timetable.hospital_id = fields.hospital_id;
        row.timetable.doctor_id = fields.doctor_id;
        row.timetable.room = fields.room.clone();
        row.timetable.from = fields.from;
        row.timetable.to = fields.to;
        row.timetable.updated_at = Utc::now();
        Ok(row.timetable.clone())
    }

    async fn insert_appointment(
        &mut self,
        timetable_id: Uuid,
        user_id: i64,
        time: DateTime<Utc>,
    ) -> TimeResult<Appointment> {
        let taken = self
            .staged
            .active_appointments()
            .any(|a| a.timetable_id == timetable_id && a.time == time);
        if taken {
            return Err(TimeError::SlotTaken);
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            timetable_id,
            user_id,
            time,
            created_at: Utc::now(),
        };
        self.staged.appointments.push(StoredAppointment {
            appointment: appointment.clone(),
            deleted_at: None,
        });
        Ok(appointment)
    }

    async fn commit(self: Box<Self>) -> TimeResult<()> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
