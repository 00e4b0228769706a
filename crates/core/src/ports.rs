//! # Ports
//!
//! The seams between the scheduling core and the outside world:
//!
//! - [`IdentityService`] and [`FacilityService`] answer referential questions
//!   owned by other services (is this a doctor, does this room exist, who is
//!   calling).
//! - [`TimetableStore`] and [`StoreTransaction`] are the durable storage. All
//!   cross-request safety lives behind these traits: a transaction either
//!   commits every write it made or none of them, and dropping one without
//!   calling [`StoreTransaction::commit`] rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::TimeResult;
use crate::grid::Span;
use crate::models::{
    appointment::Appointment,
    identity::{CallerIdentity, Credential},
    timetable::{TimeWindow, Timetable, TimetableFields, TimetableScope},
};

/// Remote identity/account service.
///
/// `Ok(false)` is a well-formed negative answer. Transport failures and
/// timeouts surface as `TimeError::UpstreamUnavailable`, never as `Ok(false)`.
#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn validate_doctor(&self, doctor_id: i64, credential: &Credential) -> TimeResult<bool>;

    async fn resolve_caller(&self, credential: &Credential) -> TimeResult<CallerIdentity>;
}

/// Remote facility/hospital directory.
#[async_trait]
pub trait FacilityService: Send + Sync {
    async fn validate_hospital_room(
        &self,
        hospital_id: i64,
        room: &str,
        credential: &Credential,
    ) -> TimeResult<bool>;
}

/// How a transaction holds a timetable row it has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// The row is about to be rewritten.
    Update,
    /// The row must not change while dependent rows are written.
    Share,
}

#[async_trait]
pub trait TimetableStore: Send + Sync {
    async fn begin(&self) -> TimeResult<Box<dyn StoreTransaction>>;

    async fn get_timetable(&self, id: Uuid) -> TimeResult<Option<Timetable>>;

    async fn list_timetables(
        &self,
        scope: &TimetableScope,
        window: &TimeWindow,
    ) -> TimeResult<Vec<Timetable>>;

    /// Active appointments of a timetable, ordered by slot time.
    async fn list_appointments(&self, timetable_id: Uuid) -> TimeResult<Vec<Appointment>>;

    async fn get_appointment(&self, id: Uuid) -> TimeResult<Option<Appointment>>;

    /// Soft-deletes one timetable and its appointments. Returns the number of
    /// timetables newly marked deleted.
    async fn delete_timetable(&self, id: Uuid) -> TimeResult<u64>;

    /// Soft-deletes every active timetable in `scope`, cascading.
    async fn delete_timetables(&self, scope: &TimetableScope) -> TimeResult<u64>;

    /// Returns false when the appointment was already gone.
    async fn delete_appointment(&self, id: Uuid) -> TimeResult<bool>;
}

/// One storage transaction. Conflict queries must be race-free against other
/// transactions querying the same scope.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn lock_timetable(&mut self, id: Uuid, mode: LockMode) -> TimeResult<Option<Timetable>>;

    /// Any active timetable in the same hospital room overlapping `span`.
    async fn find_room_conflict(
        &mut self,
        hospital_id: i64,
        room: &str,
        span: &Span,
        exclude: Option<Uuid>,
    ) -> TimeResult<Option<Timetable>>;

    /// Any active timetable of the same doctor overlapping `span`, anywhere.
    async fn find_doctor_conflict(
        &mut self,
        doctor_id: i64,
        span: &Span,
        exclude: Option<Uuid>,
    ) -> TimeResult<Option<Timetable>>;

    async fn count_appointments(&mut self, timetable_id: Uuid) -> TimeResult<i64>;

    async fn find_appointment_at(
        &mut self,
        timetable_id: Uuid,
        time: DateTime<Utc>,
    ) -> TimeResult<Option<Appointment>>;

    async fn insert_timetable(&mut self, fields: &TimetableFields) -> TimeResult<Timetable>;

    async fn update_timetable(&mut self, id: Uuid, fields: &TimetableFields) -> TimeResult<Timetable>;

    /// Fails with `TimeError::SlotTaken` when an active appointment already
    /// holds `(timetable_id, time)`, regardless of any earlier check.
    async fn insert_appointment(
        &mut self,
        timetable_id: Uuid,
        user_id: i64,
        time: DateTime<Utc>,
    ) -> TimeResult<Appointment>;

    async fn commit(self: Box<Self>) -> TimeResult<()>;
}
