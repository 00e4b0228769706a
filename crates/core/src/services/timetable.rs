//! # Timetable Store
//!
//! Creates, mutates and deletes timetables while keeping two invariants:
//! no two active timetables overlap in the same hospital room, and no two
//! active timetables overlap for the same doctor.
//!
//! Each mutation runs its conflict queries and its write inside one store
//! transaction. Any early return drops the transaction, which rolls it back,
//! so a rejected request never leaves partial state behind.
//!
//! External referential checks (room, doctor) run before the transaction is
//! opened, so neither a scope lock nor a row lock is held across a network
//! round trip.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{TimeError, TimeResult, ValidationError};
use crate::grid::{Span, is_grid_aligned};
use crate::models::{
    identity::Credential,
    timetable::{
        CreateTimetableRequest, TimeWindow, Timetable, TimetableFields, TimetableScope,
        UpdateTimetableRequest,
    },
};
use crate::ports::{FacilityService, IdentityService, LockMode, StoreTransaction, TimetableStore};

#[derive(Clone)]
pub struct TimetableService {
    store: Arc<dyn TimetableStore>,
    identity: Arc<dyn IdentityService>,
    facility: Arc<dyn FacilityService>,
}

impl TimetableService {
    pub fn new(
        store: Arc<dyn TimetableStore>,
        identity: Arc<dyn IdentityService>,
        facility: Arc<dyn FacilityService>,
    ) -> Self {
        Self {
            store,
            identity,
            facility,
        }
    }

    pub async fn create_timetable(
        &self,
        request: &CreateTimetableRequest,
        credential: &Credential,
    ) -> TimeResult<Timetable> {
        let span = Span::new(request.from, request.to)?;

        self.ensure_room(request.hospital_id, &request.room, credential)
            .await?;
        self.ensure_doctor(request.doctor_id, credential).await?;

        let mut tx = self.store.begin().await?;
        check_conflicts(tx.as_mut(), request, &span, None).await?;

        let timetable = tx.insert_timetable(request).await?;
        tx.commit().await?;

        info!(
            "Created timetable {} for doctor {} in hospital {} room '{}' ({} - {})",
            timetable.id,
            timetable.doctor_id,
            timetable.hospital_id,
            timetable.room,
            timetable.from,
            timetable.to
        );
        Ok(timetable)
    }

    /// Applies a partial update atomically.
    ///
    /// A timetable with active appointments cannot change any defining
    /// field. A request that changes nothing succeeds without a write.
    ///
    /// Changed room and doctor references are validated against a snapshot
    /// read before the transaction, so no row lock is held across a remote
    /// call. Only when the row changed between the snapshot and the lock are
    /// the references not yet covered validated under the lock.
    pub async fn update_timetable(
        &self,
        id: Uuid,
        request: &UpdateTimetableRequest,
        credential: &Credential,
    ) -> TimeResult<Timetable> {
        for supplied in [request.from, request.to].into_iter().flatten() {
            if !is_grid_aligned(&supplied) {
                return Err(ValidationError::MisalignedTime.into());
            }
        }

        let snapshot = self
            .store
            .get_timetable(id)
            .await?
            .ok_or_else(|| timetable_not_found(id))?;
        let snapshot_fields = snapshot.fields();
        let prospective = request.merge(&snapshot_fields);
        if prospective == snapshot_fields {
            debug!("Update of timetable {} changes nothing", id);
            return Ok(snapshot);
        }

        if !self.store.list_appointments(id).await?.is_empty() {
            warn!("Refusing to update booked timetable {}", id);
            return Err(TimeError::TimetableLocked);
        }
        Span::new(prospective.from, prospective.to)?;

        let mut checked = CheckedReferences::default();
        self.ensure_changed_references(&snapshot_fields, &prospective, &mut checked, credential)
            .await?;

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_timetable(id, LockMode::Update)
            .await?
            .ok_or_else(|| timetable_not_found(id))?;

        let current_fields = current.fields();
        let merged = request.merge(&current_fields);
        if merged == current_fields {
            debug!("Update of timetable {} changes nothing", id);
            tx.commit().await?;
            return Ok(current);
        }

        let booked = tx.count_appointments(id).await?;
        if booked > 0 {
            warn!(
                "Refusing to update timetable {}: {} active appointment(s)",
                id, booked
            );
            return Err(TimeError::TimetableLocked);
        }

        let span = Span::new(merged.from, merged.to)?;

        if current_fields != snapshot_fields {
            debug!("Timetable {} changed since it was read, rechecking references", id);
            self.ensure_changed_references(&current_fields, &merged, &mut checked, credential)
                .await?;
        }

        check_conflicts(tx.as_mut(), &merged, &span, Some(id)).await?;

        let updated = tx.update_timetable(id, &merged).await?;
        tx.commit().await?;

        info!("Updated timetable {}", id);
        Ok(updated)
    }

    /// Soft-deletes a timetable and its appointments. Deleting an unknown or
    /// already deleted timetable is not an error.
    pub async fn delete_timetable(&self, id: Uuid) -> TimeResult<()> {
        let deleted = self.store.delete_timetable(id).await?;
        info!("Deleted timetable {} ({} row(s) affected)", id, deleted);
        Ok(())
    }

    pub async fn delete_timetables_by_doctor(&self, doctor_id: i64) -> TimeResult<u64> {
        let deleted = self
            .store
            .delete_timetables(&TimetableScope::Doctor(doctor_id))
            .await?;
        info!("Deleted {} timetable(s) of doctor {}", deleted, doctor_id);
        Ok(deleted)
    }

    pub async fn delete_timetables_by_hospital(&self, hospital_id: i64) -> TimeResult<u64> {
        let deleted = self
            .store
            .delete_timetables(&TimetableScope::Hospital(hospital_id))
            .await?;
        info!("Deleted {} timetable(s) of hospital {}", deleted, hospital_id);
        Ok(deleted)
    }

    pub async fn list_timetables(
        &self,
        scope: &TimetableScope,
        window: &TimeWindow,
    ) -> TimeResult<Vec<Timetable>> {
        debug!("Listing timetables for {:?} within {:?}", scope, window);
        self.store.list_timetables(scope, window).await
    }

    async fn ensure_room(
        &self,
        hospital_id: i64,
        room: &str,
        credential: &Credential,
    ) -> TimeResult<()> {
        if self
            .facility
            .validate_hospital_room(hospital_id, room, credential)
            .await?
        {
            return Ok(());
        }

        warn!("Room '{}' not found in hospital {}", room, hospital_id);
        Err(TimeError::InvalidRoom(format!(
            "room '{}' not found in hospital {}",
            room, hospital_id
        )))
    }

    async fn ensure_doctor(&self, doctor_id: i64, credential: &Credential) -> TimeResult<()> {
        if self.identity.validate_doctor(doctor_id, credential).await? {
            return Ok(());
        }

        warn!("Account {} is not a doctor", doctor_id);
        Err(TimeError::NotADoctor)
    }

    /// Validates the references `merged` changes relative to `current`,
    /// skipping any already recorded in `checked`.
    async fn ensure_changed_references(
        &self,
        current: &TimetableFields,
        merged: &TimetableFields,
        checked: &mut CheckedReferences,
        credential: &Credential,
    ) -> TimeResult<()> {
        let room = (merged.hospital_id, merged.room.clone());
        let room_changed =
            merged.hospital_id != current.hospital_id || merged.room != current.room;
        if room_changed && checked.room.as_ref() != Some(&room) {
            self.ensure_room(merged.hospital_id, &merged.room, credential)
                .await?;
            checked.room = Some(room);
        }

        if merged.doctor_id != current.doctor_id && checked.doctor != Some(merged.doctor_id) {
            self.ensure_doctor(merged.doctor_id, credential).await?;
            checked.doctor = Some(merged.doctor_id);
        }

        Ok(())
    }
}

/// References already confirmed by the remote services during one update.
#[derive(Debug, Default)]
struct CheckedReferences {
    room: Option<(i64, String)>,
    doctor: Option<i64>,
}

fn timetable_not_found(id: Uuid) -> TimeError {
    TimeError::NotFound(format!("Timetable with ID {} not found", id))
}

/// Room scope first, then doctor scope.
async fn check_conflicts(
    tx: &mut dyn StoreTransaction,
    fields: &TimetableFields,
    span: &Span,
    exclude: Option<Uuid>,
) -> TimeResult<()> {
    if let Some(existing) = tx
        .find_room_conflict(fields.hospital_id, &fields.room, span, exclude)
        .await?
    {
        warn!(
            "Room '{}' in hospital {} already booked by timetable {}",
            fields.room, fields.hospital_id, existing.id
        );
        return Err(TimeError::RoomConflict);
    }

    if let Some(existing) = tx
        .find_doctor_conflict(fields.doctor_id, span, exclude)
        .await?
    {
        warn!(
            "Doctor {} already booked by timetable {}",
            fields.doctor_id, existing.id
        );
        return Err(TimeError::DoctorConflict);
    }

    Ok(())
}
