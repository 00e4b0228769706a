//! # Appointment Booking
//!
//! Derives the bookable slots of a timetable and reserves or cancels them.
//!
//! The "slot already taken" pre-check is an early exit only. The store's
//! insert is the arbiter: of two concurrent bookings of the same slot exactly
//! one commits, the other fails with `TimeError::SlotTaken`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{TimeError, TimeResult, ValidationError};
use crate::grid::is_grid_aligned;
use crate::models::{
    appointment::Appointment,
    identity::{Caller, CallerIdentity},
};
use crate::policy::APPOINTMENT_MODERATORS;
use crate::ports::{LockMode, TimetableStore};

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn TimetableStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn TimetableStore>) -> Self {
        Self { store }
    }

    /// Every grid instant in `[from, to)` not held by an active appointment,
    /// ascending.
    pub async fn list_available_slots(&self, timetable_id: Uuid) -> TimeResult<Vec<DateTime<Utc>>> {
        let timetable = self
            .store
            .get_timetable(timetable_id)
            .await?
            .ok_or_else(|| timetable_not_found(timetable_id))?;

        let booked: HashSet<DateTime<Utc>> = self
            .store
            .list_appointments(timetable_id)
            .await?
            .into_iter()
            .map(|appointment| appointment.time)
            .collect();

        Ok(timetable
            .span()
            .slots()
            .filter(|slot| !booked.contains(slot))
            .collect())
    }

    /// Books `time` in the timetable for the calling user.
    ///
    /// The range check admits `time == to`; see [`crate::grid::Span::admits`].
    pub async fn create_appointment(
        &self,
        timetable_id: Uuid,
        time: DateTime<Utc>,
        caller: &Caller,
    ) -> TimeResult<Appointment> {
        let mut tx = self.store.begin().await?;

        let timetable = tx
            .lock_timetable(timetable_id, LockMode::Share)
            .await?
            .ok_or_else(|| timetable_not_found(timetable_id))?;

        if !timetable.span().admits(time) {
            return Err(ValidationError::OutOfRange.into());
        }
        if !is_grid_aligned(&time) {
            return Err(ValidationError::MisalignedTime.into());
        }

        if tx.find_appointment_at(timetable_id, time).await?.is_some() {
            warn!("Slot {} of timetable {} already booked", time, timetable_id);
            return Err(TimeError::SlotTaken);
        }

        let appointment = tx
            .insert_appointment(timetable_id, caller.identity.user_id, time)
            .await?;
        tx.commit().await?;

        info!(
            "User {} booked {} in timetable {}",
            appointment.user_id, appointment.time, timetable_id
        );
        Ok(appointment)
    }

    /// Cancels an appointment. Owners may cancel their own; admins and
    /// managers may cancel any.
    pub async fn delete_appointment(&self, id: Uuid, caller: &CallerIdentity) -> TimeResult<()> {
        let appointment = self
            .store
            .get_appointment(id)
            .await?
            .ok_or_else(|| TimeError::NotFound(format!("Appointment with ID {} not found", id)))?;

        if appointment.user_id != caller.user_id && !caller.has_any_role(APPOINTMENT_MODERATORS) {
            return Err(TimeError::Authorization(
                "You do not have permission to cancel this appointment".to_string(),
            ));
        }

        self.store.delete_appointment(id).await?;
        info!("Appointment {} cancelled by user {}", id, caller.user_id);
        Ok(())
    }
}

fn timetable_not_found(id: Uuid) -> TimeError {
    TimeError::NotFound(format!("Timetable with ID {} not found", id))
}
