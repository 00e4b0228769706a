use async_trait::async_trait;
use mockall::mock;
use uuid::Uuid;

use crate::errors::TimeResult;
use crate::models::{
    appointment::Appointment,
    identity::{CallerIdentity, Credential},
    timetable::{TimeWindow, Timetable, TimetableScope},
};
use crate::ports::{FacilityService, IdentityService, StoreTransaction, TimetableStore};

// Mock remote services for testing
mock! {
    pub IdentityService {}

    #[async_trait]
    impl IdentityService for IdentityService {
        async fn validate_doctor(&self, doctor_id: i64, credential: &Credential) -> TimeResult<bool>;

        async fn resolve_caller(&self, credential: &Credential) -> TimeResult<CallerIdentity>;
    }
}

mock! {
    pub FacilityService {}

    #[async_trait]
    impl FacilityService for FacilityService {
        async fn validate_hospital_room(
            &self,
            hospital_id: i64,
            room: &str,
            credential: &Credential,
        ) -> TimeResult<bool>;
    }
}

// Mock store, for exercising storage failures
mock! {
    pub TimetableStore {}

    #[async_trait]
    impl TimetableStore for TimetableStore {
        async fn begin(&self) -> TimeResult<Box<dyn StoreTransaction>>;

        async fn get_timetable(&self, id: Uuid) -> TimeResult<Option<Timetable>>;

        async fn list_timetables(
            &self,
            scope: &TimetableScope,
            window: &TimeWindow,
        ) -> TimeResult<Vec<Timetable>>;

        async fn list_appointments(&self, timetable_id: Uuid) -> TimeResult<Vec<Appointment>>;

        async fn get_appointment(&self, id: Uuid) -> TimeResult<Option<Appointment>>;

        async fn delete_timetable(&self, id: Uuid) -> TimeResult<u64>;

        async fn delete_timetables(&self, scope: &TimetableScope) -> TimeResult<u64>;

        async fn delete_appointment(&self, id: Uuid) -> TimeResult<bool>;
    }
}
