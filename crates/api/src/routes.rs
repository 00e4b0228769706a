/// Slot listing, booking and cancellation endpoints
pub mod appointment;
/// Health and version endpoints
pub mod health;
/// Timetable endpoints
pub mod timetable;
