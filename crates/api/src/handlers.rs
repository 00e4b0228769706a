/// Slot listing, booking and cancellation
pub mod appointment;
/// Timetable creation, mutation, deletion and listing
pub mod timetable;
