pub mod booking;
pub mod timetable;

pub use booking::BookingService;
pub use timetable::TimetableService;
