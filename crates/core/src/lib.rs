//! Scheduling core for hospital timetables and appointment slots.
//!
//! Everything that decides whether a timetable or an appointment may exist
//! lives here. Storage and the remote account/hospital services are reached
//! through the traits in [`ports`].

pub mod errors;
pub mod grid;
pub mod memory;
pub mod mock;
pub mod models;
pub mod policy;
pub mod ports;
pub mod services;
