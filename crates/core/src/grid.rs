//! # Time Grid
//!
//! Every timestamp the scheduler stores sits on a 30-minute grid: minute 0 or
//! 30, with zero seconds and sub-seconds. Availability windows are half-open
//! intervals `[from, to)` no longer than twelve hours.
//!
//! Everything here is pure; nothing touches storage or the network.

use std::iter::FusedIterator;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Length of one bookable slot, in minutes.
pub const SLOT_MINUTES: i64 = 30;

/// Longest allowed availability window, in hours.
pub const MAX_SPAN_HOURS: i64 = 12;

pub fn slot_length() -> Duration {
    Duration::minutes(SLOT_MINUTES)
}

pub fn max_span() -> Duration {
    Duration::hours(MAX_SPAN_HOURS)
}

/// Returns true iff `t` falls exactly on a half-hour boundary.
pub fn is_grid_aligned(t: &DateTime<Utc>) -> bool {
    t.minute() % SLOT_MINUTES as u32 == 0 && t.second() == 0 && t.nanosecond() == 0
}

/// Checks a prospective window.
///
/// Alignment is checked first, then ordering, then length.
pub fn validate_span(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<(), ValidationError> {
    if !is_grid_aligned(&from) || !is_grid_aligned(&to) {
        return Err(ValidationError::MisalignedTime);
    }

    if to <= from {
        return Err(ValidationError::InvalidSpan);
    }

    if to - from > max_span() {
        return Err(ValidationError::SpanTooLong);
    }

    Ok(())
}

/// Strict half-open overlap: `[a_from, a_to)` and `[b_from, b_to)` share an
/// instant. Touching windows (`a_to == b_from`) do not overlap.
pub fn overlaps(
    a_from: DateTime<Utc>,
    a_to: DateTime<Utc>,
    b_from: DateTime<Utc>,
    b_to: DateTime<Utc>,
) -> bool {
    a_from < b_to && a_to > b_from
}

/// A validated availability window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Span {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, ValidationError> {
        validate_span(from, to)?;
        Ok(Self { from, to })
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        overlaps(self.from, self.to, other.from, other.to)
    }

    /// Point-in-range test used when booking. The upper bound is inclusive,
    /// unlike the exclusive bound used for overlap.
    pub fn admits(&self, t: DateTime<Utc>) -> bool {
        t >= self.from && t <= self.to
    }

    pub fn slots(&self) -> Slots {
        slots(self.from, self.to)
    }
}

/// Lazily yields `from, from + 30m, ...` strictly before `end`.
///
/// Cloning a `Slots` restarts from the clone point, so the same window can be
/// walked any number of times.
#[derive(Debug, Clone)]
pub struct Slots {
    next: DateTime<Utc>,
    end: DateTime<Utc>,
}

pub fn slots(from: DateTime<Utc>, to: DateTime<Utc>) -> Slots {
    Slots { next: from, end: to }
}

impl Iterator for Slots {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next = current + slot_length();
        Some(current)
    }
}

impl FusedIterator for Slots {}
