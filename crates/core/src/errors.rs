use thiserror::Error;

/// Rejections produced by the time-grid and range checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Time must be in 30-minute increments and seconds must be zero")]
    MisalignedTime,

    #[error("'to' must be greater than 'from'")]
    InvalidSpan,

    #[error("Time difference between 'from' and 'to' must not exceed 12 hours")]
    SpanTooLong,

    #[error("Selected time is outside of timetable range")]
    OutOfRange,

    #[error("{0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum TimeError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Room is already booked for this time period")]
    RoomConflict,

    #[error("Doctor is already booked for this time period")]
    DoctorConflict,

    #[error("Time slot already booked")]
    SlotTaken,

    #[error("Cannot update timetable with existing appointments")]
    TimetableLocked,

    #[error("Specified user is not a doctor")]
    NotADoctor,

    #[error("Invalid hospital or room: {0}")]
    InvalidRoom(String),

    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TimeError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            TimeError::NotFound(_) => "NOT_FOUND",
            TimeError::Validation(ValidationError::MisalignedTime) => "MISALIGNED_TIME",
            TimeError::Validation(ValidationError::InvalidSpan) => "INVALID_SPAN",
            TimeError::Validation(ValidationError::SpanTooLong) => "SPAN_TOO_LONG",
            TimeError::Validation(ValidationError::OutOfRange) => "OUT_OF_RANGE",
            TimeError::Validation(ValidationError::Malformed(_)) => "VALIDATION_ERROR",
            TimeError::RoomConflict => "ROOM_CONFLICT",
            TimeError::DoctorConflict => "DOCTOR_CONFLICT",
            TimeError::SlotTaken => "SLOT_TAKEN",
            TimeError::TimetableLocked => "TIMETABLE_LOCKED",
            TimeError::NotADoctor => "NOT_A_DOCTOR",
            TimeError::InvalidRoom(_) => "INVALID_ROOM",
            TimeError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            TimeError::Authentication(_) => "UNAUTHORIZED",
            TimeError::Authorization(_) => "FORBIDDEN",
            TimeError::Database(_) | TimeError::Internal(_) => "INTERNAL",
        }
    }

    /// True for failures the caller caused or can act on, as opposed to
    /// storage or programming faults that must not leak detail.
    pub fn is_client_facing(&self) -> bool {
        !matches!(self, TimeError::Database(_) | TimeError::Internal(_))
    }
}

pub type TimeResult<T> = Result<T, TimeError>;
