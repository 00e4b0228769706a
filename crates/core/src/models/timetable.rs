use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use uuid::Uuid;

use crate::grid::Span;

/// One contiguous availability window for one doctor in one hospital room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub id: Uuid,
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub room: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timetable {
    pub fn span(&self) -> Span {
        Span {
            from: self.from,
            to: self.to,
        }
    }

    pub fn fields(&self) -> TimetableFields {
        TimetableFields {
            hospital_id: self.hospital_id,
            doctor_id: self.doctor_id,
            room: self.room.clone(),
            from: self.from,
            to: self.to,
        }
    }
}

/// The defining fields of a timetable: the payload of a create request and
/// the prospective state of an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableFields {
    pub hospital_id: i64,
    pub doctor_id: i64,
    pub room: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimetableFields {
    pub fn span(&self) -> Span {
        Span {
            from: self.from,
            to: self.to,
        }
    }
}

pub type CreateTimetableRequest = TimetableFields;

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTimetableRequest {
    pub hospital_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub room: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl UpdateTimetableRequest {
    /// Merges the supplied fields over `current`.
    pub fn merge(&self, current: &TimetableFields) -> TimetableFields {
        TimetableFields {
            hospital_id: self.hospital_id.unwrap_or(current.hospital_id),
            doctor_id: self.doctor_id.unwrap_or(current.doctor_id),
            room: self.room.clone().unwrap_or_else(|| current.room.clone()),
            from: self.from.unwrap_or(current.from),
            to: self.to.unwrap_or(current.to),
        }
    }
}

/// Optional window filter for listings. A timetable matches when it lies
/// entirely inside the window; `to` is inclusive.
///
/// Bounds are RFC 3339. An unescaped `+00:00` offset in a query string
/// decodes to ` 00:00` and is accepted as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(default, deserialize_with = "deserialize_bound")]
    pub from: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_bound")]
    pub to: Option<DateTime<Utc>>,
}

/// Parses an RFC 3339 instant, restoring a positive offset whose `+` was
/// decoded to a space.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|err| match value.rsplit_once(' ') {
            Some((instant, offset)) => {
                DateTime::parse_from_rfc3339(&format!("{}+{}", instant, offset))
            }
            None => Err(err),
        })
        .map(|instant| instant.with_timezone(&Utc))
}

fn deserialize_bound<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|value| parse_instant(&value).map_err(de::Error::custom))
        .transpose()
}

impl TimeWindow {
    pub fn contains(&self, timetable: &Timetable) -> bool {
        self.from.is_none_or(|from| timetable.from >= from)
            && self.to.is_none_or(|to| timetable.to <= to)
    }
}

/// Selects the timetables a listing or bulk deletion applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimetableScope {
    Hospital(i64),
    Doctor(i64),
    Room { hospital_id: i64, room: String },
}

impl TimetableScope {
    pub fn matches(&self, timetable: &Timetable) -> bool {
        match self {
            TimetableScope::Hospital(id) => timetable.hospital_id == *id,
            TimetableScope::Doctor(id) => timetable.doctor_id == *id,
            TimetableScope::Room { hospital_id, room } => {
                timetable.hospital_id == *hospital_id && timetable.room == *room
            }
        }
    }
}
