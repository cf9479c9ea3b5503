//! Attendance models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ModelError;

/// Treatment category of an attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceType {
    /// Spiritual consultation
    Spiritual,
    /// Light bath treatment
    LightBath,
    /// Rod treatment
    Rod,
}

impl AttendanceType {
    pub const ALL: [AttendanceType; 3] = [Self::Spiritual, Self::LightBath, Self::Rod];

    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spiritual => "spiritual",
            Self::LightBath => "lightBath",
            Self::Rod => "rod",
        }
    }
}

impl fmt::Display for AttendanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spiritual" => Ok(Self::Spiritual),
            "lightBath" => Ok(Self::LightBath),
            "rod" => Ok(Self::Rod),
            _ => Err(ModelError::UnknownAttendanceType(s.to_string())),
        }
    }
}

/// Progression of an attendance through the day.
///
/// Variants are declared in canonical order, so `Ord` follows
/// `scheduled → checkedIn → onGoing → completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Progression {
    Scheduled,
    CheckedIn,
    OnGoing,
    Completed,
}

impl Progression {
    pub const ORDER: [Progression; 4] = [
        Self::Scheduled,
        Self::CheckedIn,
        Self::OnGoing,
        Self::Completed,
    ];

    /// Position in the canonical order.
    pub fn rank(&self) -> usize {
        match self {
            Self::Scheduled => 0,
            Self::CheckedIn => 1,
            Self::OnGoing => 2,
            Self::Completed => 3,
        }
    }

    pub fn next(&self) -> Option<Progression> {
        Self::ORDER.get(self.rank() + 1).copied()
    }

    pub fn previous(&self) -> Option<Progression> {
        self.rank().checked_sub(1).map(|i| Self::ORDER[i])
    }

    /// Wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::CheckedIn => "checkedIn",
            Self::OnGoing => "onGoing",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Progression {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "checkedIn" => Ok(Self::CheckedIn),
            "onGoing" => Ok(Self::OnGoing),
            "completed" => Ok(Self::Completed),
            // "cancelled" is handled outside the board
            _ => Err(ModelError::UnknownProgression(s.to_string())),
        }
    }
}

/// Attendance priority. Lower value is more urgent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    #[serde(rename = "1")]
    Emergency,
    #[serde(rename = "2")]
    Intermediate,
    #[serde(rename = "3")]
    #[default]
    Normal,
}

impl Priority {
    /// Wire spelling ("1", "2" or "3").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "1",
            Self::Intermediate => "2",
            Self::Normal => "3",
        }
    }
}

impl FromStr for Priority {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::Emergency),
            "2" => Ok(Self::Intermediate),
            "3" => Ok(Self::Normal),
            other => Err(ModelError::UnknownPriority(other.to_string())),
        }
    }
}

/// One scheduled, ongoing or completed visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    /// Unique attendance ID
    pub id: u64,
    /// Patient ID
    pub patient_id: u64,
    /// Patient display name
    pub patient_name: String,
    /// Treatment category
    #[serde(rename = "type")]
    pub attendance_type: AttendanceType,
    /// Priority
    pub priority: Priority,
    /// True for the patient's first ever attendance
    pub is_first_attendance: bool,
    /// Current progression state
    pub progression: Progression,
    /// Day the attendance was scheduled for
    pub scheduled_date: NaiveDate,
    pub checked_in_time: Option<DateTime<Utc>>,
    pub on_going_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
}

impl Attendance {
    /// Create a scheduled attendance with normal priority.
    pub fn new(
        id: u64,
        patient_id: u64,
        patient_name: String,
        attendance_type: AttendanceType,
        scheduled_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            patient_id,
            patient_name,
            attendance_type,
            priority: Priority::default(),
            is_first_attendance: false,
            progression: Progression::Scheduled,
            scheduled_date,
            checked_in_time: None,
            on_going_time: None,
            completed_time: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn first_attendance(mut self, is_first: bool) -> Self {
        self.is_first_attendance = is_first;
        self
    }

    /// Timestamp recorded when the attendance reached `state`.
    pub fn timestamp_for(&self, state: Progression) -> Option<DateTime<Utc>> {
        match state {
            Progression::Scheduled => None,
            Progression::CheckedIn => self.checked_in_time,
            Progression::OnGoing => self.on_going_time,
            Progression::Completed => self.completed_time,
        }
    }

    fn timestamp_slot(&mut self, state: Progression) -> Option<&mut Option<DateTime<Utc>>> {
        match state {
            Progression::Scheduled => None,
            Progression::CheckedIn => Some(&mut self.checked_in_time),
            Progression::OnGoing => Some(&mut self.on_going_time),
            Progression::Completed => Some(&mut self.completed_time),
        }
    }

    /// Record the time the attendance reached `state`.
    ///
    /// Never moves a timestamp backwards past the previous state's time.
    pub fn set_timestamp(&mut self, state: Progression, at: DateTime<Utc>) {
        let floor = state.previous().and_then(|p| self.timestamp_for(p));
        let at = match floor {
            Some(floor) if floor > at => floor,
            _ => at,
        };
        if let Some(slot) = self.timestamp_slot(state) {
            *slot = Some(at);
        }
    }

    /// Clear the timestamp of `state` (explicit undo of that step).
    pub fn clear_timestamp(&mut self, state: Progression) {
        if let Some(slot) = self.timestamp_slot(state) {
            *slot = None;
        }
    }

    /// Check that set timestamps are ordered `checkedIn ≤ onGoing ≤ completed`.
    pub fn timestamps_monotonic(&self) -> bool {
        let set: Vec<DateTime<Utc>> = [self.checked_in_time, self.on_going_time, self.completed_time]
            .into_iter()
            .flatten()
            .collect();
        set.windows(2).all(|w| w[0] <= w[1])
    }

    /// A scheduled attendance whose day passed without check-in.
    pub fn is_absent_on(&self, today: NaiveDate) -> bool {
        self.progression == Progression::Scheduled && self.scheduled_date < today
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| ModelError::InvalidDate(s.to_string()))
}
