//! Absence models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Attendance, AttendanceType};

/// Outcome of reviewing one missed attendance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceRecord {
    pub attendance_id: u64,
    pub patient_id: u64,
    pub patient_name: String,
    #[serde(rename = "type")]
    pub attendance_type: AttendanceType,
    pub scheduled_date: NaiveDate,
    /// Whether staff accepted a justification for the absence
    pub justified: bool,
    /// Justification notes
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AbsenceRecord {
    /// Record an absence for a missed attendance.
    pub fn from_attendance(attendance: &Attendance, justified: bool, notes: Option<String>) -> Self {
        Self {
            attendance_id: attendance.id,
            patient_id: attendance.patient_id,
            patient_name: attendance.patient_name.clone(),
            attendance_type: attendance.attendance_type,
            scheduled_date: attendance.scheduled_date,
            justified,
            // Unjustified absences carry no notes
            notes: if justified { notes } else { None },
            recorded_at: Utc::now(),
        }
    }
}
