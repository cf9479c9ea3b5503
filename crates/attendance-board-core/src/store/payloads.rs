//! Payloads carried by each modal kind.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceType, Priority};

/// Treatment-recommendation form after a spiritual consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAttendancePayload {
    pub attendance_id: u64,
    pub patient_id: u64,
    pub patient_name: String,
    /// Alters the form defaults for a first consultation
    pub is_first_attendance: bool,
    pub priority: Priority,
}

/// Session-tracking form after a light bath or rod treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTreatmentPayload {
    pub attendance_id: u64,
    pub patient_id: u64,
    pub patient_name: String,
    pub attendance_type: AttendanceType,
}

/// The absence currently under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceJustificationPayload {
    pub attendance_id: u64,
    pub patient_id: u64,
    pub patient_name: String,
    pub attendance_type: AttendanceType,
    pub scheduled_date: NaiveDate,
    /// Absences left to review, this one included
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationPayload {
    pub attendance_id: u64,
    pub patient_name: String,
    pub attendance_type: AttendanceType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSectionPayload {
    pub patient_id: u64,
    pub patient_name: String,
    pub attendance_types: Vec<AttendanceType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatientCheckInPayload {
    pub attendance_id: u64,
    pub patient_id: u64,
    pub patient_name: String,
}

/// Summary shown when closing the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOfDayPayload {
    pub date: NaiveDate,
    /// Completed attendances per type
    pub completed: BTreeMap<AttendanceType, usize>,
    /// Checked in or ongoing, not yet completed
    pub in_progress: usize,
    /// Still scheduled (will become absences)
    pub absences: usize,
    /// Completions waiting on their follow-up modal
    pub pending_completions: usize,
}
