//! Modal routing policy.
//!
//! Decides which follow-up modal must be resolved before a move to
//! `completed` is committed:
//!
//! | attendance type | modal            |
//! |-----------------|------------------|
//! | `spiritual`     | `postAttendance` |
//! | `lightBath`     | `postTreatment`  |
//! | `rod`           | `postTreatment`  |
//! | anything else   | none             |
//!
//! Missed attendances are routed to `absenceJustification` one patient at a time.

use chrono::NaiveDate;

use crate::board::Board;
use crate::models::{Attendance, AttendanceType, ModalKind, Priority};
use crate::store::{PostAttendancePayload, PostTreatmentPayload};

/// Modal required to complete an attendance of the given type.
///
/// `is_first_attendance` and `priority` do not change the kind of modal; they
/// only shape the payload (see [`completion_route`]).
pub fn route_modal(
    attendance_type: AttendanceType,
    _is_first_attendance: bool,
    _priority: Priority,
) -> ModalKind {
    match attendance_type {
        AttendanceType::Spiritual => ModalKind::PostAttendance,
        AttendanceType::LightBath | AttendanceType::Rod => ModalKind::PostTreatment,
    }
}

/// Route by the wire spelling of the attendance type.
///
/// Unknown types get no modal, matching the last row of the table.
pub fn route_modal_by_name(
    attendance_type: &str,
    is_first_attendance: bool,
    priority: Priority,
) -> Option<ModalKind> {
    match attendance_type.parse::<AttendanceType>() {
        Ok(t) => Some(route_modal(t, is_first_attendance, priority)),
        Err(_) => {
            tracing::warn!(attendance_type, "no completion modal for unknown attendance type");
            None
        }
    }
}

/// Modal to open for a completion, with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionRoute {
    PostAttendance(PostAttendancePayload),
    PostTreatment(PostTreatmentPayload),
}

impl CompletionRoute {
    pub fn kind(&self) -> ModalKind {
        match self {
            Self::PostAttendance(_) => ModalKind::PostAttendance,
            Self::PostTreatment(_) => ModalKind::PostTreatment,
        }
    }
}

/// Build the completion modal request for an attendance.
pub fn completion_route(attendance: &Attendance) -> CompletionRoute {
    match route_modal(
        attendance.attendance_type,
        attendance.is_first_attendance,
        attendance.priority,
    ) {
        ModalKind::PostAttendance => CompletionRoute::PostAttendance(PostAttendancePayload {
            attendance_id: attendance.id,
            patient_id: attendance.patient_id,
            patient_name: attendance.patient_name.clone(),
            is_first_attendance: attendance.is_first_attendance,
            priority: attendance.priority,
        }),
        _ => CompletionRoute::PostTreatment(PostTreatmentPayload {
            attendance_id: attendance.id,
            patient_id: attendance.patient_id,
            patient_name: attendance.patient_name.clone(),
            attendance_type: attendance.attendance_type,
        }),
    }
}

/// Scheduled attendances whose day passed without check-in, in board order.
pub fn absences(board: &Board, today: NaiveDate) -> Vec<Attendance> {
    board
        .iter()
        .filter(|a| a.is_absent_on(today))
        .cloned()
        .collect()
}
