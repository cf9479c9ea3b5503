//! Modal kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ModelError;

/// Every modal the board can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModalKind {
    /// Treatment-recommendation form after a spiritual consultation
    PostAttendance,
    /// Session-tracking form after light bath or rod
    PostTreatment,
    /// Justification of a missed attendance
    AbsenceJustification,
    /// Cancellation confirmation
    Cancellation,
    /// Check-in to several attendance types at once
    MultiSection,
    /// First-attendance check-in form
    NewPatientCheckIn,
    /// End-of-day summary
    EndOfDay,
}

impl ModalKind {
    pub const ALL: [ModalKind; 7] = [
        Self::PostAttendance,
        Self::PostTreatment,
        Self::AbsenceJustification,
        Self::Cancellation,
        Self::MultiSection,
        Self::NewPatientCheckIn,
        Self::EndOfDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostAttendance => "postAttendance",
            Self::PostTreatment => "postTreatment",
            Self::AbsenceJustification => "absenceJustification",
            Self::Cancellation => "cancellation",
            Self::MultiSection => "multiSection",
            Self::NewPatientCheckIn => "newPatientCheckIn",
            Self::EndOfDay => "endOfDay",
        }
    }
}

impl fmt::Display for ModalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModalKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ModelError::UnknownModalKind(s.to_string()))
    }
}
