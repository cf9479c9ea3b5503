//! End-of-day summary.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use super::Engine;
use crate::models::{AttendanceType, Progression};
use crate::store::EndOfDayPayload;

impl Engine {
    /// Summarize the board for `date`.
    pub fn end_of_day_summary(&self, date: NaiveDate) -> EndOfDayPayload {
        let mut completed: BTreeMap<AttendanceType, usize> =
            AttendanceType::ALL.into_iter().map(|t| (t, 0)).collect();
        let mut in_progress = 0;
        let mut absences = 0;

        for attendance in self.board().iter() {
            match attendance.progression {
                Progression::Completed if !self.is_pending(attendance.id) => {
                    *completed.entry(attendance.attendance_type).or_default() += 1;
                }
                Progression::Completed => {}
                Progression::CheckedIn | Progression::OnGoing => in_progress += 1,
                Progression::Scheduled if attendance.scheduled_date <= date => absences += 1,
                Progression::Scheduled => {}
            }
        }

        EndOfDayPayload {
            date,
            completed,
            in_progress,
            absences,
            pending_completions: self.pending.len(),
        }
    }

    /// Open the end-of-day modal.
    pub fn open_end_of_day(&mut self, date: NaiveDate) -> Uuid {
        let payload = self.end_of_day_summary(date);
        self.modals.open_end_of_day(payload, None)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{DragRequest, Engine};
    use crate::models::{Attendance, AttendanceType, ModalKind, Progression};
    use chrono::NaiveDate;

    #[test]
    fn test_summary_counts() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        let mut engine = Engine::new();
        for (id, t) in [
            (1, AttendanceType::Spiritual),
            (2, AttendanceType::Rod),
            (3, AttendanceType::Rod),
            (4, AttendanceType::LightBath),
        ] {
            engine
                .schedule(Attendance::new(id, id, format!("P{}", id), t, today))
                .unwrap();
        }

        for id in [2, 3] {
            for to in [Progression::CheckedIn, Progression::OnGoing, Progression::Completed] {
                let attendance = engine.board().get(id).unwrap().clone();
                engine.drag(&DragRequest::for_attendance(&attendance, to)).unwrap();
            }
            if id == 2 {
                engine.complete_modal(ModalKind::PostTreatment, true);
            }
        }
        let attendance = engine.board().get(4).unwrap().clone();
        engine
            .drag(&DragRequest::for_attendance(&attendance, Progression::CheckedIn))
            .unwrap();

        let summary = engine.end_of_day_summary(today);
        assert_eq!(summary.completed[&AttendanceType::Rod], 1);
        assert_eq!(summary.completed[&AttendanceType::Spiritual], 0);
        assert_eq!(summary.pending_completions, 1);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.absences, 1);

        engine.open_end_of_day(today);
        assert!(engine.modals().is_open(ModalKind::EndOfDay));
        assert!(engine.modals().is_open(ModalKind::PostTreatment));
    }
}
