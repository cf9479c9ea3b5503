//! Absence review: one missed attendance at a time, or skip them all.

use std::collections::VecDeque;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{Engine, EngineError, EngineResult, ModalSignal, Resolution};
use crate::board::Board;
use crate::models::{AbsenceRecord, Attendance, ModalKind};
use crate::routing;
use crate::store::{AbsenceJustificationPayload, CompletionCallback};

#[derive(Debug)]
pub(crate) struct AbsenceReview {
    id: Uuid,
    today: NaiveDate,
    queue: VecDeque<Attendance>,
    recorded: Vec<AbsenceRecord>,
}

impl AbsenceReview {
    fn current_payload(&self) -> Option<AbsenceJustificationPayload> {
        self.queue
            .front()
            .map(|attendance| payload_for(attendance, self.queue.len()))
    }

    pub(crate) fn forget(&mut self, attendance_id: u64) {
        self.queue.retain(|a| a.id != attendance_id);
    }
}

/// Where an absence review stands after an answer.
#[derive(Debug, Clone, PartialEq)]
pub enum AbsenceProgress {
    /// Next absence to review
    Next(AbsenceJustificationPayload),
    /// Every absence answered; the modal is closed
    Finished(Vec<AbsenceRecord>),
}

fn payload_for(attendance: &Attendance, remaining: usize) -> AbsenceJustificationPayload {
    AbsenceJustificationPayload {
        attendance_id: attendance.id,
        patient_id: attendance.patient_id,
        patient_name: attendance.patient_name.clone(),
        attendance_type: attendance.attendance_type,
        scheduled_date: attendance.scheduled_date,
        remaining,
    }
}

fn still_absent(board: &Board, attendance_id: u64, today: NaiveDate) -> bool {
    board
        .get(attendance_id)
        .is_some_and(|a| a.is_absent_on(today))
}

impl Engine {
    /// Open the absence modal for every scheduled attendance from before `today`.
    ///
    /// Returns `None` when nobody is absent. If a review is already running its
    /// current absence is returned unchanged.
    pub fn begin_absence_review(
        &mut self,
        today: NaiveDate,
    ) -> EngineResult<Option<AbsenceJustificationPayload>> {
        if let Some(review) = &self.absence_review {
            return Ok(review.current_payload());
        }

        let missed = routing::absences(self.board(), today);
        let Some(first) = missed.first() else {
            return Ok(None);
        };
        let payload = payload_for(first, missed.len());

        let review_id = Uuid::new_v4();
        self.absence_review = Some(AbsenceReview {
            id: review_id,
            today,
            queue: missed.into(),
            recorded: Vec::new(),
        });

        let tx = self.signals_tx.clone();
        let callback = CompletionCallback::new(move |_| {
            let _ = tx.send(ModalSignal::AbsenceReviewEnded { review_id });
        });
        self.modals
            .open_absence_justification(payload.clone(), Some(callback));

        tracing::debug!(absences = payload.remaining, %today, "absence review started");
        Ok(Some(payload))
    }

    /// Drop queued absences that are no longer scheduled on the board.
    pub(super) fn refresh_absence_review(&mut self) {
        let Some(review) = self.absence_review.as_mut() else {
            return;
        };
        let board = self.board.get_state();
        let today = review.today;
        let before = review.queue.len();
        review.queue.retain(|a| still_absent(board, a.id, today));
        if review.queue.len() == before {
            return;
        }

        tracing::debug!(dropped = before - review.queue.len(), "absence queue refreshed");
        if let Some(payload) = review.current_payload() {
            self.modals.update_absence_justification(payload);
        }
    }

    /// Build the record answering the absence currently shown, without applying it.
    ///
    /// Returns `None` when nothing is left to answer.
    pub fn prepare_absence_answer(
        &mut self,
        justified: bool,
        notes: Option<String>,
    ) -> EngineResult<Option<AbsenceRecord>> {
        self.refresh_absence_review();
        let review = self
            .absence_review
            .as_ref()
            .ok_or(EngineError::NoAbsenceReview)?;
        Ok(review
            .queue
            .front()
            .map(|attendance| AbsenceRecord::from_attendance(attendance, justified, notes)))
    }

    /// Build unjustified records for every absence still queued, without applying them.
    pub fn prepare_skip_all(&mut self) -> EngineResult<Vec<AbsenceRecord>> {
        self.refresh_absence_review();
        let review = self
            .absence_review
            .as_ref()
            .ok_or(EngineError::NoAbsenceReview)?;
        Ok(review
            .queue
            .iter()
            .map(|attendance| AbsenceRecord::from_attendance(attendance, false, None))
            .collect())
    }

    /// Apply prepared absence records: take the attendances off the board and advance.
    ///
    /// Every record must name a queued absence, otherwise nothing changes.
    pub fn apply_absence_records(
        &mut self,
        records: Vec<AbsenceRecord>,
    ) -> EngineResult<AbsenceProgress> {
        let review = self
            .absence_review
            .as_mut()
            .ok_or(EngineError::NoAbsenceReview)?;
        if let Some(stray) = records
            .iter()
            .find(|r| !review.queue.iter().any(|a| a.id == r.attendance_id))
        {
            return Err(EngineError::UnknownAttendance(stray.attendance_id));
        }

        let ids: Vec<u64> = records.iter().map(|r| r.attendance_id).collect();
        review.queue.retain(|a| !ids.contains(&a.id));
        review.recorded.extend(records);
        let next = review.current_payload();

        if !ids.is_empty() {
            self.board.set_state(|board| {
                for id in &ids {
                    board.remove_attendance(*id);
                }
            });
            tracing::debug!(recorded = ids.len(), "absences recorded");
        }

        match next {
            Some(payload) => {
                self.modals.update_absence_justification(payload.clone());
                Ok(AbsenceProgress::Next(payload))
            }
            None => Ok(AbsenceProgress::Finished(self.finish_absence_review())),
        }
    }

    /// Answer the absence currently shown and move to the next one.
    pub fn justify_current(
        &mut self,
        justified: bool,
        notes: Option<String>,
    ) -> EngineResult<AbsenceProgress> {
        let records = self
            .prepare_absence_answer(justified, notes)?
            .into_iter()
            .collect();
        self.apply_absence_records(records)
    }

    /// Mark every remaining absence unjustified in one action.
    ///
    /// Returns every record of the review, earlier answers included.
    pub fn skip_all(&mut self) -> EngineResult<Vec<AbsenceRecord>> {
        let records = self.prepare_skip_all()?;
        match self.apply_absence_records(records)? {
            AbsenceProgress::Finished(recorded) => Ok(recorded),
            AbsenceProgress::Next(_) => Ok(self.finish_absence_review()),
        }
    }

    pub fn absence_review_active(&self) -> bool {
        self.absence_review.is_some()
    }

    fn finish_absence_review(&mut self) -> Vec<AbsenceRecord> {
        let recorded = self
            .absence_review
            .take()
            .map(|review| review.recorded)
            .unwrap_or_default();
        self.modals
            .complete_modal(ModalKind::AbsenceJustification, true);
        recorded
    }

    /// Handle the absence modal closing. Only the review that opened it is ended.
    pub(super) fn end_absence_review(&mut self, review_id: Uuid) -> Option<Resolution> {
        if self.absence_review.as_ref().map(|r| r.id) != Some(review_id) {
            return None;
        }
        let review = self.absence_review.take()?;
        tracing::debug!(remaining = review.queue.len(), "absence review closed early");
        Some(Resolution::AbsenceReviewClosed {
            recorded: review.recorded,
            remaining: review.queue.len(),
        })
    }
}
