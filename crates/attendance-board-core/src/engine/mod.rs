//! Drag-and-drop transition engine.
//!
//! Turns a drag gesture into a validated board mutation. Moves follow the
//! canonical order `scheduled → checkedIn → onGoing → completed` one step at a
//! time; the only backward move is a single-step undo. A move to `completed`
//! is applied provisionally and waits on the follow-up modal chosen by
//! [`crate::routing`]: submitting it stamps `completedTime`, cancelling it puts
//! the attendance back exactly where it was.

mod absence;
mod summary;

pub use absence::*;

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::board::{Board, BoardError, Location};
use crate::models::{AbsenceRecord, Attendance, AttendanceType, ModalKind, Priority, Progression};
use crate::routing::{self, CompletionRoute};
use crate::state::{StateContainer, SubscriptionId};
use crate::store::{CancellationPayload, CompletionCallback, ModalStore};

/// Engine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: Progression, to: Progression },

    #[error("Attendance {id} not found in {attendance_type}/{state}")]
    AttendanceNotFound {
        id: u64,
        attendance_type: AttendanceType,
        state: Progression,
    },

    #[error("Attendance {0} is not on the board")]
    UnknownAttendance(u64),

    #[error("Attendance {0} is waiting on its completion modal")]
    AttendancePending(u64),

    #[error("No absence review in progress")]
    NoAbsenceReview,

    #[error("Board error: {0}")]
    Board(#[from] BoardError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// A drag gesture as reported by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragRequest {
    pub attendance_id: u64,
    pub attendance_type: AttendanceType,
    pub patient_name: String,
    pub patient_id: u64,
    pub source_state: Progression,
    pub target_state: Progression,
    pub is_first_attendance: bool,
    pub priority: Priority,
    /// Drop position in the target bucket; `None` appends
    pub target_index: Option<usize>,
}

impl DragRequest {
    /// Drag an attendance from its current state to `target_state`, appending.
    pub fn for_attendance(attendance: &Attendance, target_state: Progression) -> Self {
        Self {
            attendance_id: attendance.id,
            attendance_type: attendance.attendance_type,
            patient_name: attendance.patient_name.clone(),
            patient_id: attendance.patient_id,
            source_state: attendance.progression,
            target_state,
            is_first_attendance: attendance.is_first_attendance,
            priority: attendance.priority,
            target_index: None,
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.target_index = Some(index);
        self
    }
}

/// A patient registered at the front desk without an agenda entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkIn {
    pub attendance_id: u64,
    pub patient_id: u64,
    pub patient_name: String,
    pub attendance_type: AttendanceType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_first_attendance: bool,
}

/// A committed state change, with enough to undo it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub attendance_id: u64,
    pub attendance_type: AttendanceType,
    pub from: Progression,
    pub to: Progression,
    pub from_index: usize,
    pub to_index: usize,
    pub committed_at: DateTime<Utc>,
    /// The attendance as it was before the move
    pub previous: Attendance,
}

/// Result of a drag.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Applied and committed
    Committed(TransitionRecord),
    /// Same-state drop, only the position changed
    Reordered(Location),
    /// Provisionally in `completed`, waiting on `modal`
    PendingConfirmation {
        attendance_id: u64,
        modal: ModalKind,
        request_id: Uuid,
        /// Earlier completions this drag displaced from the modal, now rolled back
        superseded: Vec<Resolution>,
    },
}

/// What happened when a modal interaction ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Completion confirmed and committed
    Finalized(TransitionRecord),
    /// Completion cancelled, attendance back at its original position
    RolledBack {
        attendance_id: u64,
        location: Location,
    },
    /// Removed through the cancellation modal
    Cancelled(Attendance),
    /// Cancellation modal dismissed, attendance kept
    CancellationDismissed { attendance_id: u64 },
    /// The attendance left the board before the modal resolved
    Stale { attendance_id: u64 },
    /// Absence review closed before every absence was answered
    AbsenceReviewClosed {
        recorded: Vec<AbsenceRecord>,
        remaining: usize,
    },
}

#[derive(Debug)]
enum ModalSignal {
    Completion {
        attendance_id: u64,
        ticket: Uuid,
        success: bool,
    },
    Cancellation {
        attendance_id: u64,
        success: bool,
    },
    AbsenceReviewEnded {
        review_id: Uuid,
    },
}

#[derive(Debug)]
struct PendingMove {
    ticket: Uuid,
    source_index: usize,
    previous: Attendance,
    modal: ModalKind,
}

/// Owns the board, the modal store and in-flight completions.
#[derive(Debug)]
pub struct Engine {
    board: StateContainer<Board>,
    modals: ModalStore,
    pending: HashMap<u64, PendingMove>,
    absence_review: Option<AbsenceReview>,
    allow_step_back: bool,
    signals_tx: Sender<ModalSignal>,
    signals_rx: Receiver<ModalSignal>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine over an empty board.
    pub fn new() -> Self {
        Self::with_board(Board::new())
    }

    /// Create an engine over an existing board.
    pub fn with_board(board: Board) -> Self {
        let (signals_tx, signals_rx) = mpsc::channel();
        Self {
            board: StateContainer::new(board),
            modals: ModalStore::new(),
            pending: HashMap::new(),
            absence_review: None,
            allow_step_back: true,
            signals_tx,
            signals_rx,
        }
    }

    /// Enable or disable the single-step undo drag.
    pub fn allow_step_back(mut self, allow: bool) -> Self {
        self.allow_step_back = allow;
        self
    }

    pub fn board(&self) -> &Board {
        self.board.get_state()
    }

    pub fn modals(&self) -> &ModalStore {
        &self.modals
    }

    /// Direct access for modals the engine does not drive.
    pub fn modals_mut(&mut self) -> &mut ModalStore {
        &mut self.modals
    }

    pub fn subscribe_board<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&Board) + Send + 'static,
    {
        self.board.subscribe(listener)
    }

    pub fn unsubscribe_board(&mut self, id: SubscriptionId) -> bool {
        self.board.unsubscribe(id)
    }

    /// Attendances waiting on a completion modal, by ID.
    pub fn pending(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.pending.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_pending(&self, attendance_id: u64) -> bool {
        self.pending.contains_key(&attendance_id)
    }

    /// Add an attendance to the `scheduled` bucket of its type.
    pub fn schedule(&mut self, mut attendance: Attendance) -> EngineResult<Location> {
        attendance.progression = Progression::Scheduled;
        for state in Progression::ORDER {
            attendance.clear_timestamp(state);
        }
        let id = attendance.id;
        let location = self.board.try_set_state(|board| board.insert(attendance))?;
        tracing::debug!(attendance_id = id, "attendance scheduled");
        Ok(location)
    }

    /// Schedule a walk-in for `date`.
    pub fn register_walk_in(&mut self, walk_in: WalkIn, date: NaiveDate) -> EngineResult<Location> {
        let attendance = Attendance::new(
            walk_in.attendance_id,
            walk_in.patient_id,
            walk_in.patient_name,
            walk_in.attendance_type,
            date,
        )
        .with_priority(walk_in.priority)
        .first_attendance(walk_in.is_first_attendance);
        self.schedule(attendance)
    }

    /// Schedule a walk-in for today.
    pub fn register_walk_in_today(&mut self, walk_in: WalkIn) -> EngineResult<Location> {
        self.register_walk_in(walk_in, Local::now().date_naive())
    }

    /// Check a move against the canonical order.
    pub fn check_transition(&self, from: Progression, to: Progression) -> EngineResult<()> {
        let forward = from.next() == Some(to);
        let step_back = self.allow_step_back && from.previous() == Some(to);
        if forward || step_back {
            Ok(())
        } else {
            Err(EngineError::InvalidTransition { from, to })
        }
    }

    /// Apply a drag gesture.
    ///
    /// On error the board is unchanged.
    pub fn drag(&mut self, request: &DragRequest) -> EngineResult<DragOutcome> {
        let id = request.attendance_id;
        let (from, to) = (request.source_state, request.target_state);

        let location = self
            .board()
            .find(id)
            .filter(|loc| {
                loc.attendance_type == request.attendance_type && loc.progression == from
            })
            .ok_or(EngineError::AttendanceNotFound {
                id,
                attendance_type: request.attendance_type,
                state: from,
            })?;

        if self.pending.contains_key(&id) {
            return Err(EngineError::AttendancePending(id));
        }

        let target_index = request.target_index.unwrap_or(usize::MAX);

        if from == to {
            let location = self
                .board
                .try_set_state(|board| board.move_attendance(id, from, to, target_index))?;
            return Ok(DragOutcome::Reordered(location));
        }

        if let Err(e) = self.check_transition(from, to) {
            tracing::debug!(attendance_id = id, %from, %to, "transition rejected");
            return Err(e);
        }

        let previous = self
            .board()
            .get(id)
            .cloned()
            .ok_or(EngineError::UnknownAttendance(id))?;

        if to == Progression::Completed {
            return self.begin_completion(previous, location, target_index);
        }

        let now = Utc::now();
        let forward = to > from;
        let to_location = self.board.try_set_state(|board| {
            let moved = board.move_attendance(id, from, to, target_index)?;
            if let Some(attendance) = board.get_mut(id) {
                if forward {
                    attendance.set_timestamp(to, now);
                } else {
                    attendance.clear_timestamp(from);
                }
            }
            Ok::<_, BoardError>(moved)
        })?;

        tracing::debug!(attendance_id = id, %from, %to, "transition committed");
        if from == Progression::Scheduled {
            self.refresh_absence_review();
        }
        Ok(DragOutcome::Committed(TransitionRecord {
            attendance_id: id,
            attendance_type: location.attendance_type,
            from,
            to,
            from_index: location.index,
            to_index: to_location.index,
            committed_at: now,
            previous,
        }))
    }

    fn begin_completion(
        &mut self,
        previous: Attendance,
        location: Location,
        target_index: usize,
    ) -> EngineResult<DragOutcome> {
        let id = previous.id;
        let route = routing::completion_route(&previous);
        let modal = route.kind();

        self.board.try_set_state(|board| {
            board.move_attendance(id, location.progression, Progression::Completed, target_index)
        })?;

        let ticket = Uuid::new_v4();
        self.pending.insert(
            id,
            PendingMove {
                ticket,
                source_index: location.index,
                previous,
                modal,
            },
        );

        let tx = self.signals_tx.clone();
        let callback = CompletionCallback::new(move |success| {
            let _ = tx.send(ModalSignal::Completion {
                attendance_id: id,
                ticket,
                success,
            });
        });
        let request_id = match route {
            CompletionRoute::PostAttendance(payload) => {
                self.modals.open_post_attendance(payload, Some(callback))
            }
            CompletionRoute::PostTreatment(payload) => {
                self.modals.open_post_treatment(payload, Some(callback))
            }
        };

        // Re-opening the modal kind cancels whichever completion held it.
        let superseded = self.process_signals();

        tracing::debug!(attendance_id = id, %modal, "completion pending confirmation");
        Ok(DragOutcome::PendingConfirmation {
            attendance_id: id,
            modal,
            request_id,
            superseded,
        })
    }

    /// Submit a modal with the given outcome and apply the consequences.
    pub fn complete_modal(&mut self, kind: ModalKind, success: bool) -> Vec<Resolution> {
        self.modals.complete_modal(kind, success);
        self.process_signals()
    }

    /// Close a modal without submitting. Pending completions roll back.
    pub fn close_modal(&mut self, kind: ModalKind) -> Vec<Resolution> {
        self.modals.close_modal(kind);
        self.process_signals()
    }

    /// Apply every modal outcome reported since the last call.
    pub fn process_signals(&mut self) -> Vec<Resolution> {
        let signals: Vec<ModalSignal> = self.signals_rx.try_iter().collect();
        signals
            .into_iter()
            .filter_map(|signal| self.apply_signal(signal))
            .collect()
    }

    fn apply_signal(&mut self, signal: ModalSignal) -> Option<Resolution> {
        match signal {
            ModalSignal::Completion {
                attendance_id,
                ticket,
                success,
            } => {
                let current = self.pending.get(&attendance_id).map(|p| p.ticket);
                if current != Some(ticket) {
                    return Some(Resolution::Stale { attendance_id });
                }
                let pending = self.pending.remove(&attendance_id)?;
                Some(if success {
                    self.finalize(attendance_id, pending)
                } else {
                    self.roll_back(attendance_id, pending)
                })
            }
            ModalSignal::Cancellation {
                attendance_id,
                success: true,
            } => Some(match self.remove_attendance(attendance_id) {
                Some(attendance) => Resolution::Cancelled(attendance),
                None => Resolution::Stale { attendance_id },
            }),
            ModalSignal::Cancellation { attendance_id, .. } => {
                Some(Resolution::CancellationDismissed { attendance_id })
            }
            ModalSignal::AbsenceReviewEnded { review_id } => self.end_absence_review(review_id),
        }
    }

    fn finalize(&mut self, id: u64, pending: PendingMove) -> Resolution {
        let now = Utc::now();
        let finalized = self.board.try_set_state(|board| {
            let location = board
                .find(id)
                .filter(|loc| loc.progression == Progression::Completed)
                .ok_or(())?;
            if let Some(attendance) = board.get_mut(id) {
                attendance.set_timestamp(Progression::Completed, now);
            }
            Ok::<_, ()>(location)
        });

        match finalized {
            Ok(location) => {
                tracing::debug!(attendance_id = id, modal = %pending.modal, "completion committed");
                Resolution::Finalized(TransitionRecord {
                    attendance_id: id,
                    attendance_type: location.attendance_type,
                    from: pending.previous.progression,
                    to: Progression::Completed,
                    from_index: pending.source_index,
                    to_index: location.index,
                    committed_at: now,
                    previous: pending.previous,
                })
            }
            Err(()) => Resolution::Stale { attendance_id: id },
        }
    }

    fn roll_back(&mut self, id: u64, pending: PendingMove) -> Resolution {
        let PendingMove {
            source_index,
            previous,
            modal,
            ..
        } = pending;
        let restored = self.board.try_set_state(|board| {
            board.remove_attendance(id).ok_or(())?;
            board.insert_at(previous, source_index).map_err(|_| ())
        });

        match restored {
            Ok(location) => {
                tracing::debug!(attendance_id = id, %modal, "completion rolled back");
                Resolution::RolledBack {
                    attendance_id: id,
                    location,
                }
            }
            Err(()) => Resolution::Stale { attendance_id: id },
        }
    }

    /// Undo a committed transition, e.g. after the persistence layer rejected it.
    pub fn revert(&mut self, record: &TransitionRecord) -> EngineResult<Location> {
        let id = record.attendance_id;
        let in_place = self.board().find(id).is_some_and(|loc| {
            loc.attendance_type == record.attendance_type && loc.progression == record.to
        });
        if !in_place {
            return Err(EngineError::AttendanceNotFound {
                id,
                attendance_type: record.attendance_type,
                state: record.to,
            });
        }

        self.pending.remove(&id);
        let previous = record.previous.clone();
        let location = self.board.try_set_state(|board| {
            board.remove_attendance(id);
            board.insert_at(previous, record.from_index)
        })?;
        tracing::debug!(attendance_id = id, from = %record.to, to = %record.from, "transition reverted");
        Ok(location)
    }

    /// Remove an attendance from the board. Absent IDs are a no-op.
    pub fn remove_attendance(&mut self, attendance_id: u64) -> Option<Attendance> {
        self.pending.remove(&attendance_id);
        if let Some(review) = self.absence_review.as_mut() {
            review.forget(attendance_id);
        }
        if !self.board().contains(attendance_id) {
            return None;
        }
        let removed = self
            .board
            .set_state(|board| board.remove_attendance(attendance_id));
        tracing::debug!(attendance_id, "attendance removed");
        removed
    }

    /// Ask for confirmation before cancelling an attendance.
    pub fn request_cancellation(&mut self, attendance_id: u64) -> EngineResult<Uuid> {
        let attendance = self
            .board()
            .get(attendance_id)
            .cloned()
            .ok_or(EngineError::UnknownAttendance(attendance_id))?;
        if self.pending.contains_key(&attendance_id) {
            return Err(EngineError::AttendancePending(attendance_id));
        }

        let tx = self.signals_tx.clone();
        let callback = CompletionCallback::new(move |success| {
            let _ = tx.send(ModalSignal::Cancellation {
                attendance_id,
                success,
            });
        });
        let request_id = self.modals.open_cancellation(
            CancellationPayload {
                attendance_id,
                patient_name: attendance.patient_name,
                attendance_type: attendance.attendance_type,
            },
            Some(callback),
        );
        Ok(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    }

    fn spiritual(id: u64) -> Attendance {
        Attendance::new(id, id + 1000, format!("Patient {}", id), AttendanceType::Spiritual, day())
    }

    fn engine_with(attendances: Vec<Attendance>) -> Engine {
        let mut engine = Engine::new();
        for attendance in attendances {
            engine.schedule(attendance).unwrap();
        }
        engine
    }

    fn advance(engine: &mut Engine, id: u64, to: Progression) -> DragOutcome {
        let attendance = engine.board().get(id).unwrap().clone();
        engine.drag(&DragRequest::for_attendance(&attendance, to)).unwrap()
    }

    #[test]
    fn test_forward_step_sets_timestamp() {
        let mut engine = engine_with(vec![spiritual(1)]);
        let outcome = advance(&mut engine, 1, Progression::CheckedIn);

        let record = match outcome {
            DragOutcome::Committed(record) => record,
            other => panic!("unexpected outcome: {:?}", other),
        };
        let attendance = engine.board().get(1).unwrap();
        assert_eq!(attendance.progression, Progression::CheckedIn);
        assert_eq!(attendance.checked_in_time, Some(record.committed_at));
        assert_eq!(record.previous.progression, Progression::Scheduled);
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        let mut engine = engine_with(vec![spiritual(1)]);
        let before = engine.board().clone();
        let attendance = engine.board().get(1).unwrap().clone();

        let result = engine.drag(&DragRequest::for_attendance(&attendance, Progression::Completed));
        assert_eq!(
            result,
            Err(EngineError::InvalidTransition {
                from: Progression::Scheduled,
                to: Progression::Completed
            })
        );
        assert_eq!(*engine.board(), before);
        assert!(!engine.modals().is_open(ModalKind::PostAttendance));
    }

    #[test]
    fn test_step_back_clears_timestamp() {
        let mut engine = engine_with(vec![spiritual(1)]);
        advance(&mut engine, 1, Progression::CheckedIn);
        advance(&mut engine, 1, Progression::OnGoing);
        advance(&mut engine, 1, Progression::CheckedIn);

        let attendance = engine.board().get(1).unwrap();
        assert_eq!(attendance.progression, Progression::CheckedIn);
        assert!(attendance.checked_in_time.is_some());
        assert!(attendance.on_going_time.is_none());
    }

    #[test]
    fn test_step_back_can_be_disabled() {
        let mut engine = Engine::new().allow_step_back(false);
        engine.schedule(spiritual(1)).unwrap();
        advance(&mut engine, 1, Progression::CheckedIn);

        let attendance = engine.board().get(1).unwrap().clone();
        let result = engine.drag(&DragRequest::for_attendance(&attendance, Progression::Scheduled));
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));
    }

    #[test]
    fn test_wrong_source_state_is_not_found() {
        let mut engine = engine_with(vec![spiritual(1)]);
        let mut request = DragRequest::for_attendance(engine.board().get(1).unwrap(), Progression::OnGoing);
        request.source_state = Progression::CheckedIn;

        assert!(matches!(
            engine.drag(&request),
            Err(EngineError::AttendanceNotFound { id: 1, .. })
        ));
    }

    #[test]
    fn test_same_state_drop_reorders() {
        let mut engine = engine_with(vec![spiritual(1), spiritual(2), spiritual(3)]);
        let attendance = engine.board().get(3).unwrap().clone();
        let outcome = engine
            .drag(&DragRequest::for_attendance(&attendance, Progression::Scheduled).at_index(0))
            .unwrap();

        assert!(matches!(outcome, DragOutcome::Reordered(loc) if loc.index == 0));
        let ids: Vec<u64> = engine
            .board()
            .bucket(AttendanceType::Spiritual, Progression::Scheduled)
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_pending_attendance_cannot_be_dragged() {
        let mut engine = engine_with(vec![spiritual(1)]);
        advance(&mut engine, 1, Progression::CheckedIn);
        advance(&mut engine, 1, Progression::OnGoing);
        advance(&mut engine, 1, Progression::Completed);

        let attendance = engine.board().get(1).unwrap().clone();
        let result = engine.drag(&DragRequest::for_attendance(&attendance, Progression::OnGoing));
        assert_eq!(result, Err(EngineError::AttendancePending(1)));
    }

    #[test]
    fn test_reopening_completion_modal_rolls_back_previous() {
        let mut engine = engine_with(vec![spiritual(1), spiritual(2)]);
        for id in [1, 2] {
            advance(&mut engine, id, Progression::CheckedIn);
            advance(&mut engine, id, Progression::OnGoing);
        }
        advance(&mut engine, 1, Progression::Completed);
        let outcome = advance(&mut engine, 2, Progression::Completed);

        match outcome {
            DragOutcome::PendingConfirmation { superseded, .. } => match superseded.as_slice() {
                [Resolution::RolledBack {
                    attendance_id: 1,
                    location,
                }] => assert_eq!(location.progression, Progression::OnGoing),
                other => panic!("unexpected superseded: {:?}", other),
            },
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(engine.pending(), vec![2]);
        assert_eq!(engine.board().get(1).unwrap().progression, Progression::OnGoing);
        let payload = engine.modals().state().post_attendance.payload.clone().unwrap();
        assert_eq!(payload.attendance_id, 2);
    }

    #[test]
    fn test_removing_pending_attendance_makes_signal_stale() {
        let mut engine = engine_with(vec![spiritual(1)]);
        advance(&mut engine, 1, Progression::CheckedIn);
        advance(&mut engine, 1, Progression::OnGoing);
        advance(&mut engine, 1, Progression::Completed);

        assert!(engine.remove_attendance(1).is_some());
        let resolutions = engine.complete_modal(ModalKind::PostAttendance, true);
        assert_eq!(resolutions, vec![Resolution::Stale { attendance_id: 1 }]);
        assert!(engine.board().is_empty());
    }

    #[test]
    fn test_revert_restores_previous_record() {
        let mut engine = engine_with(vec![spiritual(1), spiritual(2)]);
        let before = engine.board().clone();

        let record = match advance(&mut engine, 1, Progression::CheckedIn) {
            DragOutcome::Committed(record) => record,
            other => panic!("unexpected outcome: {:?}", other),
        };
        engine.revert(&record).unwrap();

        assert_eq!(*engine.board(), before);
        assert!(engine.revert(&record).is_err());
    }

    #[test]
    fn test_cancellation_modal_removes_on_confirm() {
        let mut engine = engine_with(vec![spiritual(1), spiritual(2)]);

        engine.request_cancellation(1).unwrap();
        let dismissed = engine.close_modal(ModalKind::Cancellation);
        assert_eq!(
            dismissed,
            vec![Resolution::CancellationDismissed { attendance_id: 1 }]
        );
        assert!(engine.board().contains(1));

        engine.request_cancellation(1).unwrap();
        let resolutions = engine.complete_modal(ModalKind::Cancellation, true);
        assert!(matches!(resolutions.as_slice(), [Resolution::Cancelled(a)] if a.id == 1));
        assert!(!engine.board().contains(1));
        assert!(engine.remove_attendance(1).is_none());
    }

    #[test]
    fn test_schedule_resets_progression() {
        let mut engine = Engine::new();
        let mut attendance = spiritual(1);
        attendance.progression = Progression::OnGoing;
        attendance.on_going_time = Some(Utc::now());

        engine.schedule(attendance).unwrap();
        let stored = engine.board().get(1).unwrap();
        assert_eq!(stored.progression, Progression::Scheduled);
        assert!(stored.on_going_time.is_none());
    }

    #[test]
    fn test_walk_in_lands_in_scheduled() {
        let mut engine = Engine::new();
        let walk_in = WalkIn {
            attendance_id: 7,
            patient_id: 70,
            patient_name: "Walk-in".to_string(),
            attendance_type: AttendanceType::LightBath,
            priority: Priority::Emergency,
            is_first_attendance: true,
        };

        let location = engine.register_walk_in(walk_in.clone(), day()).unwrap();
        assert_eq!(location.progression, Progression::Scheduled);
        assert_eq!(location.attendance_type, AttendanceType::LightBath);

        let stored = engine.board().get(7).unwrap();
        assert_eq!(stored.scheduled_date, day());
        assert_eq!(stored.priority, Priority::Emergency);
        assert!(stored.is_first_attendance);

        assert!(matches!(
            engine.register_walk_in_today(walk_in),
            Err(EngineError::Board(BoardError::DuplicateAttendance(7)))
        ));
    }
}
