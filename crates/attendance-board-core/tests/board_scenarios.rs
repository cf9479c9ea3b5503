//! Drag-and-drop scenarios against the engine.

use attendance_board_core::engine::{DragOutcome, DragRequest, Engine, EngineError, Resolution};
use attendance_board_core::models::{Attendance, AttendanceType, ModalKind, Priority, Progression};
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
}

fn make_attendance(id: u64, attendance_type: AttendanceType) -> Attendance {
    Attendance::new(id, id * 10, format!("Patient {}", id), attendance_type, day())
}

fn drag_to(engine: &mut Engine, id: u64, to: Progression) -> Result<DragOutcome, EngineError> {
    let attendance = engine.board().get(id).unwrap().clone();
    engine.drag(&DragRequest::for_attendance(&attendance, to))
}

/// Walk an attendance forward until it reaches `state`.
fn place(engine: &mut Engine, id: u64, state: Progression) {
    while engine.board().get(id).unwrap().progression < state {
        let current = engine.board().get(id).unwrap().progression;
        let next = current.next().unwrap();
        match drag_to(engine, id, next).unwrap() {
            DragOutcome::PendingConfirmation { modal, .. } => {
                let resolutions = engine.complete_modal(modal, true);
                assert!(matches!(resolutions.as_slice(), [Resolution::Finalized(_)]));
            }
            DragOutcome::Committed(_) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}

fn bucket_ids(engine: &Engine, attendance_type: AttendanceType, state: Progression) -> Vec<u64> {
    engine
        .board()
        .bucket(attendance_type, state)
        .iter()
        .map(|a| a.id)
        .collect()
}

#[test]
fn test_first_spiritual_completion_flow() {
    let mut engine = Engine::new();
    engine.schedule(make_attendance(100, AttendanceType::Spiritual)).unwrap();
    engine
        .schedule(make_attendance(101, AttendanceType::Spiritual).first_attendance(true))
        .unwrap();
    engine.schedule(make_attendance(102, AttendanceType::Spiritual)).unwrap();
    for id in [100, 101, 102] {
        place(&mut engine, id, Progression::OnGoing);
    }
    let before = engine.board().clone();
    assert_eq!(
        bucket_ids(&engine, AttendanceType::Spiritual, Progression::OnGoing),
        vec![100, 101, 102]
    );

    // Drag 101 to completed: provisional, postAttendance opens
    let outcome = drag_to(&mut engine, 101, Progression::Completed).unwrap();
    assert!(matches!(
        outcome,
        DragOutcome::PendingConfirmation {
            attendance_id: 101,
            modal: ModalKind::PostAttendance,
            ..
        }
    ));
    assert_eq!(
        bucket_ids(&engine, AttendanceType::Spiritual, Progression::Completed),
        vec![101]
    );
    let payload = engine
        .modals()
        .state()
        .post_attendance
        .payload
        .clone()
        .unwrap();
    assert_eq!(payload.attendance_id, 101);
    assert!(payload.is_first_attendance);
    assert!(engine.board().get(101).unwrap().completed_time.is_none());

    // Cancel: back at index 1 of onGoing, board identical
    let resolutions = engine.close_modal(ModalKind::PostAttendance);
    match resolutions.as_slice() {
        [Resolution::RolledBack {
            attendance_id: 101,
            location,
        }] => {
            assert_eq!(location.progression, Progression::OnGoing);
            assert_eq!(location.index, 1);
        }
        other => panic!("unexpected resolutions: {:?}", other),
    }
    assert_eq!(*engine.board(), before);
    assert!(!engine.modals().is_open(ModalKind::PostAttendance));

    // Drag again and submit
    drag_to(&mut engine, 101, Progression::Completed).unwrap();
    let started = Utc::now();
    let resolutions = engine.complete_modal(ModalKind::PostAttendance, true);
    let finished = Utc::now();

    assert!(matches!(resolutions.as_slice(), [Resolution::Finalized(r)] if r.attendance_id == 101));
    let attendance = engine.board().get(101).unwrap();
    assert_eq!(attendance.progression, Progression::Completed);
    let completed_at = attendance.completed_time.unwrap();
    assert!(completed_at >= started && completed_at <= finished);
    assert!(attendance.timestamps_monotonic());
    assert!(engine.pending().is_empty());
}

#[test]
fn test_treatment_types_route_to_post_treatment() {
    for attendance_type in [AttendanceType::LightBath, AttendanceType::Rod] {
        let mut engine = Engine::new();
        engine
            .schedule(make_attendance(1, attendance_type).with_priority(Priority::Emergency))
            .unwrap();
        place(&mut engine, 1, Progression::OnGoing);

        let outcome = drag_to(&mut engine, 1, Progression::Completed).unwrap();
        assert!(matches!(
            outcome,
            DragOutcome::PendingConfirmation {
                modal: ModalKind::PostTreatment,
                ..
            }
        ));
        assert!(!engine.modals().is_open(ModalKind::PostAttendance));
        assert_eq!(
            engine
                .modals()
                .state()
                .post_treatment
                .payload
                .as_ref()
                .map(|p| p.attendance_type),
            Some(attendance_type)
        );
    }
}

#[test]
fn test_modal_kinds_are_isolated() {
    let mut engine = Engine::new();
    engine.schedule(make_attendance(1, AttendanceType::Spiritual)).unwrap();
    engine.schedule(make_attendance(2, AttendanceType::Rod)).unwrap();
    place(&mut engine, 1, Progression::OnGoing);
    place(&mut engine, 2, Progression::OnGoing);

    drag_to(&mut engine, 1, Progression::Completed).unwrap();
    drag_to(&mut engine, 2, Progression::Completed).unwrap();
    assert_eq!(engine.pending(), vec![1, 2]);

    // Closing postTreatment leaves the spiritual completion pending
    engine.close_modal(ModalKind::PostTreatment);
    assert_eq!(engine.pending(), vec![1]);
    assert!(engine.modals().is_open(ModalKind::PostAttendance));
    assert_eq!(engine.board().get(2).unwrap().progression, Progression::OnGoing);

    engine.complete_modal(ModalKind::PostAttendance, true);
    assert_eq!(engine.board().get(1).unwrap().progression, Progression::Completed);
}

#[test]
fn test_absence_review_clears_past_scheduled() {
    let yesterday = day().pred_opt().unwrap();
    let mut engine = Engine::new();
    engine
        .schedule(Attendance::new(1, 10, "Past".to_string(), AttendanceType::Spiritual, yesterday))
        .unwrap();
    engine
        .schedule(Attendance::new(2, 20, "Past too".to_string(), AttendanceType::Rod, yesterday))
        .unwrap();
    engine.schedule(make_attendance(3, AttendanceType::Spiritual)).unwrap();

    let first = engine.begin_absence_review(day()).unwrap().unwrap();
    assert_eq!(first.remaining, 2);
    assert!(engine.modals().is_open(ModalKind::AbsenceJustification));

    engine.justify_current(true, Some("Fever".to_string())).unwrap();
    let records = engine.skip_all().unwrap();

    assert_eq!(records.len(), 2);
    assert!(records[0].justified);
    assert!(!records[1].justified);
    assert!(!engine.modals().is_open(ModalKind::AbsenceJustification));
    assert_eq!(engine.board().len(), 1);
    assert!(engine.board().contains(3));
}

fn state_at(i: usize) -> Progression {
    Progression::ORDER[i]
}

proptest! {
    #[test]
    fn prop_only_single_steps_are_accepted(from in 0usize..4, to in 0usize..4) {
        let (from, to) = (state_at(from), state_at(to));
        let mut engine = Engine::new();
        engine.schedule(make_attendance(1, AttendanceType::Spiritual)).unwrap();
        place(&mut engine, 1, from);
        let before = engine.board().clone();

        let result = drag_to(&mut engine, 1, to);
        let allowed = from == to || from.next() == Some(to) || from.previous() == Some(to);

        prop_assert_eq!(result.is_ok(), allowed);
        if !allowed {
            prop_assert_eq!(engine.board(), &before);
        }
        for attendance in engine.board().iter() {
            prop_assert!(attendance.timestamps_monotonic());
        }
    }

    #[test]
    fn prop_cancelled_completion_restores_board(
        count in 1usize..8,
        pick in 0usize..8,
        target in 0usize..10,
    ) {
        let mut engine = Engine::new();
        for id in 0..count as u64 {
            engine.schedule(make_attendance(id, AttendanceType::LightBath)).unwrap();
        }
        // Some attendances already completed, so the drop index matters
        for id in 0..(count as u64 / 2) {
            place(&mut engine, id, Progression::Completed);
        }
        for id in (count as u64 / 2)..count as u64 {
            place(&mut engine, id, Progression::OnGoing);
        }
        let before = engine.board().clone();

        let id = (count as u64 / 2) + (pick as u64 % (count as u64 - count as u64 / 2));
        let attendance = engine.board().get(id).unwrap().clone();
        engine
            .drag(&DragRequest::for_attendance(&attendance, Progression::Completed).at_index(target))
            .unwrap();
        prop_assert_eq!(engine.board().len(), count);

        engine.close_modal(ModalKind::PostTreatment);
        prop_assert_eq!(engine.board(), &before);
        prop_assert!(engine.pending().is_empty());
    }
}
