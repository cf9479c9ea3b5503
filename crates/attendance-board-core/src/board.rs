//! Attendance board: attendances grouped by type, then by progression state.
//!
//! Bucket order is display order. Every attendance lives in exactly one
//! `(type, state)` bucket, so moves are relocations, never copies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Attendance, AttendanceType, Progression};

/// Board errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Attendance {id} not found in {state}")]
    AttendanceNotFound { id: u64, state: Progression },

    #[error("Attendance {0} is already on the board")]
    DuplicateAttendance(u64),

    #[error("Invalid progression state: {0}")]
    InvalidState(String),
}

pub type BoardResult<T> = Result<T, BoardError>;

/// Where an attendance sits on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub attendance_type: AttendanceType,
    pub progression: Progression,
    pub index: usize,
}

/// Attendance counts per type and state.
pub type BoardCounts = BTreeMap<AttendanceType, BTreeMap<Progression, usize>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    columns: BTreeMap<AttendanceType, BTreeMap<Progression, Vec<Attendance>>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with every bucket present.
    pub fn new() -> Self {
        let columns = AttendanceType::ALL
            .into_iter()
            .map(|t| {
                let states = Progression::ORDER
                    .into_iter()
                    .map(|p| (p, Vec::new()))
                    .collect();
                (t, states)
            })
            .collect();
        Self { columns }
    }

    /// Build a board from attendances, each placed by its own progression.
    pub fn from_attendances(attendances: impl IntoIterator<Item = Attendance>) -> BoardResult<Self> {
        let mut board = Self::new();
        for attendance in attendances {
            board.insert(attendance)?;
        }
        Ok(board)
    }

    /// Append an attendance to the bucket of its type and progression.
    pub fn insert(&mut self, attendance: Attendance) -> BoardResult<Location> {
        if self.contains(attendance.id) {
            return Err(BoardError::DuplicateAttendance(attendance.id));
        }
        let (t, p) = (attendance.attendance_type, attendance.progression);
        let bucket = self.bucket_mut(t, p);
        bucket.push(attendance);
        Ok(Location {
            attendance_type: t,
            progression: p,
            index: bucket.len() - 1,
        })
    }

    /// Insert at a position in the attendance's own bucket, clamped to its length.
    pub(crate) fn insert_at(&mut self, attendance: Attendance, index: usize) -> BoardResult<Location> {
        if self.contains(attendance.id) {
            return Err(BoardError::DuplicateAttendance(attendance.id));
        }
        let (t, p) = (attendance.attendance_type, attendance.progression);
        let bucket = self.bucket_mut(t, p);
        let index = index.min(bucket.len());
        bucket.insert(index, attendance);
        Ok(Location {
            attendance_type: t,
            progression: p,
            index,
        })
    }

    /// Relocate an attendance from `from` to `to`, inserting at `target_index`.
    ///
    /// The attendance keeps its type. An index past the end appends. The board
    /// is unchanged when the attendance is not in `from`.
    pub fn move_attendance(
        &mut self,
        attendance_id: u64,
        from: Progression,
        to: Progression,
        target_index: usize,
    ) -> BoardResult<Location> {
        let location = self
            .find(attendance_id)
            .filter(|loc| loc.progression == from)
            .ok_or(BoardError::AttendanceNotFound {
                id: attendance_id,
                state: from,
            })?;

        let mut attendance = self
            .bucket_mut(location.attendance_type, from)
            .remove(location.index);
        attendance.progression = to;

        let bucket = self.bucket_mut(location.attendance_type, to);
        let index = target_index.min(bucket.len());
        bucket.insert(index, attendance);

        Ok(Location {
            attendance_type: location.attendance_type,
            progression: to,
            index,
        })
    }

    /// Same as [`Board::move_attendance`], with the target state given by its wire spelling.
    pub fn move_attendance_named(
        &mut self,
        attendance_id: u64,
        from: Progression,
        to: &str,
        target_index: usize,
    ) -> BoardResult<Location> {
        let to = to
            .parse::<Progression>()
            .map_err(|_| BoardError::InvalidState(to.to_string()))?;
        self.move_attendance(attendance_id, from, to, target_index)
    }

    /// Remove an attendance from whichever bucket holds it. Absent IDs are a no-op.
    pub fn remove_attendance(&mut self, attendance_id: u64) -> Option<Attendance> {
        let location = self.find(attendance_id)?;
        Some(
            self.bucket_mut(location.attendance_type, location.progression)
                .remove(location.index),
        )
    }

    /// Locate an attendance.
    pub fn find(&self, attendance_id: u64) -> Option<Location> {
        self.columns.iter().find_map(|(t, states)| {
            states.iter().find_map(|(p, bucket)| {
                bucket
                    .iter()
                    .position(|a| a.id == attendance_id)
                    .map(|index| Location {
                        attendance_type: *t,
                        progression: *p,
                        index,
                    })
            })
        })
    }

    pub fn get(&self, attendance_id: u64) -> Option<&Attendance> {
        self.iter().find(|a| a.id == attendance_id)
    }

    pub(crate) fn get_mut(&mut self, attendance_id: u64) -> Option<&mut Attendance> {
        self.columns
            .values_mut()
            .flat_map(|states| states.values_mut())
            .flat_map(|bucket| bucket.iter_mut())
            .find(|a| a.id == attendance_id)
    }

    pub fn contains(&self, attendance_id: u64) -> bool {
        self.find(attendance_id).is_some()
    }

    /// Attendances of one type in one state, in display order.
    pub fn bucket(&self, attendance_type: AttendanceType, progression: Progression) -> &[Attendance] {
        self.columns
            .get(&attendance_type)
            .and_then(|states| states.get(&progression))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn bucket_mut(
        &mut self,
        attendance_type: AttendanceType,
        progression: Progression,
    ) -> &mut Vec<Attendance> {
        self.columns
            .entry(attendance_type)
            .or_default()
            .entry(progression)
            .or_default()
    }

    /// All attendances, type by type, state by state, in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Attendance> {
        self.columns
            .values()
            .flat_map(|states| states.values())
            .flat_map(|bucket| bucket.iter())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> BoardCounts {
        self.columns
            .iter()
            .map(|(t, states)| {
                let per_state = states.iter().map(|(p, bucket)| (*p, bucket.len())).collect();
                (*t, per_state)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn attendance(id: u64, t: AttendanceType) -> Attendance {
        let day = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        Attendance::new(id, id * 10, format!("Patient {}", id), t, day)
    }

    fn sample_board() -> Board {
        Board::from_attendances([
            attendance(1, AttendanceType::Spiritual),
            attendance(2, AttendanceType::Spiritual),
            attendance(3, AttendanceType::Spiritual),
            attendance(4, AttendanceType::LightBath),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_board_has_every_bucket() {
        let board = Board::new();
        let counts = board.counts();
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|states| states.len() == 4));
        assert!(board.is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut board = sample_board();
        let result = board.insert(attendance(2, AttendanceType::Rod));
        assert_eq!(result, Err(BoardError::DuplicateAttendance(2)));
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn test_move_inserts_at_target_index() {
        let mut board = sample_board();
        board
            .move_attendance(1, Progression::Scheduled, Progression::CheckedIn, 0)
            .unwrap();
        let loc = board
            .move_attendance(2, Progression::Scheduled, Progression::CheckedIn, 0)
            .unwrap();

        assert_eq!(loc.index, 0);
        let ids: Vec<u64> = board
            .bucket(AttendanceType::Spiritual, Progression::CheckedIn)
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(board.get(2).unwrap().progression, Progression::CheckedIn);
    }

    #[test]
    fn test_move_clamps_index() {
        let mut board = sample_board();
        let loc = board
            .move_attendance(4, Progression::Scheduled, Progression::CheckedIn, 99)
            .unwrap();
        assert_eq!(loc.index, 0);
        assert_eq!(loc.attendance_type, AttendanceType::LightBath);
    }

    #[test]
    fn test_move_from_wrong_state_fails_without_change() {
        let mut board = sample_board();
        let before = board.clone();
        let result = board.move_attendance(1, Progression::OnGoing, Progression::Completed, 0);

        assert_eq!(
            result,
            Err(BoardError::AttendanceNotFound {
                id: 1,
                state: Progression::OnGoing
            })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_move_to_unknown_state_name_fails() {
        let mut board = sample_board();
        let result = board.move_attendance_named(1, Progression::Scheduled, "cancelled", 0);
        assert_eq!(result, Err(BoardError::InvalidState("cancelled".into())));
        assert_eq!(board.find(1).unwrap().progression, Progression::Scheduled);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut board = sample_board();
        assert!(board.remove_attendance(3).is_some());
        assert!(board.remove_attendance(3).is_none());
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn test_json_is_nested_by_type_then_state() {
        let board = sample_board();
        let json = serde_json::to_value(&board).unwrap();
        assert_eq!(json["spiritual"]["scheduled"].as_array().unwrap().len(), 3);
        assert_eq!(json["lightBath"]["scheduled"][0]["id"], 4);

        let back: Board = serde_json::from_value(json).unwrap();
        assert_eq!(back, board);
    }

    fn state_strategy() -> impl Strategy<Value = Progression> {
        prop::sample::select(Progression::ORDER.to_vec())
    }

    proptest! {
        #[test]
        fn prop_moves_never_duplicate_or_orphan(
            moves in prop::collection::vec((1u64..=4, state_strategy(), 0usize..5), 0..40)
        ) {
            let mut board = sample_board();
            for (id, to, index) in moves {
                let from = board.find(id).unwrap().progression;
                board.move_attendance(id, from, to, index).unwrap();

                for id in 1..=4u64 {
                    let copies = board.iter().filter(|a| a.id == id).count();
                    prop_assert_eq!(copies, 1);
                }
                let loc = board.find(id).unwrap();
                prop_assert_eq!(loc.progression, to);
                prop_assert_eq!(board.get(id).unwrap().progression, to);
            }
            prop_assert_eq!(board.len(), 4);
        }
    }
}
