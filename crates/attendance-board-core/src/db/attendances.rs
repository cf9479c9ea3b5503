//! Attendance database operations.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, StatusUpdater};
use crate::board::Board;
use crate::models::{parse_date, Attendance, Progression};

const ATTENDANCE_COLUMNS: &str = r#"
    id, patient_id, patient_name, attendance_type, priority, is_first_attendance,
    progression, scheduled_date, checked_in_time, on_going_time, completed_time
"#;

/// One entry of an attendance's status history.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: Progression,
    pub changed_at: DateTime<Utc>,
}

impl Database {
    /// Insert a new attendance.
    pub fn insert_attendance(&self, attendance: &Attendance) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO attendances (
                id, patient_id, patient_name, attendance_type, priority, is_first_attendance,
                progression, scheduled_date, checked_in_time, on_going_time, completed_time
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                attendance.id as i64,
                attendance.patient_id as i64,
                attendance.patient_name,
                attendance.attendance_type.as_str(),
                attendance.priority.as_str(),
                attendance.is_first_attendance,
                attendance.progression.as_str(),
                attendance.scheduled_date.to_string(),
                attendance.checked_in_time.map(|t| t.to_rfc3339()),
                attendance.on_going_time.map(|t| t.to_rfc3339()),
                attendance.completed_time.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get an attendance by ID.
    pub fn get_attendance(&self, attendance_id: u64) -> DbResult<Option<Attendance>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM attendances WHERE id = ?", ATTENDANCE_COLUMNS),
                [attendance_id as i64],
                AttendanceRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List attendances scheduled for a date, most urgent first.
    pub fn list_attendances_for_date(&self, date: NaiveDate) -> DbResult<Vec<Attendance>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM attendances
            WHERE scheduled_date = ?
            ORDER BY priority ASC, id ASC
            "#,
            ATTENDANCE_COLUMNS
        ))?;

        let rows = stmt.query_map([date.to_string()], AttendanceRow::from_row)?;

        let mut attendances: Vec<Attendance> = Vec::new();
        for row in rows {
            attendances.push(row?.try_into()?);
        }
        Ok(attendances)
    }

    /// Build the board for a date.
    ///
    /// Earlier attendances still `scheduled` and without a recorded absence are
    /// included so they can be reviewed as absences.
    pub fn load_board(&self, date: NaiveDate) -> DbResult<Board> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM attendances
            WHERE scheduled_date = ?1
               OR (scheduled_date < ?1
                   AND progression = 'scheduled'
                   AND id NOT IN (SELECT attendance_id FROM absences))
            ORDER BY scheduled_date ASC, priority ASC, id ASC
            "#,
            ATTENDANCE_COLUMNS
        ))?;

        let rows = stmt.query_map([date.to_string()], AttendanceRow::from_row)?;

        let mut attendances: Vec<Attendance> = Vec::new();
        for row in rows {
            attendances.push(row?.try_into()?);
        }

        Board::from_attendances(attendances).map_err(|e| DbError::Constraint(e.to_string()))
    }

    /// Delete an attendance and its history.
    pub fn delete_attendance(&self, attendance_id: u64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM attendances WHERE id = ?", [attendance_id as i64])?;
        Ok(rows_affected > 0)
    }

    /// Status history of an attendance, oldest first.
    pub fn status_history(&self, attendance_id: u64) -> DbResult<Vec<StatusChange>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT status, changed_at FROM status_history
            WHERE attendance_id = ?
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map([attendance_id as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (status, changed_at) = row?;
            history.push(StatusChange {
                status: parse_progression(&status)?,
                changed_at: parse_timestamp(&changed_at)?,
            });
        }
        Ok(history)
    }
}

impl StatusUpdater for Database {
    fn update_status(
        &self,
        attendance_id: u64,
        status: Progression,
        timestamp: DateTime<Utc>,
    ) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        let mut attendance = self
            .get_attendance(attendance_id)?
            .ok_or_else(|| DbError::NotFound(format!("attendance {}", attendance_id)))?;

        // Same timestamp rules as the board: stamp on the way forward,
        // clear abandoned states on the way back.
        if status > attendance.progression {
            attendance.set_timestamp(status, timestamp);
        } else {
            for state in Progression::ORDER.into_iter().filter(|s| *s > status) {
                attendance.clear_timestamp(state);
            }
        }
        attendance.progression = status;

        tx.execute(
            r#"
            UPDATE attendances SET
                progression = ?2,
                checked_in_time = ?3,
                on_going_time = ?4,
                completed_time = ?5,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                attendance_id as i64,
                status.as_str(),
                attendance.checked_in_time.map(|t| t.to_rfc3339()),
                attendance.on_going_time.map(|t| t.to_rfc3339()),
                attendance.completed_time.map(|t| t.to_rfc3339()),
            ],
        )?;
        tx.execute(
            "INSERT INTO status_history (attendance_id, status, changed_at) VALUES (?1, ?2, ?3)",
            params![attendance_id as i64, status.as_str(), timestamp.to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

/// Intermediate row struct for database mapping.
struct AttendanceRow {
    id: i64,
    patient_id: i64,
    patient_name: String,
    attendance_type: String,
    priority: String,
    is_first_attendance: bool,
    progression: String,
    scheduled_date: String,
    checked_in_time: Option<String>,
    on_going_time: Option<String>,
    completed_time: Option<String>,
}

impl AttendanceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            patient_name: row.get(2)?,
            attendance_type: row.get(3)?,
            priority: row.get(4)?,
            is_first_attendance: row.get(5)?,
            progression: row.get(6)?,
            scheduled_date: row.get(7)?,
            checked_in_time: row.get(8)?,
            on_going_time: row.get(9)?,
            completed_time: row.get(10)?,
        })
    }
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = DbError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let constraint = |e: crate::models::ModelError| DbError::Constraint(e.to_string());

        Ok(Attendance {
            id: row.id as u64,
            patient_id: row.patient_id as u64,
            patient_name: row.patient_name,
            attendance_type: row.attendance_type.parse().map_err(constraint)?,
            priority: row.priority.parse().map_err(constraint)?,
            is_first_attendance: row.is_first_attendance,
            progression: parse_progression(&row.progression)?,
            scheduled_date: parse_date(&row.scheduled_date).map_err(constraint)?,
            checked_in_time: row.checked_in_time.as_deref().map(parse_timestamp).transpose()?,
            on_going_time: row.on_going_time.as_deref().map(parse_timestamp).transpose()?,
            completed_time: row.completed_time.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_progression(s: &str) -> DbResult<Progression> {
    s.parse()
        .map_err(|_| DbError::Constraint(format!("Unknown progression: {}", s)))
}

pub(crate) fn parse_timestamp(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| DbError::Constraint(format!("Invalid timestamp: {}", s)))
}
