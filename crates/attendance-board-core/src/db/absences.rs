//! Absence database operations.

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::attendances::parse_timestamp;
use super::{Database, DbError, DbResult};
use crate::models::{parse_date, AbsenceRecord};

impl Database {
    /// Record the outcome of an absence review. Re-recording replaces the entry.
    pub fn record_absence(&self, record: &AbsenceRecord) -> DbResult<()> {
        insert_absence(&self.conn, record)
    }

    /// Record several absences in one transaction. Nothing is written on failure.
    pub fn record_absences(&mut self, records: &[AbsenceRecord]) -> DbResult<()> {
        let tx = self.transaction()?;
        for record in records {
            insert_absence(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// List absences for a scheduled date.
    pub fn list_absences(&self, date: NaiveDate) -> DbResult<Vec<AbsenceRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT attendance_id, patient_id, patient_name, attendance_type,
                   scheduled_date, justified, notes, recorded_at
            FROM absences
            WHERE scheduled_date = ?
            ORDER BY attendance_id ASC
            "#,
        )?;

        let rows = stmt.query_map([date.to_string()], |row| {
            Ok(AbsenceRow {
                attendance_id: row.get(0)?,
                patient_id: row.get(1)?,
                patient_name: row.get(2)?,
                attendance_type: row.get(3)?,
                scheduled_date: row.get(4)?,
                justified: row.get(5)?,
                notes: row.get(6)?,
                recorded_at: row.get(7)?,
            })
        })?;

        let mut records: Vec<AbsenceRecord> = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}

fn insert_absence(conn: &Connection, record: &AbsenceRecord) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO absences (
            attendance_id, patient_id, patient_name, attendance_type,
            scheduled_date, justified, notes, recorded_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            record.attendance_id as i64,
            record.patient_id as i64,
            record.patient_name,
            record.attendance_type.as_str(),
            record.scheduled_date.to_string(),
            record.justified,
            record.notes,
            record.recorded_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Intermediate row struct for database mapping.
struct AbsenceRow {
    attendance_id: i64,
    patient_id: i64,
    patient_name: String,
    attendance_type: String,
    scheduled_date: String,
    justified: bool,
    notes: Option<String>,
    recorded_at: String,
}

impl TryFrom<AbsenceRow> for AbsenceRecord {
    type Error = DbError;

    fn try_from(row: AbsenceRow) -> Result<Self, Self::Error> {
        let constraint = |e: crate::models::ModelError| DbError::Constraint(e.to_string());

        Ok(AbsenceRecord {
            attendance_id: row.attendance_id as u64,
            patient_id: row.patient_id as u64,
            patient_name: row.patient_name,
            attendance_type: row.attendance_type.parse().map_err(constraint)?,
            scheduled_date: parse_date(&row.scheduled_date).map_err(constraint)?,
            justified: row.justified,
            notes: row.notes,
            recorded_at: parse_timestamp(&row.recorded_at)?,
        })
    }
}
