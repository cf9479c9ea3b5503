//! SQLite schema definition.

/// Complete database schema for the attendance board.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Attendances
-- ============================================================================

CREATE TABLE IF NOT EXISTS attendances (
    id INTEGER PRIMARY KEY,
    patient_id INTEGER NOT NULL,
    patient_name TEXT NOT NULL,
    attendance_type TEXT NOT NULL,               -- spiritual | lightBath | rod
    priority TEXT NOT NULL DEFAULT '3',          -- 1 emergency, 2 intermediate, 3 normal
    is_first_attendance INTEGER NOT NULL DEFAULT 0,
    progression TEXT NOT NULL DEFAULT 'scheduled',
    scheduled_date TEXT NOT NULL,                -- YYYY-MM-DD
    checked_in_time TEXT,                        -- RFC 3339
    on_going_time TEXT,
    completed_time TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_attendances_date ON attendances(scheduled_date);
CREATE INDEX IF NOT EXISTS idx_attendances_patient ON attendances(patient_id);

-- ============================================================================
-- Status History (append-only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS status_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    attendance_id INTEGER NOT NULL REFERENCES attendances(id) ON DELETE CASCADE,
    status TEXT NOT NULL,
    changed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_status_history_attendance ON status_history(attendance_id);

-- ============================================================================
-- Absences
-- ============================================================================

CREATE TABLE IF NOT EXISTS absences (
    attendance_id INTEGER PRIMARY KEY,
    patient_id INTEGER NOT NULL,
    patient_name TEXT NOT NULL,
    attendance_type TEXT NOT NULL,
    scheduled_date TEXT NOT NULL,
    justified INTEGER NOT NULL,
    notes TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_absences_date ON absences(scheduled_date);
"#;
