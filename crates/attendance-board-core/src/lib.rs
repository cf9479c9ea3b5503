//! Attendance Board Core Library
//!
//! Clinic attendance board: attendances grouped by treatment type and
//! progression, moved by drag-and-drop, with follow-up modals gating completion.
//!
//! # Architecture
//!
//! ```text
//!   UI drag event
//!        │
//!        ▼
//!  Transition Engine ── validates move ──► Board (provisional / committed)
//!        │
//!        │ target = completed
//!        ▼
//!  Modal Routing Policy ── spiritual → postAttendance
//!        │                 lightBath, rod → postTreatment
//!        ▼
//!   Modal Store ── open(payload, on_complete)
//!        │
//!   user submits / cancels
//!        │
//!        ▼
//!  on_complete(success) ──► Engine finalizes or rolls back
//!        │
//!        ▼
//!  StatusUpdater (SQLite) ── failure ──► Engine reverts
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Attendance, Progression, ModalKind, ...)
//! - [`state`]: Observable state container
//! - [`board`]: Board aggregate
//! - [`routing`]: Modal routing policy
//! - [`store`]: Modal orchestration store
//! - [`engine`]: Drag-and-drop transition engine
//! - [`db`]: SQLite persistence
//! - [`config`], [`telemetry`]: Configuration and logging

pub mod board;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod routing;
pub mod state;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use board::{Board, BoardError, Location};
pub use config::{BoardConfig, LoggingConfig};
pub use db::{Database, StatusUpdater};
pub use engine::{
    AbsenceProgress, DragOutcome, DragRequest, Engine, EngineError, Resolution, TransitionRecord,
    WalkIn,
};
pub use models::{
    AbsenceRecord, Attendance, AttendanceType, ModalKind, ModelError, Priority, Progression,
};
pub use routing::{route_modal, route_modal_by_name};
pub use store::{CompletionCallback, ModalStore, ModalStoreState};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use store::AbsenceJustificationPayload;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum AttendanceBoardError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for AttendanceBoardError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => AttendanceBoardError::NotFound(what),
            other => AttendanceBoardError::DatabaseError(other.to_string()),
        }
    }
}

impl From<EngineError> for AttendanceBoardError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidTransition { .. } => {
                AttendanceBoardError::InvalidTransition(e.to_string())
            }
            EngineError::AttendanceNotFound { .. } | EngineError::UnknownAttendance(_) => {
                AttendanceBoardError::NotFound(e.to_string())
            }
            other => AttendanceBoardError::InvalidInput(other.to_string()),
        }
    }
}

impl From<ModelError> for AttendanceBoardError {
    fn from(e: ModelError) -> Self {
        AttendanceBoardError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for AttendanceBoardError {
    fn from(e: serde_json::Error) -> Self {
        AttendanceBoardError::SerializationError(e.to_string())
    }
}

impl From<anyhow::Error> for AttendanceBoardError {
    fn from(e: anyhow::Error) -> Self {
        AttendanceBoardError::ConfigError(format!("{:#}", e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for AttendanceBoardError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        AttendanceBoardError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open a board from a JSON configuration, with environment overrides.
#[uniffi::export]
pub fn open_board(config_json: String) -> Result<Arc<AttendanceBoardCore>, AttendanceBoardError> {
    let config = BoardConfig::from_json_str(&config_json)?.apply_env();
    Ok(Arc::new(AttendanceBoardCore::from_config(&config)?))
}

/// Open a board backed by an in-memory database (for testing).
#[uniffi::export]
pub fn open_board_in_memory() -> Result<Arc<AttendanceBoardCore>, AttendanceBoardError> {
    Ok(Arc::new(AttendanceBoardCore::from_config(
        &BoardConfig::default(),
    )?))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe board wrapper for FFI.
#[derive(uniffi::Object)]
pub struct AttendanceBoardCore {
    engine: Arc<Mutex<Engine>>,
    db: Arc<Mutex<Database>>,
    allow_step_back: bool,
}

impl AttendanceBoardCore {
    /// Build a board core from configuration.
    pub fn from_config(config: &BoardConfig) -> Result<Self, AttendanceBoardError> {
        telemetry::init_tracing(&config.logging);

        let db = match &config.database_path {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        tracing::info!(
            database = ?config.database_path,
            allow_step_back = config.allow_step_back,
            "attendance board opened"
        );

        Ok(Self {
            engine: Arc::new(Mutex::new(
                Engine::new().allow_step_back(config.allow_step_back),
            )),
            db: Arc::new(Mutex::new(db)),
            allow_step_back: config.allow_step_back,
        })
    }

    /// Write modal outcomes through to the database.
    ///
    /// Every resolution is applied even if an earlier one fails; the first
    /// failure is returned. A completion that cannot be stored is reverted.
    fn persist(
        &self,
        engine: &mut Engine,
        resolutions: Vec<Resolution>,
    ) -> Result<Vec<FfiResolution>, AttendanceBoardError> {
        let db = self.db.lock()?;
        let mut out = Vec::with_capacity(resolutions.len());
        let mut first_error: Option<AttendanceBoardError> = None;

        for resolution in resolutions {
            let written = match &resolution {
                Resolution::Finalized(record) => write_transition(&db, engine, record),
                Resolution::Cancelled(attendance) => db
                    .delete_attendance(attendance.id)
                    .map(|_| ())
                    .map_err(AttendanceBoardError::from),
                // Absence answers are stored before they are applied
                Resolution::AbsenceReviewClosed { .. }
                | Resolution::RolledBack { .. }
                | Resolution::CancellationDismissed { .. }
                | Resolution::Stale { .. } => Ok(()),
            };
            match written {
                Ok(()) => out.push(resolution.into()),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }
}

/// Store a committed transition, reverting it on the board if the write fails.
fn write_transition(
    db: &Database,
    engine: &mut Engine,
    record: &TransitionRecord,
) -> Result<(), AttendanceBoardError> {
    let Err(e) = db.update_status(record.attendance_id, record.to, record.committed_at) else {
        return Ok(());
    };
    if let Err(revert_error) = engine.revert(record) {
        tracing::warn!(
            attendance_id = record.attendance_id,
            error = %revert_error,
            "could not revert unsaved transition"
        );
    }
    Err(e.into())
}

#[uniffi::export]
impl AttendanceBoardCore {
    // =========================================================================
    // Board Operations
    // =========================================================================

    /// Replace the board with the stored attendances for a day (`YYYY-MM-DD`).
    pub fn load_day(&self, date: String) -> Result<u32, AttendanceBoardError> {
        let date = models::parse_date(&date)?;
        let mut engine = self.engine.lock()?;
        let board = self.db.lock()?.load_board(date)?;
        let count = board.len() as u32;
        *engine = Engine::with_board(board).allow_step_back(self.allow_step_back);
        Ok(count)
    }

    /// Schedule an attendance (agenda or walk-in).
    pub fn schedule_attendance(&self, attendance: FfiAttendance) -> Result<(), AttendanceBoardError> {
        let attendance: Attendance = attendance.try_into()?;
        let id = attendance.id;

        let mut engine = self.engine.lock()?;
        engine.schedule(attendance)?;
        let stored = engine
            .board()
            .get(id)
            .cloned()
            .ok_or_else(|| AttendanceBoardError::NotFound(format!("attendance {}", id)))?;

        if let Err(e) = self.db.lock()?.insert_attendance(&stored) {
            engine.remove_attendance(id);
            return Err(e.into());
        }
        Ok(())
    }

    /// Register a walk-in for today.
    pub fn register_walk_in(&self, walk_in: FfiWalkIn) -> Result<(), AttendanceBoardError> {
        let walk_in: WalkIn = walk_in.try_into()?;
        let id = walk_in.attendance_id;

        let mut engine = self.engine.lock()?;
        engine.register_walk_in_today(walk_in)?;
        let stored = engine
            .board()
            .get(id)
            .cloned()
            .ok_or_else(|| AttendanceBoardError::NotFound(format!("attendance {}", id)))?;

        if let Err(e) = self.db.lock()?.insert_attendance(&stored) {
            engine.remove_attendance(id);
            return Err(e.into());
        }
        Ok(())
    }

    /// Apply a drag gesture. Committed moves are persisted, or reverted if that fails.
    pub fn drag(&self, request: FfiDragRequest) -> Result<FfiDragOutcome, AttendanceBoardError> {
        let request: DragRequest = request.try_into()?;
        let mut engine = self.engine.lock()?;
        let outcome = engine.drag(&request)?;

        if let DragOutcome::Committed(record) = &outcome {
            write_transition(&*self.db.lock()?, &mut engine, record)?;
        }
        Ok(outcome.into())
    }

    /// Remove an attendance from the board and the database.
    pub fn remove_attendance(&self, attendance_id: u64) -> Result<bool, AttendanceBoardError> {
        let mut engine = self.engine.lock()?;
        let removed = engine.remove_attendance(attendance_id).is_some();
        self.db.lock()?.delete_attendance(attendance_id)?;
        Ok(removed)
    }

    /// Board as JSON, nested by type then state.
    pub fn board_json(&self) -> Result<String, AttendanceBoardError> {
        let engine = self.engine.lock()?;
        Ok(serde_json::to_string(engine.board())?)
    }

    /// IDs of attendances waiting on their completion modal.
    pub fn pending_attendances(&self) -> Result<Vec<u64>, AttendanceBoardError> {
        Ok(self.engine.lock()?.pending())
    }

    // =========================================================================
    // Modal Operations
    // =========================================================================

    /// Modal store state as JSON.
    pub fn modal_state_json(&self) -> Result<String, AttendanceBoardError> {
        let engine = self.engine.lock()?;
        Ok(serde_json::to_string(engine.modals().state())?)
    }

    /// Submit a modal.
    pub fn complete_modal(
        &self,
        kind: String,
        success: bool,
    ) -> Result<Vec<FfiResolution>, AttendanceBoardError> {
        let kind: ModalKind = kind.parse()?;
        let mut engine = self.engine.lock()?;
        let resolutions = engine.complete_modal(kind, success);
        self.persist(&mut engine, resolutions)
    }

    /// Close a modal without submitting.
    pub fn close_modal(&self, kind: String) -> Result<Vec<FfiResolution>, AttendanceBoardError> {
        let kind: ModalKind = kind.parse()?;
        let mut engine = self.engine.lock()?;
        let resolutions = engine.close_modal(kind);
        self.persist(&mut engine, resolutions)
    }

    /// Open the cancellation modal for an attendance. Returns the request ID.
    pub fn request_cancellation(&self, attendance_id: u64) -> Result<String, AttendanceBoardError> {
        let mut engine = self.engine.lock()?;
        Ok(engine.request_cancellation(attendance_id)?.to_string())
    }

    // =========================================================================
    // Absences and End of Day
    // =========================================================================

    /// Start reviewing absences before `today` (`YYYY-MM-DD`).
    pub fn begin_absence_review(
        &self,
        today: String,
    ) -> Result<Option<FfiAbsencePrompt>, AttendanceBoardError> {
        let today = models::parse_date(&today)?;
        let mut engine = self.engine.lock()?;
        Ok(engine.begin_absence_review(today)?.map(Into::into))
    }

    /// Answer the current absence. Returns the next one, or `None` when done.
    ///
    /// The answer is stored before the attendance leaves the board.
    pub fn justify_absence(
        &self,
        justified: bool,
        notes: Option<String>,
    ) -> Result<Option<FfiAbsencePrompt>, AttendanceBoardError> {
        let mut engine = self.engine.lock()?;
        let records: Vec<AbsenceRecord> = engine
            .prepare_absence_answer(justified, notes)?
            .into_iter()
            .collect();
        self.db.lock()?.record_absences(&records)?;

        match engine.apply_absence_records(records)? {
            AbsenceProgress::Next(payload) => Ok(Some(payload.into())),
            AbsenceProgress::Finished(_) => Ok(None),
        }
    }

    /// Mark every remaining absence unjustified. Returns how many were recorded.
    pub fn skip_all_absences(&self) -> Result<u32, AttendanceBoardError> {
        let mut engine = self.engine.lock()?;
        let records = engine.prepare_skip_all()?;
        self.db.lock()?.record_absences(&records)?;

        let count = records.len() as u32;
        engine.apply_absence_records(records)?;
        Ok(count)
    }

    /// Open the end-of-day summary for a date. Returns the request ID.
    pub fn open_end_of_day(&self, date: String) -> Result<String, AttendanceBoardError> {
        let date = models::parse_date(&date)?;
        let mut engine = self.engine.lock()?;
        Ok(engine.open_end_of_day(date).to_string())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe attendance.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAttendance {
    pub id: u64,
    pub patient_id: u64,
    pub patient_name: String,
    pub attendance_type: String,
    pub priority: String,
    pub is_first_attendance: bool,
    pub scheduled_date: String,
}

impl TryFrom<FfiAttendance> for Attendance {
    type Error = ModelError;

    fn try_from(a: FfiAttendance) -> Result<Self, Self::Error> {
        Ok(Attendance::new(
            a.id,
            a.patient_id,
            a.patient_name,
            a.attendance_type.parse()?,
            models::parse_date(&a.scheduled_date)?,
        )
        .with_priority(a.priority.parse()?)
        .first_attendance(a.is_first_attendance))
    }
}

/// FFI-safe walk-in registration.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWalkIn {
    pub attendance_id: u64,
    pub patient_id: u64,
    pub patient_name: String,
    pub attendance_type: String,
    pub priority: String,
    pub is_first_attendance: bool,
}

impl TryFrom<FfiWalkIn> for WalkIn {
    type Error = ModelError;

    fn try_from(w: FfiWalkIn) -> Result<Self, Self::Error> {
        Ok(WalkIn {
            attendance_id: w.attendance_id,
            patient_id: w.patient_id,
            patient_name: w.patient_name,
            attendance_type: w.attendance_type.parse()?,
            priority: w.priority.parse()?,
            is_first_attendance: w.is_first_attendance,
        })
    }
}

/// FFI-safe drag request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDragRequest {
    pub attendance_id: u64,
    pub attendance_type: String,
    pub patient_name: String,
    pub patient_id: u64,
    pub source_state: String,
    pub target_state: String,
    pub is_first_attendance: bool,
    pub priority: String,
    pub target_index: Option<u32>,
}

impl TryFrom<FfiDragRequest> for DragRequest {
    type Error = ModelError;

    fn try_from(r: FfiDragRequest) -> Result<Self, Self::Error> {
        Ok(DragRequest {
            attendance_id: r.attendance_id,
            attendance_type: r.attendance_type.parse()?,
            patient_name: r.patient_name,
            patient_id: r.patient_id,
            source_state: r.source_state.parse()?,
            target_state: r.target_state.parse()?,
            is_first_attendance: r.is_first_attendance,
            priority: r.priority.parse()?,
            target_index: r.target_index.map(|i| i as usize),
        })
    }
}

/// FFI-safe drag outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDragOutcome {
    /// "committed", "reordered" or "pending"
    pub status: String,
    pub attendance_id: Option<u64>,
    pub modal: Option<String>,
    pub request_id: Option<String>,
    /// Attendances whose pending completion this drag displaced and rolled back
    pub rolled_back: Vec<u64>,
}

impl From<DragOutcome> for FfiDragOutcome {
    fn from(outcome: DragOutcome) -> Self {
        match outcome {
            DragOutcome::Committed(record) => Self {
                status: "committed".into(),
                attendance_id: Some(record.attendance_id),
                modal: None,
                request_id: None,
                rolled_back: Vec::new(),
            },
            DragOutcome::Reordered(_) => Self {
                status: "reordered".into(),
                attendance_id: None,
                modal: None,
                request_id: None,
                rolled_back: Vec::new(),
            },
            DragOutcome::PendingConfirmation {
                attendance_id,
                modal,
                request_id,
                superseded,
            } => Self {
                status: "pending".into(),
                attendance_id: Some(attendance_id),
                modal: Some(modal.to_string()),
                request_id: Some(request_id.to_string()),
                rolled_back: superseded
                    .iter()
                    .filter_map(|resolution| match resolution {
                        Resolution::RolledBack { attendance_id, .. } => Some(*attendance_id),
                        _ => None,
                    })
                    .collect(),
            },
        }
    }
}

/// FFI-safe modal resolution.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiResolution {
    pub outcome: String,
    pub attendance_id: Option<u64>,
}

impl From<Resolution> for FfiResolution {
    fn from(resolution: Resolution) -> Self {
        let (outcome, attendance_id) = match resolution {
            Resolution::Finalized(record) => ("finalized", Some(record.attendance_id)),
            Resolution::RolledBack { attendance_id, .. } => ("rolledBack", Some(attendance_id)),
            Resolution::Cancelled(attendance) => ("cancelled", Some(attendance.id)),
            Resolution::CancellationDismissed { attendance_id } => {
                ("cancellationDismissed", Some(attendance_id))
            }
            Resolution::Stale { attendance_id } => ("stale", Some(attendance_id)),
            Resolution::AbsenceReviewClosed { .. } => ("absenceReviewClosed", None),
        };
        Self {
            outcome: outcome.into(),
            attendance_id,
        }
    }
}

/// FFI-safe absence under review.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAbsencePrompt {
    pub attendance_id: u64,
    pub patient_id: u64,
    pub patient_name: String,
    pub attendance_type: String,
    pub scheduled_date: String,
    pub remaining: u32,
}

impl From<AbsenceJustificationPayload> for FfiAbsencePrompt {
    fn from(payload: AbsenceJustificationPayload) -> Self {
        Self {
            attendance_id: payload.attendance_id,
            patient_id: payload.patient_id,
            patient_name: payload.patient_name,
            attendance_type: payload.attendance_type.to_string(),
            scheduled_date: payload.scheduled_date.to_string(),
            remaining: payload.remaining as u32,
        }
    }
}
