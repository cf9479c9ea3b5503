//! Modal orchestration store.
//!
//! One slot per modal kind. Opening a kind never touches another kind's slot.
//! Each slot can hold a completion callback, fired exactly once: with the
//! submitted outcome on completion, or with `false` when the modal is closed
//! or re-opened before it fired.

mod payloads;

pub use payloads::*;

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::models::ModalKind;
use crate::state::{StateContainer, SubscriptionId};

/// Callback invoked with the outcome of a modal interaction.
pub struct CompletionCallback(Box<dyn FnOnce(bool) + Send>);

impl CompletionCallback {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(bool) + Send + 'static,
    {
        Self(Box::new(f))
    }

    pub fn invoke(self, success: bool) {
        (self.0)(success)
    }
}

impl fmt::Debug for CompletionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompletionCallback")
    }
}

/// State of one modal kind.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalSlot<P> {
    pub is_open: bool,
    /// Identifies the current interaction
    pub request_id: Option<Uuid>,
    pub payload: Option<P>,
    #[serde(skip)]
    on_complete: Option<CompletionCallback>,
}

impl<P> Default for ModalSlot<P> {
    fn default() -> Self {
        Self {
            is_open: false,
            request_id: None,
            payload: None,
            on_complete: None,
        }
    }
}

impl<P> ModalSlot<P> {
    /// Open with a new payload. Returns the new request ID and any callback left
    /// unfired by the previous interaction.
    fn open(
        &mut self,
        payload: P,
        on_complete: Option<CompletionCallback>,
    ) -> (Uuid, Option<CompletionCallback>) {
        let superseded = self.on_complete.take();
        let request_id = Uuid::new_v4();
        self.is_open = true;
        self.request_id = Some(request_id);
        self.payload = Some(payload);
        self.on_complete = on_complete;
        (request_id, superseded)
    }

    /// Close and clear every field, handing back the callback.
    fn reset(&mut self) -> Option<CompletionCallback> {
        let callback = self.on_complete.take();
        *self = Self::default();
        callback
    }

    pub fn has_callback(&self) -> bool {
        self.on_complete.is_some()
    }
}

/// Every modal slot.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalStoreState {
    pub post_attendance: ModalSlot<PostAttendancePayload>,
    pub post_treatment: ModalSlot<PostTreatmentPayload>,
    pub absence_justification: ModalSlot<AbsenceJustificationPayload>,
    pub cancellation: ModalSlot<CancellationPayload>,
    pub multi_section: ModalSlot<MultiSectionPayload>,
    pub new_patient_check_in: ModalSlot<NewPatientCheckInPayload>,
    pub end_of_day: ModalSlot<EndOfDayPayload>,
}

impl ModalStoreState {
    pub fn is_open(&self, kind: ModalKind) -> bool {
        match kind {
            ModalKind::PostAttendance => self.post_attendance.is_open,
            ModalKind::PostTreatment => self.post_treatment.is_open,
            ModalKind::AbsenceJustification => self.absence_justification.is_open,
            ModalKind::Cancellation => self.cancellation.is_open,
            ModalKind::MultiSection => self.multi_section.is_open,
            ModalKind::NewPatientCheckIn => self.new_patient_check_in.is_open,
            ModalKind::EndOfDay => self.end_of_day.is_open,
        }
    }

    pub fn request_id(&self, kind: ModalKind) -> Option<Uuid> {
        match kind {
            ModalKind::PostAttendance => self.post_attendance.request_id,
            ModalKind::PostTreatment => self.post_treatment.request_id,
            ModalKind::AbsenceJustification => self.absence_justification.request_id,
            ModalKind::Cancellation => self.cancellation.request_id,
            ModalKind::MultiSection => self.multi_section.request_id,
            ModalKind::NewPatientCheckIn => self.new_patient_check_in.request_id,
            ModalKind::EndOfDay => self.end_of_day.request_id,
        }
    }

    /// Kinds currently open, in declaration order.
    pub fn open_kinds(&self) -> Vec<ModalKind> {
        ModalKind::ALL
            .into_iter()
            .filter(|kind| self.is_open(*kind))
            .collect()
    }

    fn reset(&mut self, kind: ModalKind) -> Option<CompletionCallback> {
        match kind {
            ModalKind::PostAttendance => self.post_attendance.reset(),
            ModalKind::PostTreatment => self.post_treatment.reset(),
            ModalKind::AbsenceJustification => self.absence_justification.reset(),
            ModalKind::Cancellation => self.cancellation.reset(),
            ModalKind::MultiSection => self.multi_section.reset(),
            ModalKind::NewPatientCheckIn => self.new_patient_check_in.reset(),
            ModalKind::EndOfDay => self.end_of_day.reset(),
        }
    }
}

/// Holds which modals are open and with what payload.
#[derive(Debug, Default)]
pub struct ModalStore {
    container: StateContainer<ModalStoreState>,
}

impl ModalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModalStoreState {
        self.container.get_state()
    }

    pub fn is_open(&self, kind: ModalKind) -> bool {
        self.state().is_open(kind)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&ModalStoreState) + Send + 'static,
    {
        self.container.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.container.unsubscribe(id)
    }

    fn open_with<P>(
        &mut self,
        kind: ModalKind,
        slot: fn(&mut ModalStoreState) -> &mut ModalSlot<P>,
        payload: P,
        on_complete: Option<CompletionCallback>,
    ) -> Uuid {
        let (request_id, superseded) = self
            .container
            .set_state(|state| slot(state).open(payload, on_complete));
        tracing::debug!(modal = %kind, %request_id, "modal opened");
        if let Some(callback) = superseded {
            tracing::debug!(modal = %kind, "previous interaction superseded");
            callback.invoke(false);
        }
        request_id
    }

    pub fn open_post_attendance(
        &mut self,
        payload: PostAttendancePayload,
        on_complete: Option<CompletionCallback>,
    ) -> Uuid {
        self.open_with(
            ModalKind::PostAttendance,
            |s| &mut s.post_attendance,
            payload,
            on_complete,
        )
    }

    pub fn open_post_treatment(
        &mut self,
        payload: PostTreatmentPayload,
        on_complete: Option<CompletionCallback>,
    ) -> Uuid {
        self.open_with(
            ModalKind::PostTreatment,
            |s| &mut s.post_treatment,
            payload,
            on_complete,
        )
    }

    pub fn open_absence_justification(
        &mut self,
        payload: AbsenceJustificationPayload,
        on_complete: Option<CompletionCallback>,
    ) -> Uuid {
        self.open_with(
            ModalKind::AbsenceJustification,
            |s| &mut s.absence_justification,
            payload,
            on_complete,
        )
    }

    pub fn open_cancellation(
        &mut self,
        payload: CancellationPayload,
        on_complete: Option<CompletionCallback>,
    ) -> Uuid {
        self.open_with(
            ModalKind::Cancellation,
            |s| &mut s.cancellation,
            payload,
            on_complete,
        )
    }

    pub fn open_multi_section(
        &mut self,
        payload: MultiSectionPayload,
        on_complete: Option<CompletionCallback>,
    ) -> Uuid {
        self.open_with(
            ModalKind::MultiSection,
            |s| &mut s.multi_section,
            payload,
            on_complete,
        )
    }

    pub fn open_new_patient_check_in(
        &mut self,
        payload: NewPatientCheckInPayload,
        on_complete: Option<CompletionCallback>,
    ) -> Uuid {
        self.open_with(
            ModalKind::NewPatientCheckIn,
            |s| &mut s.new_patient_check_in,
            payload,
            on_complete,
        )
    }

    pub fn open_end_of_day(
        &mut self,
        payload: EndOfDayPayload,
        on_complete: Option<CompletionCallback>,
    ) -> Uuid {
        self.open_with(ModalKind::EndOfDay, |s| &mut s.end_of_day, payload, on_complete)
    }

    /// Swap the absence under review without ending the interaction.
    pub fn update_absence_justification(&mut self, payload: AbsenceJustificationPayload) -> bool {
        if !self.is_open(ModalKind::AbsenceJustification) {
            return false;
        }
        self.container
            .set_state(|state| state.absence_justification.payload = Some(payload));
        true
    }

    /// Close without submitting. Fires the callback with `false`.
    pub fn close_modal(&mut self, kind: ModalKind) -> bool {
        self.finish(kind, false)
    }

    /// Close after the user submitted. Fires the callback with `success`.
    pub fn complete_modal(&mut self, kind: ModalKind, success: bool) -> bool {
        self.finish(kind, success)
    }

    fn finish(&mut self, kind: ModalKind, success: bool) -> bool {
        if !self.is_open(kind) {
            return false;
        }
        let callback = self.container.set_state(|state| state.reset(kind));
        tracing::debug!(modal = %kind, success, "modal closed");
        if let Some(callback) = callback {
            callback.invoke(success);
        }
        true
    }
}
