//! Upload controller.
//!
//! Phases move `Idle -> Ready -> Uploading -> Success | Error`. A cancelled
//! attempt returns to `Ready`; a failed one can be retried from `Error`.
//! Any phase can be reset to `Idle`, and a new selection re-enters `Ready`
//! or `Error` depending on validation.

use std::sync::{Arc, Mutex};

use driveup_protocol::UploadOutcome;
use driveup_relay::RelayError;
use driveup_transfer::{
    SelectedFile, ValidationResult, build_renamed_filename, sanitize_base_name, strip_extension,
    validate_file,
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::progress::ProgressSimulator;
use crate::types::{BlockReason, SessionError, UPLOAD_CANCELLED, UploadEvent, UploadPhase};
use crate::uploader::Uploader;

/// Shown instead of a final name when the rename sanitizes to nothing.
const INVALID_NAME_PREVIEW: &str = "invalid file name";
/// Shown instead of a final name when nothing is selected.
const NO_FILE_PREVIEW: &str = "-";

type InFlight = Arc<Mutex<Option<CancellationToken>>>;

/// Aborts the current attempt from another task.
#[derive(Clone)]
pub struct CancelHandle {
    in_flight: InFlight,
}

impl CancelHandle {
    /// Cancels the in-flight attempt. Returns `false` if there is none.
    pub fn cancel(&self) -> bool {
        if let Ok(guard) = self.in_flight.lock()
            && let Some(token) = guard.as_ref()
        {
            token.cancel();
            return true;
        }
        false
    }

    pub fn is_active(&self) -> bool {
        self.in_flight.lock().is_ok_and(|guard| guard.is_some())
    }
}

/// Owns the selection, rename field and upload phase for one file.
pub struct UploadController {
    uploader: Box<dyn Uploader>,
    progress: ProgressSimulator,
    phase: UploadPhase,
    file: Option<SelectedFile>,
    new_name: String,
    outcome: Option<UploadOutcome>,
    message: Option<String>,
    in_flight: InFlight,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
}

impl UploadController {
    pub fn new(uploader: impl Uploader + 'static, progress: ProgressSimulator) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        Self {
            uploader: Box::new(uploader),
            progress,
            phase: UploadPhase::Idle,
            file: None,
            new_name: String::new(),
            outcome: None,
            message: None,
            in_flight: Arc::new(Mutex::new(None)),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress.current()
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    pub fn outcome(&self) -> Option<&UploadOutcome> {
        self.outcome.as_ref()
    }

    /// Last upload error, or the cancellation notice.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Validation of the current selection; `None` when nothing is selected.
    pub fn validation(&self) -> Option<ValidationResult> {
        self.file.as_ref().map(|file| validate_file(Some(file)))
    }

    /// Replaces the selection and prefills the rename field with its base
    /// name. Any previous outcome or error is discarded.
    pub fn select_file(&mut self, file: SelectedFile) -> ValidationResult {
        let validation = validate_file(Some(&file));

        self.new_name = strip_extension(file.name()).to_string();
        self.outcome = None;
        self.message = None;
        self.progress.clear();

        let next = if validation.is_valid() {
            info!(file = %file.name(), size = file.size_bytes(), "file selected");
            UploadPhase::Ready
        } else {
            debug!(file = %file.name(), errors = ?validation.errors(), "selected file rejected");
            UploadPhase::Error
        };
        self.file = Some(file);
        self.set_phase(next);

        validation
    }

    pub fn set_new_name(&mut self, name: impl Into<String>) {
        self.new_name = name.into();
    }

    /// The filename the relay will receive.
    pub fn preview_final_name(&self) -> String {
        let Some(file) = &self.file else {
            return NO_FILE_PREVIEW.to_string();
        };
        let renamed = build_renamed_filename(&self.new_name, file.name());
        if renamed.is_empty() {
            INVALID_NAME_PREVIEW.to_string()
        } else {
            renamed
        }
    }

    /// First reason the upload is blocked, or `None` if it can start.
    pub fn disable_reason(&self) -> Option<BlockReason> {
        match self.phase {
            UploadPhase::Uploading => return Some(BlockReason::InProgress),
            UploadPhase::Success => return Some(BlockReason::AlreadyUploaded),
            _ => {}
        }

        let Some(file) = &self.file else {
            return Some(BlockReason::NoFileSelected);
        };
        if let Some(first) = validate_file(Some(file)).first_error() {
            return Some(BlockReason::Invalid(first.to_string()));
        }
        if self.new_name.trim().is_empty() {
            return Some(BlockReason::BlankName);
        }
        if name_unchanged(&self.new_name, file.name()) {
            return Some(BlockReason::UnchangedName);
        }
        None
    }

    pub fn can_upload(&self) -> bool {
        self.disable_reason().is_none()
    }

    /// Runs one upload attempt to completion.
    ///
    /// Always leaves the controller in `Success`, `Error` or (after a
    /// cancel) `Ready`. Dropping the returned future before it resolves
    /// counts as a cancel.
    pub async fn upload(&mut self) -> Result<UploadOutcome, SessionError> {
        if let Some(reason) = self.disable_reason() {
            debug!(%reason, "upload blocked");
            return Err(SessionError::Blocked(reason));
        }
        let Some(file) = self.file.clone() else {
            return Err(SessionError::Blocked(BlockReason::NoFileSelected));
        };

        let attempt = Uuid::new_v4();
        let cancel = CancellationToken::new();
        if let Ok(mut guard) = self.in_flight.lock() {
            *guard = Some(cancel.clone());
        }

        self.message = None;
        self.set_phase(UploadPhase::Uploading);
        self.progress.start();
        info!(%attempt, file = %file.name(), new_name = %self.new_name, "upload started");

        let mut attempt_guard = AttemptGuard {
            controller: self,
            attempt,
            completed: false,
        };
        let new_name = attempt_guard.controller.new_name.clone();
        let result = attempt_guard
            .controller
            .uploader
            .upload(file, new_name, cancel)
            .await;
        attempt_guard.completed = true;

        attempt_guard.controller.finish_attempt(attempt, result)
    }

    fn finish_attempt(
        &mut self,
        attempt: Uuid,
        result: Result<UploadOutcome, RelayError>,
    ) -> Result<UploadOutcome, SessionError> {
        if let Ok(mut guard) = self.in_flight.lock() {
            guard.take();
        }

        match result {
            Ok(outcome) => {
                self.progress.complete();
                info!(%attempt, file_id = %outcome.file_id, "upload succeeded");
                self.outcome = Some(outcome.clone());
                self.set_phase(UploadPhase::Success);
                self.emit(UploadEvent::Succeeded(outcome.clone()));
                Ok(outcome)
            }
            Err(e) if e.is_cancelled() => {
                self.progress.clear();
                info!(%attempt, "upload cancelled");
                self.message = Some(UPLOAD_CANCELLED.to_string());
                self.set_phase(UploadPhase::Ready);
                self.emit(UploadEvent::Cancelled);
                Err(SessionError::Upload(e))
            }
            Err(e) => {
                self.progress.clear();
                let message = e.to_string();
                error!(%attempt, kind = ?e.kind(), error = %message, "upload failed");
                self.message = Some(message.clone());
                self.set_phase(UploadPhase::Error);
                self.emit(UploadEvent::Failed(message));
                Err(SessionError::Upload(e))
            }
        }
    }

    /// Settles an attempt whose future was dropped mid-flight.
    fn abandon_attempt(&mut self, attempt: Uuid) {
        self.abort_in_flight();
        self.progress.clear();
        warn!(%attempt, "upload dropped before completion");
        self.message = Some(UPLOAD_CANCELLED.to_string());
        self.set_phase(UploadPhase::Ready);
        self.emit(UploadEvent::Cancelled);
    }

    /// Aborts any in-flight attempt and clears all state.
    pub fn reset(&mut self) {
        self.abort_in_flight();
        self.progress.clear();
        self.file = None;
        self.new_name.clear();
        self.outcome = None;
        self.message = None;
        self.set_phase(UploadPhase::Idle);
    }

    fn abort_in_flight(&self) {
        if let Ok(mut guard) = self.in_flight.lock()
            && let Some(token) = guard.take()
        {
            token.cancel();
        }
    }

    fn set_phase(&mut self, to: UploadPhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        debug!(%from, %to, "phase changed");
        self.emit(UploadEvent::PhaseChanged { from, to });
    }

    fn emit(&self, event: UploadEvent) {
        // Nobody listening, or a slow listener, never blocks the controller.
        let _ = self.events_tx.try_send(event);
    }
}

/// Returns the controller to `Ready` if an attempt never completes.
struct AttemptGuard<'a> {
    controller: &'a mut UploadController,
    attempt: Uuid,
    completed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.controller.abandon_attempt(self.attempt);
        }
    }
}

impl Drop for UploadController {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

/// Case-insensitive comparison of the sanitized rename against the
/// original base name.
fn name_unchanged(new_name: &str, original_name: &str) -> bool {
    sanitize_base_name(new_name).to_lowercase()
        == sanitize_base_name(strip_extension(original_name)).to_lowercase()
}
