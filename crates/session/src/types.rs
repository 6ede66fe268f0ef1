use std::fmt;

use driveup_protocol::UploadOutcome;
use driveup_relay::RelayError;

/// Message shown after a caller-initiated abort.
pub const UPLOAD_CANCELLED: &str = "upload cancelled";

/// Lifecycle phase of the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UploadPhase {
    /// Nothing selected.
    #[default]
    Idle,
    /// A valid file is selected, or the last attempt was cancelled.
    Ready,
    /// A request is in flight.
    Uploading,
    /// The last attempt succeeded.
    Success,
    /// The selection is invalid or the last attempt failed.
    Error,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Uploading => "uploading",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Notifications emitted by the controller.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    PhaseChanged { from: UploadPhase, to: UploadPhase },
    Succeeded(UploadOutcome),
    Failed(String),
    Cancelled,
}

/// Why an upload cannot start right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    NoFileSelected,
    /// First validation error of the selection.
    Invalid(String),
    BlankName,
    UnchangedName,
    InProgress,
    /// Only a reset or a new selection leaves `Success`.
    AlreadyUploaded,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFileSelected => f.write_str("Select a file first."),
            Self::Invalid(message) => f.write_str(message),
            Self::BlankName => f.write_str("A new file name is required."),
            Self::UnchangedName => {
                f.write_str("The new file name must differ from the original name.")
            }
            Self::InProgress => f.write_str("An upload is already in progress."),
            Self::AlreadyUploaded => {
                f.write_str("This file was already uploaded. Reset or select another file.")
            }
        }
    }
}

/// Errors returned by [`crate::UploadController::upload`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Blocked(BlockReason),

    #[error(transparent)]
    Upload(#[from] RelayError),
}

impl SessionError {
    /// True when the attempt was aborted by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Upload(e) if e.is_cancelled())
    }
}
