//! Relay error types.

use std::time::Duration;

use driveup_transfer::TransferError;

/// Generic message for a rejected upload whose body explains nothing.
pub const GENERIC_REJECTION: &str = "The relay could not process the upload.";

/// Coarse classification used to pick the next UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Endpoint not configured; needs operator action.
    ConfigurationMissing,
    /// Bad extension, MIME type or size.
    ValidationFailed,
    /// Empty or unchanged rename.
    RenameInvalid,
    /// Network error, timeout or local read failure.
    TransportFailure,
    /// Aborted by the caller. Not a failure.
    Cancelled,
    /// The relay answered with a non-2xx status or an `error` field.
    RemoteRejected,
}

/// Errors produced by the relay client.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay endpoint is not configured; set DRIVEUP_ENDPOINT_URL")]
    ConfigurationMissing,

    #[error("invalid relay endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("{}", .0.join(" "))]
    ValidationFailed(Vec<String>),

    #[error("invalid new file name: {0}")]
    RenameInvalid(String),

    #[error(transparent)]
    Read(TransferError),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("upload cancelled")]
    Cancelled,

    #[error("{message}")]
    Rejected { status: u16, message: String },
}

impl From<TransferError> for RelayError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Cancelled => Self::Cancelled,
            other => Self::Read(other),
        }
    }
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationMissing | Self::InvalidEndpoint(_) => ErrorKind::ConfigurationMissing,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::RenameInvalid(_) => ErrorKind::RenameInvalid,
            Self::Read(_) | Self::Encode(_) | Self::Transport(_) | Self::Timeout(_) => {
                ErrorKind::TransportFailure
            }
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Rejected { .. } => ErrorKind::RemoteRejected,
        }
    }

    /// True only for caller-initiated aborts. Timeouts are failures.
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}
