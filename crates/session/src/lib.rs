//! Upload lifecycle for a single selected file.
//!
//! [`UploadController`] owns the selection, the rename field and the
//! current [`UploadPhase`]. While a request is in flight a
//! [`ProgressSimulator`] drives a cosmetic progress value.

pub mod controller;
pub mod progress;
pub mod types;
pub mod uploader;

pub use controller::{CancelHandle, UploadController};
pub use progress::{
    MAX_STEP, MIN_STEP, PROGRESS_CEILING, PROGRESS_COMPLETE, PROGRESS_FLOOR, ProgressSimulator,
    TICK_INTERVAL, advance,
};
pub use types::{BlockReason, SessionError, UPLOAD_CANCELLED, UploadEvent, UploadPhase};
pub use uploader::{UploadFuture, Uploader};
