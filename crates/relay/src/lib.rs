//! Relay upload client.
//!
//! Sends one renamed file to a configured HTTP endpoint that stores it in
//! cloud storage and answers with a JSON descriptor. Requests are bounded
//! by a timeout composed with an optional caller-supplied
//! [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod client;
pub mod config;
pub mod error;
pub mod signal;

pub use client::{RelayClient, UploadRequest, build_request_url};
pub use config::{DEFAULT_TIMEOUT, RelayConfig};
pub use error::{ErrorKind, GENERIC_REJECTION, RelayError};
pub use signal::{RequestSignal, SignalReason};
