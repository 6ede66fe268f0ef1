//! Wire types shared between the relay client and its callers.
//!
//! The relay endpoint accepts one POST per file. Query parameters name the
//! file, the body carries its bytes in one of two [`PayloadMode`] shapes,
//! and the response is a loosely-typed JSON object read through
//! [`ResponsePayload`].

pub mod request;
pub mod response;
pub mod types;

// Re-export primary types for convenience.
pub use request::{BASE64_ENCODING, Base64Envelope, RequestBody, UploadQuery};
pub use response::ResponsePayload;
pub use types::{PayloadMode, ProtocolError, ShareTarget, UploadOutcome};
