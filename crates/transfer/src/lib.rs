//! Client-side upload pipeline up to the network boundary.
//!
//! A [`SelectedFile`] is gated by [`validate_file`], renamed with
//! [`build_renamed_filename`], and turned into a wire body by
//! [`encode_payload`].

mod encoding;
mod format;
mod types;
mod validation;

pub use encoding::{BASE64_CHUNK_SIZE, encode_base64, encode_payload, to_signed_bytes};
pub use format::{
    build_renamed_filename, extension, format_bytes, sanitize_base_name, strip_extension,
};
pub use types::{FileSource, SelectedFile};
pub use validation::{
    ALLOWED_MIME_TYPES, FileCategory, MAX_FILE_SIZE_BYTES, NO_FILE_SELECTED,
    SIZE_LIMIT_EXCEEDED, UNSUPPORTED_FORMAT, ValidationResult, accept_attribute, category_of,
    detect_mime_type, validate_file,
};

/// MIME type used when none is declared and none can be inferred.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,
}
