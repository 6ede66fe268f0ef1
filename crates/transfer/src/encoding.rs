//! Binary-to-transport encodings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use driveup_protocol::{Base64Envelope, PayloadMode, RequestBody};
use tokio_util::sync::CancellationToken;

use crate::TransferError;
use crate::types::SelectedFile;

/// Bytes encoded per base64 pass. A multiple of 3 so only the final chunk
/// can carry padding.
pub const BASE64_CHUNK_SIZE: usize = 0x8000 - 0x8000 % 3;

/// Standard base64 of `bytes`, built chunk by chunk.
///
/// The output is identical to encoding the whole buffer at once.
pub fn encode_base64(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(BASE64_CHUNK_SIZE) {
        STANDARD.encode_string(chunk, &mut out);
    }
    out
}

/// Reinterprets each byte as a two's-complement `i8`, preserving order.
pub fn to_signed_bytes(bytes: &[u8]) -> Vec<i8> {
    bytes.iter().map(|&b| b as i8).collect()
}

/// Reads `file` fully and builds the request body for `mode`.
///
/// The whole file is buffered before anything is returned.
pub async fn encode_payload(
    file: &SelectedFile,
    renamed_filename: &str,
    mode: PayloadMode,
    api_key: Option<&str>,
    cancel: &CancellationToken,
) -> Result<RequestBody, TransferError> {
    let bytes = file.read_all(cancel).await?;

    Ok(match mode {
        PayloadMode::Base64 => RequestBody::Base64(Base64Envelope::new(
            renamed_filename,
            file.mime_type(),
            encode_base64(&bytes),
            api_key,
        )),
        PayloadMode::ByteArray => RequestBody::ByteArray(to_signed_bytes(&bytes)),
    })
}
