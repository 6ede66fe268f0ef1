use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::response::ResponsePayload;

/// Errors produced while interpreting wire values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unknown payload mode: {0} (expected \"base64\" or \"byteArray\")")]
    UnknownPayloadMode(String),
}

/// How file bytes are carried in the request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadMode {
    /// JSON envelope object with a base64 `data` field.
    #[default]
    #[serde(rename = "base64")]
    Base64,
    /// Bare JSON array of signed bytes.
    #[serde(rename = "byteArray")]
    ByteArray,
}

impl PayloadMode {
    /// Wire name used in the `mode` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base64 => "base64",
            Self::ByteArray => "byteArray",
        }
    }

    /// Parses a configured mode, treating anything but `byteArray` as base64.
    pub fn parse_lenient(value: &str) -> Self {
        if value == "byteArray" {
            Self::ByteArray
        } else {
            Self::Base64
        }
    }
}

impl fmt::Display for PayloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadMode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base64" => Ok(Self::Base64),
            "byteArray" | "bytearray" | "byte-array" => Ok(Self::ByteArray),
            other => Err(ProtocolError::UnknownPayloadMode(other.to_string())),
        }
    }
}

/// Result of a successful upload round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub success: bool,
    pub file_name: String,
    /// Empty when the relay did not report one.
    pub file_id: String,
    /// Empty when the relay did not report one.
    pub file_url: String,
    /// Parsed response body as received.
    pub raw: serde_json::Value,
}

impl UploadOutcome {
    /// Builds an outcome from an accepted response.
    ///
    /// The relay's `filename` wins over the locally computed name.
    pub fn from_response(payload: ResponsePayload, renamed_filename: &str) -> Self {
        Self {
            success: true,
            file_name: payload
                .filename()
                .unwrap_or_else(|| renamed_filename.to_string()),
            file_id: payload.file_id().unwrap_or_default(),
            file_url: payload.file_url().unwrap_or_default(),
            raw: payload.into_value(),
        }
    }

    /// What a front end should offer the user after success.
    pub fn share_target(&self) -> Option<ShareTarget<'_>> {
        if !self.file_url.is_empty() {
            Some(ShareTarget::OpenUrl(&self.file_url))
        } else if !self.file_id.is_empty() {
            Some(ShareTarget::CopyFileId(&self.file_id))
        } else {
            None
        }
    }
}

/// Follow-up action for an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareTarget<'a> {
    /// Open the stored file in a browser.
    OpenUrl(&'a str),
    /// No URL was returned; the id can be copied instead.
    CopyFileId(&'a str),
}
