//! Outbound request shapes.

use serde::{Deserialize, Serialize};

use crate::types::PayloadMode;

/// Value of the `encoding` field in a base64 envelope.
pub const BASE64_ENCODING: &str = "base64";

/// JSON object sent in base64 mode.
///
/// The API key travels here rather than in the URL for this mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base64Envelope {
    pub filename: String,
    pub mime_type: String,
    pub encoding: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Base64Envelope {
    /// Creates an envelope. An empty API key is omitted from the body.
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: String,
        api_key: Option<&str>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            encoding: BASE64_ENCODING.to_string(),
            data,
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
        }
    }
}

/// Request body, serialized according to its variant.
///
/// `Base64` becomes a JSON object, `ByteArray` a bare JSON array with no
/// wrapping object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    Base64(Base64Envelope),
    ByteArray(Vec<i8>),
}

impl RequestBody {
    /// The payload mode this body was built for.
    pub fn mode(&self) -> PayloadMode {
        match self {
            Self::Base64(_) => PayloadMode::Base64,
            Self::ByteArray(_) => PayloadMode::ByteArray,
        }
    }

    /// Serializes the body to the JSON text that goes on the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Query parameters appended to the relay URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadQuery<'a> {
    pub filename: &'a str,
    pub mime_type: &'a str,
    pub mode: PayloadMode,
    pub api_key: Option<&'a str>,
}

impl<'a> UploadQuery<'a> {
    /// Builds the query for one upload.
    ///
    /// The API key is only placed in the URL for byte-array mode, whose body
    /// is a bare array with nowhere else to carry it. Base64 mode sends the
    /// key inside the envelope instead.
    pub fn new(
        filename: &'a str,
        mime_type: &'a str,
        mode: PayloadMode,
        api_key: Option<&'a str>,
    ) -> Self {
        let api_key = match mode {
            PayloadMode::ByteArray => api_key.filter(|k| !k.is_empty()),
            PayloadMode::Base64 => None,
        };
        Self {
            filename,
            mime_type,
            mode,
            api_key,
        }
    }

    /// Key/value pairs in wire order.
    pub fn pairs(&self) -> Vec<(&'static str, &'a str)> {
        let mut pairs = vec![
            ("filename", self.filename),
            ("mimeType", self.mime_type),
            ("mode", self.mode.as_str()),
        ];
        if let Some(key) = self.api_key {
            pairs.push(("apiKey", key));
        }
        pairs
    }
}
