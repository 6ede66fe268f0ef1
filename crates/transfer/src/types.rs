use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::validation::detect_mime_type;
use crate::{FALLBACK_MIME_TYPE, TransferError};

/// Where a selected file's bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file on disk, read when the upload starts.
    Path(PathBuf),
    /// Bytes already held in memory.
    Memory(Arc<[u8]>),
}

/// A file chosen for upload.
///
/// Immutable once created: a new selection replaces the whole value.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    mime_type: String,
    size_bytes: u64,
    source: FileSource,
}

impl SelectedFile {
    /// Wraps in-memory bytes. The size is the buffer length.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: data.len() as u64,
            source: FileSource::Memory(data),
        }
    }

    /// Selects a file on disk without reading it.
    ///
    /// The declared MIME type is used when given; otherwise it is inferred
    /// from the extension, falling back to `application/octet-stream`.
    pub async fn from_path(
        path: impl AsRef<Path>,
        mime_type: Option<&str>,
    ) -> Result<Self, TransferError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_type
            .filter(|m| !m.is_empty())
            .or_else(|| detect_mime_type(&name))
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();

        Ok(Self {
            name,
            mime_type,
            size_bytes: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Original file name including its extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type declared for the file.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn source(&self) -> &FileSource {
        &self.source
    }

    /// Reads the whole file into memory.
    ///
    /// Returns [`TransferError::Cancelled`] if `cancel` fires first. The
    /// source is never modified.
    pub async fn read_all(&self, cancel: &CancellationToken) -> Result<Arc<[u8]>, TransferError> {
        match &self.source {
            FileSource::Memory(data) => {
                if cancel.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }
                Ok(Arc::clone(data))
            }
            FileSource::Path(path) => {
                let data = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(TransferError::Cancelled),
                    result = tokio::fs::read(path) => result?,
                };
                debug!(file = %path.display(), bytes = data.len(), "file read into memory");
                Ok(data.into())
            }
        }
    }
}
