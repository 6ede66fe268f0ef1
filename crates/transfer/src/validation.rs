//! Allow-list and size gate for selected files.

use std::fmt;

use crate::format::extension;
use crate::types::SelectedFile;

/// Largest accepted file: 30 MiB.
pub const MAX_FILE_SIZE_BYTES: u64 = 30 * 1024 * 1024;

pub const NO_FILE_SELECTED: &str = "No file selected.";

pub const UNSUPPORTED_FORMAT: &str = "Unsupported file format. Use Word (.doc/.docx), Excel \
     (.xls/.xlsx), PDF, or an image (.png/.jpg/.jpeg/.webp/.gif).";

pub const SIZE_LIMIT_EXCEEDED: &str = "File size exceeds the 30MB limit.";

/// Display category of a file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Word,
    Excel,
    Pdf,
    Image,
    Unknown,
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Word => "Word",
            Self::Excel => "Excel",
            Self::Pdf => "PDF",
            Self::Image => "Image",
            Self::Unknown => "Unknown",
        })
    }
}

/// Accepted extensions, their category and canonical MIME type.
const ALLOWED_EXTENSIONS: &[(&str, FileCategory, &str)] = &[
    ("doc", FileCategory::Word, "application/msword"),
    (
        "docx",
        FileCategory::Word,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", FileCategory::Excel, "application/vnd.ms-excel"),
    (
        "xlsx",
        FileCategory::Excel,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("pdf", FileCategory::Pdf, "application/pdf"),
    ("png", FileCategory::Image, "image/png"),
    ("jpg", FileCategory::Image, "image/jpeg"),
    ("jpeg", FileCategory::Image, "image/jpeg"),
    ("webp", FileCategory::Image, "image/webp"),
    ("gif", FileCategory::Image, "image/gif"),
];

/// Accepted declared MIME types.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
];

/// Outcome of [`validate_file`]. Valid exactly when there are no errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages in check order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

fn lookup(file_name: &str) -> Option<(FileCategory, &'static str)> {
    let ext = extension(file_name);
    ALLOWED_EXTENSIONS
        .iter()
        .find(|(e, _, _)| *e == ext)
        .map(|(_, category, mime)| (*category, *mime))
}

/// Category for display. Unrecognised extensions are [`FileCategory::Unknown`].
pub fn category_of(file_name: &str) -> FileCategory {
    lookup(file_name).map_or(FileCategory::Unknown, |(category, _)| category)
}

/// Canonical MIME type for an allow-listed extension.
pub fn detect_mime_type(file_name: &str) -> Option<&'static str> {
    lookup(file_name).map(|(_, mime)| mime)
}

/// File-picker accept list, e.g. `.doc,.docx,...,.gif`.
pub fn accept_attribute() -> String {
    ALLOWED_EXTENSIONS
        .iter()
        .map(|(ext, _, _)| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Checks a selection against the format allow-lists and the size ceiling.
///
/// Both checks always run. A bad extension and a bad MIME type produce a
/// single format error between them.
pub fn validate_file(file: Option<&SelectedFile>) -> ValidationResult {
    let Some(file) = file else {
        return ValidationResult {
            errors: vec![NO_FILE_SELECTED.to_string()],
        };
    };

    let mut errors = Vec::new();

    let has_valid_extension = lookup(file.name()).is_some();
    let has_valid_mime_type = ALLOWED_MIME_TYPES.contains(&file.mime_type());
    if !has_valid_extension || !has_valid_mime_type {
        errors.push(UNSUPPORTED_FORMAT.to_string());
    }

    if file.size_bytes() > MAX_FILE_SIZE_BYTES {
        errors.push(SIZE_LIMIT_EXCEEDED.to_string());
    }

    ValidationResult { errors }
}
