//! Pure filename and size helpers.

/// Characters that are not allowed in a file base name.
const RESERVED_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Formats a byte count for display (`1536.0` -> `"1.5 KB"`).
///
/// Non-positive and non-finite input renders as `"0 B"`. Scaled values of 10
/// or more, and plain bytes, are shown without decimals. Below 10 one
/// decimal is shown unless it is zero (`1024.0` -> `"1 KB"`).
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() || bytes <= 0.0 {
        return "0 B".into();
    }

    let mut size = bytes;
    let mut exponent = 0;
    while size >= 1024.0 && exponent < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        exponent += 1;
    }

    let decimals: usize = if size >= 10.0 || exponent == 0 { 0 } else { 1 };
    // Halves round up (1.25 -> 1.3); `{:.1}` alone would round to even.
    let scale = 10f64.powi(decimals as i32);
    let rounded = (size * scale).round() / scale;
    let mut number = format!("{rounded:.decimals$}");
    if let Some(whole) = number.strip_suffix(".0") {
        number.truncate(whole.len());
    }
    format!("{number} {}", SIZE_UNITS[exponent])
}

/// Lowercased extension after the last dot.
///
/// Returns an empty string for dotfiles (`.hidden`), trailing dots and names
/// without a dot.
pub fn extension(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(i) if i > 0 && i < file_name.len() - 1 => file_name[i + 1..].to_lowercase(),
        _ => String::new(),
    }
}

/// Name without its last extension. Dotfiles are returned unchanged.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(i) if i > 0 => &file_name[..i],
        _ => file_name,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Run {
    Reserved,
    Space,
}

/// Cleans a user-entered base name.
///
/// Trims, replaces each run of reserved characters with one `-`, and
/// collapses whitespace runs to one space. Leading or trailing hyphens are
/// kept.
pub fn sanitize_base_name(name: &str) -> String {
    let trimmed = name.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut run = None;

    for c in trimmed.chars() {
        if RESERVED_CHARS.contains(&c) {
            if run != Some(Run::Reserved) {
                out.push('-');
            }
            run = Some(Run::Reserved);
        } else if c.is_whitespace() {
            if run != Some(Run::Space) {
                out.push(' ');
            }
            run = Some(Run::Space);
        } else {
            out.push(c);
            run = None;
        }
    }

    out
}

/// Final filename: sanitized base plus the original's extension.
///
/// Empty when the requested base sanitizes to nothing.
pub fn build_renamed_filename(requested_base: &str, original_name: &str) -> String {
    let base = sanitize_base_name(requested_base);
    if base.is_empty() {
        return String::new();
    }

    let ext = extension(original_name);
    if ext.is_empty() {
        base
    } else {
        format!("{base}.{ext}")
    }
}
