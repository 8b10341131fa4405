//! Helpers for sanitizing user-supplied names before they touch the
//! filesystem or enter tracing span attributes.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces an uploaded filename to a safe final path component.
///
/// Both `/` and `\` separators are stripped so `..\\..\\evil.txt` and
/// `../../evil.txt` collapse to `evil.txt`. Returns `None` when nothing usable
/// is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(char::from(0));

    if last.is_empty() || last == "." || last == ".." {
        return None;
    }

    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Lowercased extension of `name` including the leading dot, or an empty
/// string when there is none.
pub fn dotted_extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}
