//! CLI input validation functions.
//!
//! Used by clap's `value_parser` so bad input is rejected at parse time.

use crate::domain::{MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};

/// Validate item ID prefix format.
///
/// Delegates to [`crate::config::validate_prefix`] after trimming.
pub fn validate_prefix(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    crate::config::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate an item ID of the form `prefix-suffix` (e.g. `road-a3f8`).
pub fn validate_item_id(s: &str) -> Result<String, String> {
    validate_id(s, "Item")
}

/// Validate a dependency edge ID (e.g. `dep-k2x9`).
pub fn validate_edge_id(s: &str) -> Result<String, String> {
    validate_id(s, "Dependency")
}

fn validate_id(s: &str, kind: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err(format!("{kind} ID cannot be empty"));
    }

    let Some((prefix, suffix)) = s.split_once('-') else {
        return Err(format!(
            "Invalid {} ID format: '{s}'. Expected format: prefix-suffix (e.g., road-a3f8)",
            kind.to_lowercase()
        ));
    };

    validate_prefix(prefix).map_err(|e| format!("{kind} ID {}", e.to_lowercase()))?;

    if suffix.is_empty() {
        return Err(format!("{kind} ID suffix cannot be empty"));
    }

    // Equivalent to ^[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*$
    if !suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(format!("{kind} ID suffix must contain only alphanumerics and hyphens"));
    }
    if suffix.starts_with('-') || suffix.ends_with('-') || suffix.contains("--") {
        return Err(format!(
            "{kind} ID suffix cannot start or end with a hyphen or contain consecutive hyphens"
        ));
    }

    Ok(s.to_string())
}

fn is_forbidden_control(c: char, allow_newlines: bool) -> bool {
    let code = u32::from(c);
    let allowed = c == '\t' || (allow_newlines && (c == '\n' || c == '\r'));
    ((code < 0x20) && !allowed) || (0x7F..=0x9F).contains(&code)
}

/// Validate a single-line title of at most `MAX_TITLE_LENGTH` characters.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    let length = s.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters, got {length} characters"
        ));
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Title cannot contain newline characters".to_string());
    }

    if let Some(pos) = s.chars().position(|c| is_forbidden_control(c, false)) {
        return Err(format!("Title contains invalid control character at position {pos}"));
    }

    Ok(s.to_string())
}

/// Validate a description: multi-line allowed, control characters are not.
pub fn validate_description(s: &str) -> Result<String, String> {
    let length = s.chars().count();
    if length > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters, got {length} characters"
        ));
    }
    if let Some(pos) = s.chars().position(|c| is_forbidden_control(c, true)) {
        return Err(format!(
            "Description contains invalid control character at position {pos}"
        ));
    }
    Ok(s.to_string())
}

/// Validate a short label such as a branch, milestone or owner name.
pub fn validate_label(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Value cannot be empty".to_string());
    }
    if let Some(pos) = s.chars().position(|c| is_forbidden_control(c, false)) {
        return Err(format!("Value contains invalid control character at position {pos}"));
    }
    Ok(s.to_string())
}
