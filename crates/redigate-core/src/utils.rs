//! Common utility functions

/// Trimmed form of a key, or `None` when it is empty or whitespace-only
pub fn normalize_key(key: &str) -> Option<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
