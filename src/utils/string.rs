/// Truncate a string to maximum character count (UTF-8 safe).
///
/// Adds "..." suffix if truncated.
#[inline]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", truncated)
}

/// Filesystem-safe slug for a scan target.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single dash. Used for report and event-log file names.
pub fn target_slug(target: &str) -> String {
    let mut slug = String::with_capacity(target.len());
    for c in target.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "target".to_string()
    } else {
        trimmed.to_string()
    }
}
