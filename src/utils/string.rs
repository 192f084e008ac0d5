/// Find the largest valid UTF-8 boundary at or before the given byte index.
/// Returns the byte index that is safe to slice at.
#[inline]
fn safe_byte_boundary(s: &str, max_bytes: usize) -> usize {
    if max_bytes >= s.len() {
        return s.len();
    }
    s.char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max_bytes)
        .last()
        .unwrap_or(0)
}

/// Borrow the first `max_chars` characters of a string.
///
/// Used for the bounded source snippets sent to the model: the budget is
/// counted in characters, independent of line or token boundaries.
#[inline]
pub fn char_prefix(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string with a marker if it exceeds the maximum length (UTF-8 safe).
///
/// The max_len is in bytes, but truncation respects UTF-8 character
/// boundaries to avoid panics with multi-byte characters.
#[inline]
pub fn truncate_with_marker(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let boundary = safe_byte_boundary(s, max_len);
        format!("{}...[truncated]", &s[..boundary])
    }
}

/// Truncate a string at a word boundary with "..." suffix (UTF-8 safe).
///
/// Attempts to truncate at whitespace, period, or comma for cleaner output.
/// Falls back to character boundary truncation if no word boundary is found.
#[inline]
pub fn truncate_at_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let truncate_at = safe_byte_boundary(s, max_len.saturating_sub(3));
    let boundary = s[..truncate_at]
        .rfind(|c: char| c.is_whitespace() || c == '.' || c == ',')
        .unwrap_or(truncate_at);
    format!("{}...", &s[..boundary])
}
