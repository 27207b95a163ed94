/// The one "no usable text" test, shared by classification, walking and
/// reporting. Blank strings and the literal `nan` (how dataframe tooling
/// round-trips an empty CSV cell) are both missing.
pub fn is_missing_text(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// Prefix of `s` holding at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
