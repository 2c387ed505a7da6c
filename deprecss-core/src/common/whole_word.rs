//! Whole-class matching.
//!
//! Class names are hyphen-delimited, so a "word" here is a run of
//! `[A-Za-z0-9_-]`: `tw-badge` must not match inside `tw-badge-large`,
//! nor inside `my-tw-badge`.

/// Returns true for characters that extend a class token.
#[inline]
pub fn is_class_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Byte offsets of every whole-word occurrence of `class_name` in `haystack`.
///
/// Occurrences are reported left to right and never overlap. A candidate
/// that fails the boundary check is skipped by one character, so a later
/// valid occurrence starting inside it is still found.
pub fn find_whole_class(haystack: &str, class_name: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    if class_name.is_empty() {
        return positions;
    }

    let mut from = 0;
    while let Some(rel) = haystack[from..].find(class_name) {
        let start = from + rel;
        let end = start + class_name.len();

        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_class_char(c));
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_class_char(c));

        if before_ok && after_ok {
            positions.push(start);
            from = end;
        } else {
            // Advance past the first character of the rejected candidate.
            let step = haystack[start..].chars().next().map_or(1, char::len_utf8);
            from = start + step;
        }

        if from >= haystack.len() {
            break;
        }
    }

    positions
}
