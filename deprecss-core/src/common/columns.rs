//! Position conversions between byte offsets and editor coordinates.

/// Number of UTF-16 code units in `text`.
#[inline]
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Converts a byte offset within `line` to a UTF-16 column.
///
/// `byte` must lie on a char boundary; offsets past the end clamp to the line length.
pub fn utf16_column(line: &str, byte: usize) -> usize {
    let byte = byte.min(line.len());
    utf16_len(&line[..byte])
}

/// Byte offsets of line starts, for O(log n) offset → line lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(offset, _)| offset + 1),
        );
        Self { line_starts }
    }

    /// 1-based line containing `offset`.
    pub fn line_number(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }
}
