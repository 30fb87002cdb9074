//! Byte offset to (line, column) conversion.

use crate::types::{ColumnEncoding, Position};

/// Precomputed line starts for one source text.
///
/// Lookups binary search the line-start table, so converting an offset costs
/// `O(log lines)` plus the length of the line prefix being measured.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    /// Byte offsets of each line start (the first entry is always 0)
    line_starts: Vec<u32>,
}

impl<'a> LineIndex<'a> {
    /// Index the line starts of `text`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Sources larger than 4 GiB are not supported
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, byte)| byte == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self { text, line_starts }
    }

    /// Number of lines (an empty text has one empty line).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line containing `offset`.
    ///
    /// Offsets past the end of the text resolve to the last line.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn line_of(&self, offset: u32) -> u32 {
        // Number of line starts at or before the offset is the 1-based line
        self.line_starts.partition_point(|&start| start <= offset) as u32
    }

    /// 0-based column of `offset` within its line, in `encoding` units.
    #[must_use]
    pub fn column_of(&self, offset: u32, encoding: ColumnEncoding) -> u32 {
        let offset = self.clamp(offset);
        let line_start = self.line_start(self.line_of(offset)).unwrap_or(0);
        self.text
            .get(line_start as usize..offset as usize)
            .map_or(0, |prefix| encoding.measure(prefix))
    }

    /// Position of `offset`.
    #[must_use]
    pub fn position_of(&self, offset: u32, encoding: ColumnEncoding) -> Position {
        let offset = self.clamp(offset);
        Position::new(self.line_of(offset), self.column_of(offset, encoding))
    }

    /// Byte offset of `position`, or `None` if the line does not exist or
    /// the column lies past the end of the line.
    ///
    /// A column inside a multi-unit character resolves to that character's
    /// start.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn offset_of(&self, position: Position, encoding: ColumnEncoding) -> Option<u32> {
        let start = self.line_start(position.line)?;
        let end = self
            .line_start(position.line.saturating_add(1))
            .map_or(self.text.len(), |next| next as usize);
        let line = self.text.get(start as usize..end)?;
        let line = line.strip_suffix('\n').unwrap_or(line);

        let mut units = 0;
        for (byte, c) in line.char_indices() {
            let width = encoding.char_width(c);
            if position.column < units + width {
                return Some(start + byte as u32);
            }
            units += width;
        }
        (position.column == units).then(|| start + line.len() as u32)
    }

    /// Byte offset where a 1-based line starts.
    #[must_use]
    pub fn line_start(&self, line: u32) -> Option<u32> {
        let index = (line as usize).checked_sub(1)?;
        self.line_starts.get(index).copied()
    }

    /// Clamp to the text and floor to a character boundary.
    #[allow(clippy::cast_possible_truncation)]
    fn clamp(&self, offset: u32) -> u32 {
        let requested = offset as usize;
        let mut offset = requested.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        if offset != requested {
            tracing::trace!(requested, offset, "Clamped offset into the source text");
        }
        offset as u32
    }
}
