//! Half-open byte ranges within a document buffer.

use std::ops::Range;

/// A half-open byte range within the document a token was produced from.
///
/// Spans never extend past the end of their source document, and spans of
/// different kinds may overlap (a step span contains its parameter spans).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Span {
    /// Byte offset of the first character covered by the span.
    pub offset: usize,
    /// Number of bytes covered.
    pub len: usize,
}

impl Span {
    /// Create a span covering `len` bytes starting at `offset`.
    #[must_use]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Byte offset one past the last character covered.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// The covered range, suitable for slicing the source text.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// The text covered by this span, or `None` when the span falls outside
    /// `text` or splits a UTF-8 character boundary.
    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.range())
    }
}

#[cfg(test)]
mod tests {
    use super::Span;

    #[test]
    fn end_is_offset_plus_len() {
        assert_eq!(Span::new(3, 4).end(), 7);
    }

    #[test]
    fn slice_returns_covered_text() {
        assert_eq!(Span::new(2, 5).slice("# Title"), Some("Title"));
    }

    #[test]
    fn slice_out_of_bounds_is_none() {
        assert_eq!(Span::new(4, 10).slice("short"), None);
    }
}
