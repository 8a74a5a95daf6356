//! Grep match result type.

/// One matching line, borrowed from the searched content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrepMatch<'a> {
    /// 1-based line number.
    pub line: usize,
    /// The line without its terminating newline.
    pub content: &'a [u8],
    /// Byte range of the first match within `content`.
    pub start: usize,
    pub end: usize,
}

impl<'a> GrepMatch<'a> {
    pub fn match_bytes(&self) -> &'a [u8] {
        &self.content[self.start..self.end]
    }
}
