//! Line-oriented content search (literal + regex) over raw bytes.
//!
//! `search_lines()` picks memchr's `memmem` for plain literals and falls back
//! to `regex::bytes` for everything else. Content is never decoded, so files
//! that are not valid UTF-8 can still be searched.

pub mod grep;
pub mod literal;

use memchr::memmem;

use grep::GrepMatch;
use literal::is_literal_pattern;

/// Search mode: either SIMD-accelerated literal or full regex.
#[derive(Debug, Clone)]
pub enum SearchMode {
    /// Case-sensitive literal search using memchr.
    Literal(memmem::Finder<'static>),
    /// Multi-line regex, case folded when requested.
    Regex(regex::bytes::Regex),
}

/// Build a `SearchMode` from a pattern string.
///
/// `^` and `$` match at line boundaries.
pub fn build_search_mode(pattern: &str, ignore_case: bool) -> Result<SearchMode, regex::Error> {
    if is_literal_pattern(pattern) && !ignore_case {
        return Ok(SearchMode::Literal(
            memmem::Finder::new(pattern.as_bytes()).into_owned(),
        ));
    }
    let regex = regex::bytes::RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .multi_line(true)
        .build()?;
    Ok(SearchMode::Regex(regex))
}

impl SearchMode {
    /// Byte range of the first match in `line`.
    pub fn find(&self, line: &[u8]) -> Option<(usize, usize)> {
        match self {
            SearchMode::Literal(finder) => finder
                .find(line)
                .map(|start| (start, start + finder.needle().len())),
            SearchMode::Regex(regex) => regex.find(line).map(|m| (m.start(), m.end())),
        }
    }
}

/// Iterate the lines of `content` without their `\n` terminators.
///
/// A trailing newline does not produce an empty final line.
pub fn lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(content);
    std::iter::from_fn(move || {
        let current = rest?;
        if current.is_empty() {
            rest = None;
            return None;
        }
        match memchr::memchr(b'\n', current) {
            Some(nl) => {
                rest = Some(&current[nl + 1..]);
                Some(&current[..nl])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}

/// Search lines of content for matches. Returns up to `max_results` matches.
pub fn search_lines<'a>(
    content: &'a [u8],
    search_mode: &SearchMode,
    max_results: usize,
) -> Vec<GrepMatch<'a>> {
    lines(content)
        .enumerate()
        .filter_map(|(idx, line)| {
            search_mode.find(line).map(|(start, end)| GrepMatch {
                line: idx + 1,
                content: line,
                start,
                end,
            })
        })
        .take(max_results)
        .collect()
}
