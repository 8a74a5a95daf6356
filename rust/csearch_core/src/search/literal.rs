//! Literal pattern detection for the memchr search path.

/// Check if a pattern is a literal string (no regex metacharacters).
pub fn is_literal_pattern(pattern: &str) -> bool {
    !pattern.is_empty()
        && !pattern.chars().any(|c| {
            matches!(
                c,
                '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\'
            )
        })
}
