//! Trigram extraction from byte content.

use ahash::AHashSet;

/// Ratio of null bytes above which a file is considered binary.
const BINARY_NULL_RATIO: f64 = 0.10;

/// Bytes sampled from the start of a file by [`is_binary`].
const BINARY_SAMPLE_LEN: usize = 8192;

/// A three-byte window of content.
pub type Trigram = [u8; 3];

/// Unique trigrams of `content`, sorted.
///
/// Content shorter than 3 bytes yields nothing. Callers are expected to
/// reject binary content before extracting.
pub fn extract_trigrams(content: &[u8]) -> Vec<Trigram> {
    if content.len() < 3 {
        return Vec::new();
    }

    let mut seen = AHashSet::new();
    for window in content.windows(3) {
        seen.insert([window[0], window[1], window[2]]);
    }

    let mut out: Vec<Trigram> = seen.into_iter().collect();
    out.sort_unstable();
    out
}

/// Trigrams of `content` with ASCII letters lowercased.
///
/// The builder stores these next to the case-sensitive trigrams so that a
/// case-insensitive query can be answered from folded literals. Only ASCII
/// is folded, so any encoding works; non-ASCII bytes pass through unchanged.
pub fn extract_lowercase_trigrams(content: &[u8]) -> Vec<Trigram> {
    extract_trigrams(&content.to_ascii_lowercase())
}

/// Whether byte `b` of a case-insensitive literal can only match itself or
/// its ASCII case twin.
///
/// Under Unicode simple case folding `k` also matches KELVIN SIGN and `s`
/// matches LONG S, and non-ASCII bytes have folds of other lengths, so
/// those bytes break a literal into separately queried runs.
pub fn is_ascii_fold_stable(b: u8) -> bool {
    b.is_ascii() && !matches!(b.to_ascii_lowercase(), b'k' | b's')
}

/// Check if content appears to be binary (high null-byte ratio).
pub fn is_binary(content: &[u8]) -> bool {
    if content.is_empty() {
        return false;
    }
    let sample = &content[..content.len().min(BINARY_SAMPLE_LEN)];
    let null_count = memchr::memchr_iter(0, sample).count();
    (null_count as f64 / sample.len() as f64) > BINARY_NULL_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_trigrams_basic() {
        let trigrams = extract_trigrams(b"hello");
        assert_eq!(trigrams, vec![*b"ell", *b"hel", *b"llo"]);
    }

    #[test]
    fn test_extract_trigrams_short() {
        assert!(extract_trigrams(b"ab").is_empty());
        assert!(extract_trigrams(b"").is_empty());
    }

    #[test]
    fn test_extract_trigrams_unicode() {
        // 9 bytes -> at most 7 windows
        let trigrams = extract_trigrams("日本語".as_bytes());
        assert!(!trigrams.is_empty());
        assert!(trigrams.len() <= 7);
    }

    #[test]
    fn test_extract_trigrams_deduplicates() {
        assert_eq!(extract_trigrams(b"aaaa"), vec![*b"aaa"]);
    }

    #[test]
    fn test_lowercase_trigrams() {
        let trigrams = extract_lowercase_trigrams(b"FOO");
        assert_eq!(trigrams, vec![*b"foo"]);
    }

    #[test]
    fn test_lowercase_trigrams_of_latin1_content() {
        // "caf\xe9 FOO" is not UTF-8; its ASCII part still folds.
        let trigrams = extract_lowercase_trigrams(b"caf\xe9 FOO");
        assert!(trigrams.contains(b"foo"));
        assert!(trigrams.contains(&[b'a', b'f', 0xe9]));
    }

    #[test]
    fn test_fold_stable_bytes() {
        assert!(is_ascii_fold_stable(b'a'));
        assert!(is_ascii_fold_stable(b'Z'));
        assert!(is_ascii_fold_stable(b'_'));
        for b in [b'k', b'K', b's', b'S', 0xc5, 0xbf] {
            assert!(!is_ascii_fold_stable(b), "{b:#x}");
        }
    }

    #[test]
    fn test_is_binary() {
        assert!(!is_binary(b"hello world\nthis is text"));
        assert!(!is_binary(b""));

        let mut data = vec![0u8; 50];
        data.extend_from_slice(b"short text");
        assert!(is_binary(&data));
    }
}
