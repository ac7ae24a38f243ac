//! Message sanitization
//!
//! - `SensitiveDataFilter`: ordered regex redaction with bounded match time
//! - `SecurityConfig`: immutable policy (size cap, writer cap, filter) that
//!   the logger swaps atomically
//! - `patterns`: built-in pattern sets for the filter presets

pub mod config;
pub mod filter;
pub mod patterns;

pub use config::{SecurityConfig, Sanitized};
pub use filter::{FilterOutcome, SensitiveDataFilter};

/// Replacement for anything the filter decides to hide
pub const REDACTED: &str = "[REDACTED]";

/// Appended to any text cut down to a size limit
pub const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

/// Truncate `text` to at most `max_len` bytes without splitting a character,
/// appending [`TRUNCATION_MARKER`]. Returns `None` when no cut was needed.
pub(crate) fn truncate_with_marker(text: &str, max_len: usize) -> Option<String> {
    if text.len() <= max_len {
        return None;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
    out.push_str(&text[..cut]);
    out.push_str(TRUNCATION_MARKER);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_with_marker("abc", 3), None);
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // 'é' is two bytes; cutting at 2 would split it
        let out = truncate_with_marker("aé", 2).unwrap();
        assert_eq!(out, format!("a{}", TRUNCATION_MARKER));
    }
}
