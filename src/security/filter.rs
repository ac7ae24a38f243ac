//! Pattern-based sensitive data filter
//!
//! Patterns are applied in insertion order, each replacing every match with
//! [`REDACTED`]. Matching against inputs of [`INLINE_MATCH_THRESHOLD`] bytes
//! or more runs on a worker thread bound to a deadline; if the deadline
//! passes or the match panics, the whole input is replaced with
//! [`REDACTED`]. Over-redaction is preferred to leaking.
//!
//! The `regex` crate guarantees linear-time matching, so the deadline is not
//! needed to stop catastrophic backtracking. It still bounds latency on very
//! large inputs and gives the filter a fail-closed path for internal faults.
//!
//! # Example
//!
//! ```
//! use sentinel_log::security::{SensitiveDataFilter, REDACTED};
//!
//! let filter = SensitiveDataFilter::basic();
//! let out = filter.filter("login failed: password=hunter2");
//! assert!(out.contains(REDACTED));
//! assert!(!out.contains("hunter2"));
//! ```

use super::patterns::{BASIC_PATTERNS, EXTENDED_PATTERNS, SENSITIVE_KEYWORDS};
use super::{truncate_with_marker, REDACTED};
use crate::core::error::{LoggerError, Result};
use crate::core::log_context::FieldValue;
use crossbeam_channel::bounded;
use parking_lot::RwLock;
use regex::{NoExpand, Regex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Default cap on filtered input; longer text is truncated first
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 256 * 1024;

/// Default deadline for a single pattern match
pub const DEFAULT_PATTERN_TIMEOUT: Duration = Duration::from_millis(50);

/// Inputs shorter than this are matched on the calling thread
pub const INLINE_MATCH_THRESHOLD: usize = 512;

/// Result of filtering with fallback accounting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub text: String,
    /// Patterns whose match timed out or faulted and fell back to full redaction
    pub fallbacks: usize,
}

#[derive(Debug)]
pub struct SensitiveDataFilter {
    patterns: RwLock<Vec<Regex>>,
    enabled: AtomicBool,
    max_input_length: usize,
    timeout: Duration,
}

impl SensitiveDataFilter {
    /// An enabled filter with no patterns
    pub fn new() -> Self {
        Self {
            patterns: RwLock::new(Vec::new()),
            enabled: AtomicBool::new(true),
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            timeout: DEFAULT_PATTERN_TIMEOUT,
        }
    }

    /// Credentials, bearer tokens, private keys, card numbers and SSNs
    pub fn basic() -> Self {
        Self::with_builtin(BASIC_PATTERNS.iter())
    }

    /// The basic set plus emails, IPv4 addresses, JWTs, provider keys and
    /// connection-string credentials
    pub fn full() -> Self {
        Self::with_builtin(BASIC_PATTERNS.iter().chain(EXTENDED_PATTERNS))
    }

    fn with_builtin<'a>(patterns: impl Iterator<Item = &'a &'static str>) -> Self {
        // built-in patterns are compiled in tests; skip rather than panic
        let compiled = patterns.filter_map(|p| Regex::new(p).ok()).collect();
        Self {
            patterns: RwLock::new(compiled),
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_max_input_length(mut self, max_input_length: usize) -> Self {
        self.max_input_length = max_input_length;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Compile and append a pattern. On failure the filter is unchanged.
    pub fn add_pattern(&self, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern).map_err(|source| LoggerError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.patterns.write().push(regex);
        Ok(())
    }

    /// Append patterns in order, stopping at the first compile failure.
    /// Patterns added before the failure are kept.
    pub fn add_patterns<I, S>(&self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.add_pattern(pattern.as_ref())?;
        }
        Ok(())
    }

    pub fn clear_patterns(&self) {
        self.patterns.write().clear();
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn max_input_length(&self) -> usize {
        self.max_input_length
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Redact every pattern match in `text`
    pub fn filter(&self, text: &str) -> String {
        self.filter_with_outcome(text).text
    }

    /// Like [`filter`](Self::filter), also reporting how many patterns fell
    /// back to full redaction
    pub fn filter_with_outcome(&self, text: &str) -> FilterOutcome {
        if text.is_empty() || !self.is_enabled() {
            return FilterOutcome {
                text: text.to_string(),
                fallbacks: 0,
            };
        }

        let mut current = truncate_with_marker(text, self.max_input_length)
            .unwrap_or_else(|| text.to_string());

        // Snapshot so a slow match never holds the lock against add_pattern
        let patterns = self.patterns.read().clone();

        let mut fallbacks = 0;
        for regex in &patterns {
            let (next, fell_back) = self.apply_pattern(regex, current);
            current = next;
            if fell_back {
                fallbacks += 1;
            }
        }

        FilterOutcome {
            text: current,
            fallbacks,
        }
    }

    /// Redact a structured field value
    ///
    /// Keys naming a sensitive concept hide the whole value; other string
    /// values go through [`filter`](Self::filter); non-strings pass through.
    pub fn filter_field_value(&self, key: &str, value: FieldValue) -> FieldValue {
        if !self.is_enabled() {
            return value;
        }
        if is_sensitive_key(key) {
            return FieldValue::String(REDACTED.to_string());
        }
        match value {
            FieldValue::String(s) => FieldValue::String(self.filter(&s)),
            other => other,
        }
    }

    fn apply_pattern(&self, regex: &Regex, input: String) -> (String, bool) {
        if input.len() < INLINE_MATCH_THRESHOLD {
            return match catch_unwind(AssertUnwindSafe(|| replace_matches(regex, input))) {
                Ok(out) => (out, false),
                Err(_) => (REDACTED.to_string(), true),
            };
        }

        let (tx, rx) = bounded(1);
        let regex = regex.clone();
        let spawned = thread::Builder::new()
            .name("redact-match".to_string())
            .spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(|| replace_matches(&regex, input)));
                // Receiver may have given up already
                let _ = tx.send(result.ok());
            });

        if spawned.is_err() {
            return (REDACTED.to_string(), true);
        }

        match rx.recv_timeout(self.timeout) {
            Ok(Some(out)) => (out, false),
            _ => (REDACTED.to_string(), true),
        }
    }
}

fn replace_matches(regex: &Regex, input: String) -> String {
    if regex.is_match(&input) {
        regex.replace_all(&input, NoExpand(REDACTED)).into_owned()
    } else {
        input
    }
}

/// Whether a field key names something that must never be logged in clear
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

impl Default for SensitiveDataFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SensitiveDataFilter {
    /// Deep copy with an independent enabled flag and pattern list
    fn clone(&self) -> Self {
        Self {
            patterns: RwLock::new(self.patterns.read().clone()),
            enabled: AtomicBool::new(self.is_enabled()),
            max_input_length: self.max_input_length,
            timeout: self.timeout,
        }
    }
}
