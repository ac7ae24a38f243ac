//! Security policy applied to every message before rendering

use super::filter::SensitiveDataFilter;
use super::truncate_with_marker;
use crate::core::error::{LoggerError, Result};
use crate::core::log_context::LogContext;

pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 5 * 1024 * 1024;
pub const DEFAULT_MAX_WRITERS: usize = 100;

const MAX_MESSAGE_SIZE_LIMIT: usize = 100 * 1024 * 1024;
const MAX_WRITERS_LIMIT: usize = 1000;

/// Immutable security policy
///
/// The logger never edits a policy in place; it publishes a new one, so a
/// concurrent reader sees either the old or the new combination of limits
/// and filter, never a mix.
///
/// # Example
///
/// ```
/// use sentinel_log::security::{SecurityConfig, SensitiveDataFilter};
///
/// let policy = SecurityConfig::new(64 * 1024, 8)
///     .unwrap()
///     .with_filter(SensitiveDataFilter::full());
/// assert_eq!(policy.max_writers(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    max_message_size: usize,
    max_writers: usize,
    filter: Option<SensitiveDataFilter>,
}

/// A message after the policy has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    pub truncated: bool,
    pub filter_fallbacks: usize,
}

impl SecurityConfig {
    /// Validated limits with no filter attached
    pub fn new(max_message_size: usize, max_writers: usize) -> Result<Self> {
        if max_message_size == 0 || max_message_size > MAX_MESSAGE_SIZE_LIMIT {
            return Err(LoggerError::config(
                "SecurityConfig",
                format!(
                    "max_message_size must be between 1 and {} bytes, got {}",
                    MAX_MESSAGE_SIZE_LIMIT, max_message_size
                ),
            ));
        }
        if max_writers == 0 || max_writers > MAX_WRITERS_LIMIT {
            return Err(LoggerError::config(
                "SecurityConfig",
                format!(
                    "max_writers must be between 1 and {}, got {}",
                    MAX_WRITERS_LIMIT, max_writers
                ),
            ));
        }
        Ok(Self {
            max_message_size,
            max_writers,
            filter: None,
        })
    }

    #[must_use]
    pub fn with_filter(mut self, filter: SensitiveDataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn without_filter(mut self) -> Self {
        self.filter = None;
        self
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    pub fn max_writers(&self) -> usize {
        self.max_writers
    }

    pub fn filter(&self) -> Option<&SensitiveDataFilter> {
        self.filter.as_ref()
    }

    /// Size cap, then redaction, then control-character stripping
    pub fn sanitize(&self, message: &str) -> Sanitized {
        let truncated = truncate_with_marker(message, self.max_message_size);
        let was_truncated = truncated.is_some();
        let text = truncated.as_deref().unwrap_or(message);

        let (text, filter_fallbacks) = match self.filter {
            Some(ref filter) if filter.is_enabled() => {
                let outcome = filter.filter_with_outcome(text);
                (outcome.text, outcome.fallbacks)
            }
            _ => (text.to_string(), 0),
        };

        Sanitized {
            text: strip_control_chars(text),
            truncated: was_truncated,
            filter_fallbacks,
        }
    }

    /// Redact structured field values through the active filter
    pub fn sanitize_fields(&self, fields: LogContext) -> LogContext {
        match self.filter {
            Some(ref filter) if filter.is_enabled() => {
                fields.map_values(|key, value| filter.filter_field_value(key, value))
            }
            _ => fields,
        }
    }
}

impl Default for SecurityConfig {
    /// 5 MiB messages, 100 writers, basic filter
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_writers: DEFAULT_MAX_WRITERS,
            filter: Some(SensitiveDataFilter::basic()),
        }
    }
}

/// Remove control characters other than tab, CR and LF
fn strip_control_chars(text: String) -> String {
    if !text.chars().any(is_stripped) {
        return text;
    }
    text.chars().filter(|c| !is_stripped(*c)).collect()
}

#[inline]
fn is_stripped(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}
