//! Rendering and caller-resolution collaborators
//!
//! The logger core treats rendering as an external concern: it hands a
//! sanitized [`Record`] to a [`Renderer`] and writes back whatever single line
//! comes out, followed by a newline. [`CallerResolver`] turns the call site
//! captured through `#[track_caller]` into an informational string.

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::panic::Location;
use std::path::{Component, Path};

/// A sanitized log record ready for rendering
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    pub message: &'a str,
    pub caller: Option<&'a str>,
    pub fields: Option<&'a LogContext>,
}

impl<'a> Record<'a> {
    pub fn new(level: LogLevel, message: &'a str) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            message,
            caller: None,
            fields: None,
        }
    }

    #[must_use]
    pub fn with_caller(mut self, caller: &'a str) -> Self {
        self.caller = Some(caller);
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: &'a LogContext) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// Produces one self-contained line (without trailing newline) per record
pub trait Renderer: Send + Sync {
    fn render(&self, record: &Record<'_>) -> String;
}

/// Resolves a captured call site into a display string
///
/// Resolution is informational only; returning an empty string is valid.
pub trait CallerResolver: Send + Sync {
    fn resolve(&self, location: &Location<'_>) -> String;
}

/// Default resolver: `parent_dir/file.rs:line`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationResolver;

impl CallerResolver for LocationResolver {
    fn resolve(&self, location: &Location<'_>) -> String {
        format!("{}:{}", short_path(location.file()), location.line())
    }
}

/// Keep only the last two normal components of a source path
fn short_path(file: &str) -> String {
    let parts: Vec<&str> = Path::new(file)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    let start = parts.len().saturating_sub(2);
    parts[start..].join("/")
}
