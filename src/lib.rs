//! # Sentinel Log
//!
//! An in-process logging core: synchronous, thread-safe, and strict about
//! what it lets reach disk.
//!
//! ## Features
//!
//! - **Security policy**: size cap, regex redaction with bounded match time,
//!   and control-character stripping on every record
//! - **Hot reconfiguration**: level and policy swap atomically while other
//!   threads keep logging
//! - **Writers**: size/age rotating files with gzip backups, batching
//!   buffers, and fan-out with partial-failure reporting
//! - **Clean shutdown**: background work is tracked and joined with a
//!   bounded grace period
//!
//! ## Example
//!
//! ```no_run
//! use sentinel_log::prelude::*;
//!
//! let file = RotatingFileWriter::new(
//!     "/var/log/app/app.log",
//!     RotationConfig::new().with_max_size_mb(50).with_compression(true),
//! )?;
//!
//! let logger = Logger::builder()
//!     .min_level(LogLevel::Debug)
//!     .writer(file)
//!     .build()?;
//!
//! logger.info("user login password=hunter2"); // password value is redacted
//! logger.close()?;
//! # Ok::<(), LoggerError>(())
//! ```

pub mod core;
pub mod macros;
pub mod security;
pub mod writers;

pub mod prelude {
    pub use crate::core::{
        FieldValue, LogContext, LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics,
        OutputFormat, Result, TimestampFormat, Writer, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::security::{SecurityConfig, SensitiveDataFilter};
    pub use crate::writers::{
        BufferedConfig, BufferedWriter, ConsoleWriter, MultiWriter, RotatingFileWriter,
        RotationConfig,
    };
}

pub use core::{
    CallerResolver, FieldValue, FormatRenderer, LocationResolver, LogContext, LogLevel, Logger,
    LoggerBuilder, LoggerError, LoggerMetrics, OutputFormat, Record, Renderer, Result,
    TimestampFormat, Writer, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use security::{SecurityConfig, SensitiveDataFilter};
pub use writers::{BufferedWriter, ConsoleWriter, MultiWriter, RotatingFileWriter};
