//! Core logger types and traits

pub mod buffer_pool;
pub mod error;
pub mod lifecycle;
pub mod log_context;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod renderer;
pub mod timestamp;
pub mod writer;

pub use buffer_pool::BufferPool;
pub use error::{LoggerError, Result};
pub use lifecycle::{CancellationToken, Lifecycle, DEFAULT_SHUTDOWN_TIMEOUT};
pub use log_context::{FieldValue, LogContext};
pub use log_level::LogLevel;
pub use logger::{FatalHandler, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use output_format::{FormatRenderer, OutputFormat};
pub use renderer::{CallerResolver, LocationResolver, Record, Renderer};
pub use timestamp::TimestampFormat;
pub use writer::{same_writer, Writer};
