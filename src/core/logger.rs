//! Main logger implementation

use super::{
    buffer_pool::BufferPool,
    error::{LoggerError, Result},
    lifecycle::{Lifecycle, DEFAULT_SHUTDOWN_TIMEOUT},
    log_context::LogContext,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    output_format::{FormatRenderer, OutputFormat},
    renderer::{CallerResolver, LocationResolver, Record, Renderer},
    timestamp::TimestampFormat,
    writer::{same_writer, Writer},
};
use crate::security::SecurityConfig;
use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Invoked after a fatal record has been written and the logger closed
pub type FatalHandler = Arc<dyn Fn() + Send + Sync>;

type WriterList = Arc<RwLock<Vec<Arc<dyn Writer>>>>;

/// Failures are reported on the first occurrence and every this many after
const ALERT_EVERY: u64 = 1000;

/// Synchronous, thread-safe logger
///
/// Every call runs on the caller's thread: level gate, security policy
/// (size cap, redaction, control-character strip), rendering, then one write
/// per registered writer. Logging never returns an error; sink failures are
/// counted in [`LoggerMetrics`] and reported on stderr.
///
/// The minimum level and the security policy are swapped atomically, so
/// they can be changed at any time from any thread without blocking
/// callers that are logging.
pub struct Logger {
    level: AtomicU8,
    closed: AtomicBool,
    security: ArcSwap<SecurityConfig>,
    writers: WriterList,
    renderer: Arc<dyn Renderer>,
    caller_resolver: Option<Arc<dyn CallerResolver>>,
    fatal_handler: FatalHandler,
    /// First close result, replayed to later callers
    close_outcome: Mutex<Option<std::result::Result<(), String>>>,
    lifecycle: Lifecycle,
    shutdown_timeout: Duration,
    pool: BufferPool,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Logger at `Info` with the default security policy and no writers
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(
            LogLevel::Info,
            SecurityConfig::default(),
            Vec::new(),
            Arc::new(FormatRenderer::default()),
            None,
            Arc::new(exit_process),
            DEFAULT_SHUTDOWN_TIMEOUT,
        )
    }

    fn from_parts(
        level: LogLevel,
        security: SecurityConfig,
        writers: Vec<Arc<dyn Writer>>,
        renderer: Arc<dyn Renderer>,
        caller_resolver: Option<Arc<dyn CallerResolver>>,
        fatal_handler: FatalHandler,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
            closed: AtomicBool::new(false),
            security: ArcSwap::from_pointee(security),
            writers: Arc::new(RwLock::new(writers)),
            renderer,
            caller_resolver,
            fatal_handler,
            close_outcome: Mutex::new(None),
            lifecycle: Lifecycle::new(),
            shutdown_timeout,
            pool: BufferPool::default(),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use sentinel_log::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .min_level(LogLevel::Debug)
    ///     .writer(ConsoleWriter::stdout())
    ///     .build()
    ///     .unwrap();
    /// logger.info("ready");
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Release);
    }

    pub fn level(&self) -> LogLevel {
        // only valid discriminants are ever stored
        LogLevel::try_from(self.level.load(Ordering::Acquire)).unwrap_or_default()
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level as u8 >= self.level.load(Ordering::Acquire)
    }

    /// Publish a new security policy; `None` restores the default
    pub fn set_security_config(&self, config: Option<SecurityConfig>) {
        self.security.store(Arc::new(config.unwrap_or_default()));
    }

    /// Independent copy of the active security policy
    pub fn security_config(&self) -> SecurityConfig {
        SecurityConfig::clone(&self.security.load())
    }

    /// Register a writer, subject to the policy's writer limit
    pub fn add_writer(&self, writer: Arc<dyn Writer>) -> Result<()> {
        let max = self.security.load().max_writers();
        let mut writers = self.writers.write();
        if self.is_closed() {
            return Err(LoggerError::LoggerClosed);
        }
        if writers.len() >= max {
            return Err(LoggerError::WriterLimitExceeded {
                current: writers.len(),
                max,
            });
        }
        writers.push(writer);
        Ok(())
    }

    /// Unregister a writer without closing it
    ///
    /// Returns `Ok(false)` if the writer was not registered.
    pub fn remove_writer(&self, writer: &Arc<dyn Writer>) -> Result<bool> {
        let mut writers = self.writers.write();
        if self.is_closed() {
            return Err(LoggerError::LoggerClosed);
        }
        match writers.iter().position(|w| same_writer(w, writer)) {
            Some(index) => {
                writers.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn writer_count(&self) -> usize {
        self.writers.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get the logger metrics for observability
    ///
    /// # Example
    ///
    /// ```
    /// use sentinel_log::Logger;
    ///
    /// let logger = Logger::new();
    /// logger.info("no writers yet");
    ///
    /// let metrics = logger.metrics();
    /// println!("Total logged: {}", metrics.total_logged());
    /// println!("Write failures: {}", metrics.write_failures());
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.dispatch(level, message.as_ref(), None, Location::caller());
        if level == LogLevel::Fatal {
            self.terminate();
        }
    }

    /// Log with structured fields; every value passes through the filter
    #[track_caller]
    pub fn log_with_fields(&self, level: LogLevel, message: impl AsRef<str>, fields: LogContext) {
        self.dispatch(level, message.as_ref(), Some(fields), Location::caller());
        if level == LogLevel::Fatal {
            self.terminate();
        }
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    /// Write the record, flush, close the logger, then run the fatal handler
    /// (which exits the process with status 1 unless overridden).
    #[inline]
    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Fatal, message);
    }

    #[track_caller]
    pub fn info_with_fields(&self, message: impl AsRef<str>, fields: LogContext) {
        self.log_with_fields(LogLevel::Info, message, fields);
    }

    #[track_caller]
    pub fn warn_with_fields(&self, message: impl AsRef<str>, fields: LogContext) {
        self.log_with_fields(LogLevel::Warn, message, fields);
    }

    #[track_caller]
    pub fn error_with_fields(&self, message: impl AsRef<str>, fields: LogContext) {
        self.log_with_fields(LogLevel::Error, message, fields);
    }

    fn dispatch(
        &self,
        level: LogLevel,
        message: &str,
        fields: Option<LogContext>,
        location: &Location<'_>,
    ) {
        if !self.is_enabled(level) || self.is_closed() {
            return;
        }

        let policy = self.security.load();
        let sanitized = policy.sanitize(message);
        if sanitized.truncated {
            self.metrics.record_truncated();
        }
        if sanitized.filter_fallbacks > 0 {
            self.metrics.add_filter_fallbacks(sanitized.filter_fallbacks as u64);
        }
        let fields = fields.map(|f| policy.sanitize_fields(f));
        drop(policy);

        let caller = self
            .caller_resolver
            .as_ref()
            .map(|resolver| resolver.resolve(location))
            .filter(|c| !c.is_empty());

        let mut record = Record::new(level, &sanitized.text);
        if let Some(ref caller) = caller {
            record = record.with_caller(caller);
        }
        if let Some(ref fields) = fields {
            record = record.with_fields(fields);
        }
        let line = self.renderer.render(&record);

        let mut buf = self.pool.get();
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.write_to_writers(&buf);
        self.pool.put(buf);

        self.metrics.record_logged();
    }

    fn write_to_writers(&self, buf: &[u8]) {
        let writers = self.writers.read();
        match writers.len() {
            0 => {}
            1 => self.write_one(0, &writers[0], buf),
            _ => {
                // release the lock before any blocking I/O
                let snapshot = writers.clone();
                drop(writers);
                for (idx, writer) in snapshot.iter().enumerate() {
                    self.write_one(idx, writer, buf);
                }
            }
        }
    }

    /// Per-writer panic isolation: one failing writer never stops the rest
    fn write_one(&self, idx: usize, writer: &Arc<dyn Writer>, buf: &[u8]) {
        match catch_unwind(AssertUnwindSafe(|| writer.write(buf))) {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                let failures = self.metrics.record_write_failure();
                if failures % ALERT_EVERY == 0 {
                    eprintln!(
                        "[LOGGER ERROR] Writer #{} ({}) failed: {} ({} failures so far)",
                        idx,
                        writer.name(),
                        e,
                        failures + 1
                    );
                }
            }
            Err(panic_info) => {
                self.metrics.record_writer_panic();
                eprintln!(
                    "[LOGGER CRITICAL] Writer #{} ({}) panicked: {}. \
                     Other writers continue to function.",
                    idx,
                    writer.name(),
                    panic_message(panic_info.as_ref())
                );
            }
        }
    }

    /// Flush every registered writer
    pub fn flush(&self) -> Result<()> {
        flush_writers(&self.writers)
    }

    fn terminate(&self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush before fatal exit: {}", e);
        }
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close before fatal exit: {}", e);
        }
        (self.fatal_handler)();
    }

    /// Stop background work and close every owned writer
    ///
    /// Standard streams are flushed but left open. Only the first call does
    /// any work; later calls return the first call's outcome.
    ///
    /// # Example
    ///
    /// ```
    /// use sentinel_log::Logger;
    ///
    /// let logger = Logger::new();
    /// logger.close().unwrap();
    /// assert!(logger.close().is_ok());
    /// ```
    pub fn close(&self) -> Result<()> {
        let mut outcome = self.close_outcome.lock();
        if let Some(ref previous) = *outcome {
            return previous.clone().map_err(LoggerError::CloseFailed);
        }

        self.closed.store(true, Ordering::Release);

        let mut errors = Vec::new();
        if let Err(e) = self.lifecycle.shutdown("logger", self.shutdown_timeout) {
            errors.push(e);
        }

        let writers = std::mem::take(&mut *self.writers.write());
        for writer in writers {
            let result = if writer.is_standard_stream() {
                writer.flush()
            } else {
                writer.close()
            };
            if let Err(e) = result {
                errors.push(e);
            }
        }

        let result = LoggerError::aggregate(errors);
        *outcome = Some(result.as_ref().map(|_| ()).map_err(ToString::to_string));
        result
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.close_outcome.lock().is_some() {
            return;
        }
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close logger during drop: {}", e);
        }

        let failures = self.metrics.write_failures();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} failed writes",
                failures
            );
        }
    }
}

fn flush_writers(writers: &WriterList) -> Result<()> {
    let snapshot = writers.read().clone();
    let errors: Vec<LoggerError> = snapshot.iter().filter_map(|w| w.flush().err()).collect();
    LoggerError::aggregate(errors)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn exit_process() {
    std::process::exit(1);
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use sentinel_log::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .writer(ConsoleWriter::stderr())
///     .output_format(OutputFormat::Json)
///     .security_config(SecurityConfig::new(64 * 1024, 4).unwrap())
///     .include_caller(true)
///     .auto_flush(Duration::from_millis(500))
///     .on_fatal(Arc::new(|| eprintln!("fatal record written")))
///     .build()
///     .unwrap();
/// # logger.close().unwrap();
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    writers: Vec<Arc<dyn Writer>>,
    security: Option<SecurityConfig>,
    output_format: OutputFormat,
    timestamp_format: Option<TimestampFormat>,
    use_colors: bool,
    renderer: Option<Arc<dyn Renderer>>,
    caller_resolver: Option<Arc<dyn CallerResolver>>,
    fatal_handler: Option<FatalHandler>,
    auto_flush: Option<Duration>,
    shutdown_timeout: Duration,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            writers: Vec::new(),
            security: None,
            output_format: OutputFormat::Text,
            timestamp_format: Some(TimestampFormat::default()),
            use_colors: false,
            renderer: None,
            caller_resolver: None,
            fatal_handler: None,
            auto_flush: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add a writer owned by the logger
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Writer + 'static>(mut self, writer: W) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    /// Add a writer that is also referenced elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writers.push(writer);
        self
    }

    /// Replace the default security policy
    #[must_use = "builder methods return a new value"]
    pub fn security_config(mut self, config: SecurityConfig) -> Self {
        self.security = Some(config);
        self
    }

    /// Output format for the built-in renderer
    #[must_use = "builder methods return a new value"]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Timestamp format for the built-in renderer; `None` omits timestamps
    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: Option<TimestampFormat>) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Colorize levels in text output
    #[must_use = "builder methods return a new value"]
    pub fn colors(mut self, enabled: bool) -> Self {
        self.use_colors = enabled;
        self
    }

    /// Use a custom renderer instead of the built-in one
    #[must_use = "builder methods return a new value"]
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Include `file:line` of the logging call site
    #[must_use = "builder methods return a new value"]
    pub fn include_caller(mut self, enabled: bool) -> Self {
        self.caller_resolver = if enabled {
            Some(Arc::new(LocationResolver))
        } else {
            None
        };
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn caller_resolver(mut self, resolver: Arc<dyn CallerResolver>) -> Self {
        self.caller_resolver = Some(resolver);
        self
    }

    /// Replace the default fatal behavior (exit with status 1)
    #[must_use = "builder methods return a new value"]
    pub fn on_fatal(mut self, handler: FatalHandler) -> Self {
        self.fatal_handler = Some(handler);
        self
    }

    /// Flush all writers periodically on a background thread
    #[must_use = "builder methods return a new value"]
    pub fn auto_flush(mut self, interval: Duration) -> Self {
        self.auto_flush = Some(interval);
        self
    }

    /// Grace period for background work during close
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Build the Logger
    pub fn build(self) -> Result<Logger> {
        let security = self.security.unwrap_or_default();
        if self.writers.len() > security.max_writers() {
            return Err(LoggerError::WriterLimitExceeded {
                current: self.writers.len(),
                max: security.max_writers(),
            });
        }
        if self.shutdown_timeout.is_zero() {
            return Err(LoggerError::config("LoggerBuilder", "shutdown_timeout must be positive"));
        }
        if self.auto_flush.is_some_and(|interval| interval.is_zero()) {
            return Err(LoggerError::config("LoggerBuilder", "auto_flush interval must be positive"));
        }

        let renderer = self.renderer.unwrap_or_else(|| {
            Arc::new(
                FormatRenderer::new(self.output_format)
                    .with_timestamp(self.timestamp_format)
                    .with_colors(self.use_colors),
            )
        });

        let logger = Logger::from_parts(
            self.min_level,
            security,
            self.writers,
            renderer,
            self.caller_resolver,
            self.fatal_handler.unwrap_or_else(|| Arc::new(exit_process)),
            self.shutdown_timeout,
        );

        if let Some(interval) = self.auto_flush {
            let writers = Arc::clone(&logger.writers);
            logger.lifecycle.spawn("log-auto-flush", move |token| {
                while !token.wait_timeout(interval) {
                    if let Err(e) = flush_writers(&writers) {
                        eprintln!("[LOGGER ERROR] Periodic flush failed: {}", e);
                    }
                }
            })?;
        }

        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{SensitiveDataFilter, REDACTED};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Capture {
        lines: Mutex<Vec<String>>,
        flushes: AtomicUsize,
        closes: AtomicUsize,
    }

    impl Capture {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().clone()
        }
    }

    impl Writer for Capture {
        fn write(&self, buf: &[u8]) -> Result<usize> {
            self.lines
                .lock()
                .push(String::from_utf8_lossy(buf).into_owned());
            Ok(buf.len())
        }

        fn flush(&self) -> Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    struct Panicking;

    impl Writer for Panicking {
        fn write(&self, _buf: &[u8]) -> Result<usize> {
            panic!("sink exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    struct CloseFails;

    impl Writer for CloseFails {
        fn write(&self, buf: &[u8]) -> Result<usize> {
            Ok(buf.len())
        }

        fn close(&self) -> Result<()> {
            Err(LoggerError::writer("close refused"))
        }

        fn name(&self) -> &str {
            "close_fails"
        }
    }

    fn plain_logger(capture: &Arc<Capture>) -> Logger {
        Logger::builder()
            .min_level(LogLevel::Trace)
            .timestamp_format(None)
            .shared_writer(capture.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let logger = Logger::builder().build().unwrap();
        assert_eq!(logger.level(), LogLevel::Info);
        assert_eq!(logger.writer_count(), 0);
        assert!(!logger.is_closed());
    }

    #[test]
    fn test_builder_rejects_too_many_writers() {
        let result = Logger::builder()
            .security_config(SecurityConfig::new(1024, 1).unwrap())
            .writer(Capture::default())
            .writer(Capture::default())
            .build();
        assert!(matches!(result, Err(LoggerError::WriterLimitExceeded { current: 2, max: 1 })));
    }

    #[test]
    fn test_level_gating() {
        let capture = Arc::new(Capture::default());
        let logger = plain_logger(&capture);
        logger.set_level(LogLevel::Warn);

        logger.info("dropped");
        logger.warn("kept");
        logger.error("kept too");

        let lines = capture.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[WARN ] kept\n");
        assert_eq!(logger.metrics().total_logged(), 2);
    }

    #[test]
    fn test_message_is_redacted() {
        let capture = Arc::new(Capture::default());
        let logger = plain_logger(&capture);

        logger.info("login password=hunter2");
        let line = &capture.lines()[0];
        assert!(line.contains(REDACTED));
        assert!(!line.contains("hunter2"));
    }

    #[test]
    fn test_fields_are_redacted() {
        let capture = Arc::new(Capture::default());
        let logger = plain_logger(&capture);

        logger.info_with_fields(
            "request",
            LogContext::new()
                .with_field("api_key", "k-999")
                .with_field("path", "/health"),
        );
        let line = &capture.lines()[0];
        assert!(line.contains("api_key=[REDACTED]"));
        assert!(line.contains("path=/health"));
    }

    #[test]
    fn test_security_config_swap() {
        let capture = Arc::new(Capture::default());
        let logger = plain_logger(&capture);

        logger.set_security_config(Some(SecurityConfig::new(1024, 4).unwrap()));
        logger.info("password=visible");
        assert!(capture.lines()[0].contains("password=visible"));
        assert!(logger.security_config().filter().is_none());

        logger.set_security_config(None);
        logger.info("password=hidden");
        assert!(!capture.lines()[1].contains("hidden"));
    }

    #[test]
    fn test_security_config_is_a_copy() {
        let logger = Logger::new();
        let copy = logger.security_config();
        copy.filter().unwrap().disable();
        assert!(logger.security_config().filter().unwrap().is_enabled());
    }

    #[test]
    fn test_truncation_counted() {
        let capture = Arc::new(Capture::default());
        let logger = plain_logger(&capture);
        logger.set_security_config(Some(
            SecurityConfig::new(8, 4)
                .unwrap()
                .with_filter(SensitiveDataFilter::new()),
        ));

        logger.info("0123456789abcdef");
        assert_eq!(logger.metrics().truncated(), 1);
        assert!(capture.lines()[0].contains("01234567... [TRUNCATED]"));
    }

    #[test]
    fn test_writer_limit() {
        let logger = Logger::new();
        logger.set_security_config(Some(SecurityConfig::new(1024, 2).unwrap()));

        logger.add_writer(Arc::new(Capture::default())).unwrap();
        logger.add_writer(Arc::new(Capture::default())).unwrap();
        let err = logger.add_writer(Arc::new(Capture::default())).unwrap_err();

        assert!(matches!(err, LoggerError::WriterLimitExceeded { current: 2, max: 2 }));
        assert_eq!(logger.writer_count(), 2);
    }

    #[test]
    fn test_remove_writer() {
        let logger = Logger::new();
        let writer: Arc<dyn Writer> = Arc::new(Capture::default());
        let stranger: Arc<dyn Writer> = Arc::new(Capture::default());

        logger.add_writer(Arc::clone(&writer)).unwrap();
        assert!(!logger.remove_writer(&stranger).unwrap());
        assert!(logger.remove_writer(&writer).unwrap());
        assert_eq!(logger.writer_count(), 0);
    }

    #[test]
    fn test_panicking_writer_is_isolated() {
        let capture = Arc::new(Capture::default());
        let logger = Logger::builder()
            .writer(Panicking)
            .shared_writer(capture.clone())
            .build()
            .unwrap();

        logger.info("still delivered");
        assert_eq!(capture.lines().len(), 1);
        assert_eq!(logger.metrics().writer_panics(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let capture = Arc::new(Capture::default());
        let logger = plain_logger(&capture);

        assert!(logger.close().is_ok());
        assert!(logger.close().is_ok());
        assert!(logger.close().is_ok());
        assert_eq!(capture.closes.load(Ordering::SeqCst), 1);

        logger.info("after close");
        assert!(capture.lines().is_empty());
        assert!(matches!(
            logger.add_writer(Arc::new(Capture::default())),
            Err(LoggerError::LoggerClosed)
        ));
    }

    #[test]
    fn test_close_failure_is_replayed() {
        let logger = Logger::builder().writer(CloseFails).build().unwrap();

        assert!(matches!(logger.close(), Err(LoggerError::WriterError(_))));
        match logger.close() {
            Err(LoggerError::CloseFailed(msg)) => assert!(msg.contains("close refused")),
            other => panic!("unexpected close result: {:?}", other),
        }
    }

    #[test]
    fn test_fatal_flushes_closes_and_calls_handler() {
        let capture = Arc::new(Capture::default());
        let called = Arc::new(AtomicUsize::new(0));
        let called_clone = Arc::clone(&called);
        let logger = Logger::builder()
            .timestamp_format(None)
            .shared_writer(capture.clone())
            .on_fatal(Arc::new(move || {
                called_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .unwrap();

        logger.fatal("unrecoverable");

        assert_eq!(capture.lines(), vec!["[FATAL] unrecoverable\n".to_string()]);
        assert!(capture.flushes.load(Ordering::SeqCst) >= 1);
        assert_eq!(capture.closes.load(Ordering::SeqCst), 1);
        assert_eq!(called.load(Ordering::SeqCst), 1);
        assert!(logger.is_closed());
    }

    #[test]
    fn test_caller_is_rendered() {
        let capture = Arc::new(Capture::default());
        let logger = Logger::builder()
            .timestamp_format(None)
            .include_caller(true)
            .shared_writer(capture.clone())
            .build()
            .unwrap();

        logger.info("here");
        let expected = format!("[core/logger.rs:{}] here", line!() - 1);
        assert!(capture.lines()[0].contains(&expected));
    }

    #[test]
    fn test_auto_flush() {
        let capture = Arc::new(Capture::default());
        let logger = Logger::builder()
            .shared_writer(capture.clone())
            .auto_flush(Duration::from_millis(10))
            .build()
            .unwrap();

        std::thread::sleep(Duration::from_millis(200));
        assert!(capture.flushes.load(Ordering::SeqCst) > 0);
        logger.close().unwrap();
    }

    #[test]
    fn test_auto_flush_zero_rejected() {
        assert!(Logger::builder().auto_flush(Duration::ZERO).build().is_err());
    }
}
