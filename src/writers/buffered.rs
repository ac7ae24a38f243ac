//! Batching writer in front of another writer

use crate::core::error::{LoggerError, Result};
use crate::core::lifecycle::{Lifecycle, DEFAULT_SHUTDOWN_TIMEOUT};
use crate::core::writer::Writer;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferedConfig {
    /// Capacity; a flush happens once half of it is filled
    pub buffer_size: usize,
    /// Buffered data older than this is forwarded by the background task
    pub flush_interval: Duration,
}

impl Default for BufferedConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl BufferedConfig {
    #[must_use]
    pub fn new(buffer_size: usize, flush_interval: Duration) -> Self {
        Self {
            buffer_size,
            flush_interval,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.buffer_size < 2 {
            return Err(LoggerError::config(
                "BufferedConfig",
                format!("buffer_size must be at least 2 bytes, got {}", self.buffer_size),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(LoggerError::config(
                "BufferedConfig",
                "flush_interval must be positive",
            ));
        }
        Ok(())
    }

    fn flush_threshold(&self) -> usize {
        self.buffer_size / 2
    }

    /// How often the background task checks for stale data
    fn tick(&self) -> Duration {
        (self.flush_interval / 4).max(Duration::from_millis(1))
    }
}

struct Pending {
    data: Vec<u8>,
    last_flush: Instant,
}

struct Inner {
    sink: Arc<dyn Writer>,
    buffer: Mutex<Pending>,
    config: BufferedConfig,
}

impl Inner {
    /// Hand the buffer to the sink. The buffer is emptied even on failure so
    /// a dead sink cannot make it grow without bound.
    fn flush_locked(&self, pending: &mut Pending) -> Result<()> {
        pending.last_flush = Instant::now();
        let buffer = &mut pending.data;
        if buffer.is_empty() {
            return Ok(());
        }
        let result = self.sink.write(buffer).and_then(|written| {
            if written == buffer.len() {
                Ok(())
            } else {
                Err(LoggerError::writer(format!(
                    "short write to '{}': {}/{} bytes",
                    self.sink.name(),
                    written,
                    buffer.len()
                )))
            }
        });
        buffer.clear();
        result?;
        self.sink.flush()
    }

    fn flush(&self) -> Result<()> {
        let mut pending = self.buffer.lock();
        self.flush_locked(&mut pending)
    }

    /// Flush only if the last flush is at least one interval old
    fn flush_if_stale(&self) -> Result<()> {
        let mut pending = self.buffer.lock();
        if pending.last_flush.elapsed() < self.config.flush_interval {
            return Ok(());
        }
        self.flush_locked(&mut pending)
    }
}

/// Collects small writes and forwards them to a sink in batches
///
/// Data reaches the sink when half of `buffer_size` is filled, when a full
/// `flush_interval` has passed since the last flush, on [`Writer::flush`],
/// or on close.
///
/// # Examples
///
/// ```
/// use sentinel_log::writers::{BufferedConfig, BufferedWriter, ConsoleWriter};
/// use sentinel_log::Writer;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let writer = BufferedWriter::new(
///     Arc::new(ConsoleWriter::stderr()),
///     BufferedConfig::new(8 * 1024, Duration::from_millis(200)),
/// ).unwrap();
/// writer.write(b"batched\n").unwrap();
/// writer.close().unwrap();
/// ```
pub struct BufferedWriter {
    inner: Arc<Inner>,
    closed: AtomicBool,
    lifecycle: Lifecycle,
}

impl BufferedWriter {
    pub fn new(sink: Arc<dyn Writer>, config: BufferedConfig) -> Result<Self> {
        config.validate()?;

        let inner = Arc::new(Inner {
            sink,
            buffer: Mutex::new(Pending {
                data: Vec::with_capacity(config.buffer_size),
                last_flush: Instant::now(),
            }),
            config,
        });

        let lifecycle = Lifecycle::new();
        let ticker = Arc::clone(&inner);
        lifecycle.spawn("log-buffer-flush", move |token| {
            while !token.wait_timeout(ticker.config.tick()) {
                if let Err(e) = ticker.flush_if_stale() {
                    eprintln!("[LOGGER ERROR] Periodic buffer flush failed: {}", e);
                }
            }
        })?;

        Ok(Self {
            inner,
            closed: AtomicBool::new(false),
            lifecycle,
        })
    }

    /// Buffer with default capacity and interval
    pub fn with_defaults(sink: Arc<dyn Writer>) -> Result<Self> {
        Self::new(sink, BufferedConfig::default())
    }

    /// Bytes waiting to be forwarded
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.inner.buffer.lock().data.len()
    }

    #[must_use]
    pub fn config(&self) -> &BufferedConfig {
        &self.inner.config
    }
}

impl Writer for BufferedWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::WriterClosed(self.name().to_string()));
        }

        let mut pending = self.inner.buffer.lock();
        pending.data.extend_from_slice(buf);
        if pending.data.len() >= self.inner.config.flush_threshold() {
            self.inner.flush_locked(&mut pending)?;
        }
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut errors = Vec::new();
        if let Err(e) = self.lifecycle.shutdown("buffered writer", DEFAULT_SHUTDOWN_TIMEOUT) {
            errors.push(e);
        }
        if let Err(e) = self.inner.flush() {
            errors.push(e);
        }
        if let Err(e) = self.inner.sink.close() {
            errors.push(e);
        }
        LoggerError::aggregate(errors)
    }

    fn name(&self) -> &str {
        "buffered"
    }
}

impl Drop for BufferedWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close buffered writer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[derive(Default)]
    struct Capture {
        data: Mutex<Vec<u8>>,
        writes: AtomicUsize,
        closes: AtomicUsize,
    }

    impl Writer for Capture {
        fn write(&self, buf: &[u8]) -> Result<usize> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.data.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    struct Broken;

    impl Writer for Broken {
        fn write(&self, _buf: &[u8]) -> Result<usize> {
            Err(LoggerError::writer("sink unavailable"))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn slow_config(size: usize) -> BufferedConfig {
        BufferedConfig::new(size, Duration::from_secs(3600))
    }

    #[test]
    fn test_invalid_config_rejected() {
        let sink: Arc<dyn Writer> = Arc::new(Capture::default());
        assert!(BufferedWriter::new(Arc::clone(&sink), BufferedConfig::new(0, Duration::from_secs(1))).is_err());
        assert!(BufferedWriter::new(sink, BufferedConfig::new(64, Duration::ZERO)).is_err());
    }

    #[test]
    fn test_holds_data_below_threshold() {
        let sink = Arc::new(Capture::default());
        let writer = BufferedWriter::new(sink.clone(), slow_config(100)).unwrap();

        assert_eq!(writer.write(b"0123456789").unwrap(), 10);
        assert_eq!(writer.buffered_len(), 10);
        assert!(sink.data.lock().is_empty());

        writer.flush().unwrap();
        assert_eq!(writer.buffered_len(), 0);
        assert_eq!(*sink.data.lock(), b"0123456789");
    }

    #[test]
    fn test_threshold_flushes_immediately() {
        let sink = Arc::new(Capture::default());
        let writer = BufferedWriter::new(sink.clone(), slow_config(20)).unwrap();

        writer.write(b"123456789").unwrap();
        assert!(sink.data.lock().is_empty());
        writer.write(b"0").unwrap();

        assert_eq!(writer.buffered_len(), 0);
        assert_eq!(*sink.data.lock(), b"1234567890");
        assert_eq!(sink.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_periodic_flush() {
        let sink = Arc::new(Capture::default());
        let writer = BufferedWriter::new(
            sink.clone(),
            BufferedConfig::new(1024, Duration::from_millis(20)),
        )
        .unwrap();

        writer.write(b"stale").unwrap();
        thread::sleep(Duration::from_millis(300));
        assert_eq!(*sink.data.lock(), b"stale");
    }

    #[test]
    fn test_periodic_flush_waits_for_stale_data() {
        let sink = Arc::new(Capture::default());
        let writer = BufferedWriter::new(
            sink.clone(),
            BufferedConfig::new(1024, Duration::from_millis(400)),
        )
        .unwrap();

        writer.flush().unwrap();
        writer.write(b"fresh").unwrap();
        thread::sleep(Duration::from_millis(150));
        assert!(sink.data.lock().is_empty());
        assert_eq!(writer.buffered_len(), 5);

        thread::sleep(Duration::from_millis(850));
        assert_eq!(*sink.data.lock(), b"fresh");
    }

    #[test]
    fn test_close_flushes_and_closes_sink_once() {
        let sink = Arc::new(Capture::default());
        let writer = BufferedWriter::new(sink.clone(), slow_config(1024)).unwrap();

        writer.write(b"pending").unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        drop(writer);

        assert_eq!(*sink.data.lock(), b"pending");
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_write_after_close() {
        let writer =
            BufferedWriter::new(Arc::new(Capture::default()), slow_config(1024)).unwrap();
        writer.close().unwrap();
        assert!(matches!(writer.write(b"late"), Err(LoggerError::WriterClosed(_))));
    }

    #[test]
    fn test_failed_flush_drops_buffer() {
        let writer = BufferedWriter::new(Arc::new(Broken), slow_config(1024)).unwrap();
        writer.write(b"lost").unwrap();

        assert!(writer.flush().is_err());
        assert_eq!(writer.buffered_len(), 0);
        assert!(writer.flush().is_ok());
    }
}
