//! Fan-out writer

use crate::core::error::{LoggerError, Result};
use crate::core::writer::{same_writer, Writer};
use parking_lot::RwLock;
use std::sync::Arc;

/// Forwards every write to each child writer
///
/// Children are written independently, so one failing sink does not keep
/// the others from receiving the payload. When at least one child succeeds
/// but others fail, `write` returns [`LoggerError::PartialWrite`] whose
/// `written` field is the full payload length; inspect the error rather than
/// the count to tell full delivery from partial delivery.
///
/// # Examples
///
/// ```
/// use sentinel_log::writers::{ConsoleWriter, MultiWriter};
/// use sentinel_log::Writer;
/// use std::sync::Arc;
///
/// let multi = MultiWriter::new(vec![
///     Arc::new(ConsoleWriter::stdout()) as Arc<dyn Writer>,
///     Arc::new(ConsoleWriter::stderr()),
/// ]);
/// assert_eq!(multi.len(), 2);
/// ```
pub struct MultiWriter {
    writers: RwLock<Vec<Arc<dyn Writer>>>,
}

impl MultiWriter {
    pub fn new(writers: Vec<Arc<dyn Writer>>) -> Self {
        Self {
            writers: RwLock::new(writers),
        }
    }

    pub fn add_writer(&self, writer: Arc<dyn Writer>) {
        self.writers.write().push(writer);
    }

    /// Remove `writer` if present, returning whether it was found
    pub fn remove_writer(&self, writer: &Arc<dyn Writer>) -> bool {
        let mut writers = self.writers.write();
        match writers.iter().position(|w| same_writer(w, writer)) {
            Some(index) => {
                writers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.writers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.read().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn Writer>> {
        self.writers.read().clone()
    }
}

impl Default for MultiWriter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Writer for MultiWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let writers = self.snapshot();
        if writers.is_empty() {
            return Ok(buf.len());
        }

        let mut errors = Vec::new();
        for (index, writer) in writers.iter().enumerate() {
            match writer.write(buf) {
                Ok(n) if n == buf.len() => {}
                Ok(n) => errors.push(format!(
                    "writer #{} ({}): short write {}/{} bytes",
                    index + 1,
                    writer.name(),
                    n,
                    buf.len()
                )),
                Err(e) => errors.push(format!("writer #{} ({}): {}", index + 1, writer.name(), e)),
            }
        }

        let total = writers.len();
        match errors.len() {
            0 => Ok(buf.len()),
            failed if failed == total => Err(LoggerError::AllWritersFailed { total, errors }),
            failed => Err(LoggerError::PartialWrite {
                written: buf.len(),
                failed,
                total,
                errors,
            }),
        }
    }

    fn flush(&self) -> Result<()> {
        let errors: Vec<LoggerError> = self
            .snapshot()
            .iter()
            .filter_map(|w| w.flush().err())
            .collect();
        LoggerError::aggregate(errors)
    }

    /// Close every child, reporting the last error encountered
    fn close(&self) -> Result<()> {
        let mut last_error = None;
        for writer in self.snapshot() {
            if let Err(e) = writer.close() {
                last_error = Some(e);
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "multi"
    }
}
