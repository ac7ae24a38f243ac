//! Standard output / standard error writer

use crate::core::error::{LoggerError, Result};
use crate::core::writer::Writer;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

/// Writes to the process's stdout or stderr
///
/// The logger treats these as process-wide streams and leaves them open
/// when it closes.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleWriter {
    stream: ConsoleStream,
}

impl ConsoleWriter {
    pub fn new(stream: ConsoleStream) -> Self {
        Self { stream }
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleStream::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleStream::Stderr)
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl Default for ConsoleWriter {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Writer for ConsoleWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let result = match self.stream {
            ConsoleStream::Stdout => std::io::stdout().lock().write_all(buf),
            ConsoleStream::Stderr => std::io::stderr().lock().write_all(buf),
        };
        result.map_err(|e| LoggerError::io_operation("writing to console", self.name(), e))?;
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        let result = match self.stream {
            ConsoleStream::Stdout => std::io::stdout().flush(),
            ConsoleStream::Stderr => std::io::stderr().flush(),
        };
        result.map_err(|e| LoggerError::io_operation("flushing console", self.name(), e))
    }

    fn is_standard_stream(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        match self.stream {
            ConsoleStream::Stdout => "stdout",
            ConsoleStream::Stderr => "stderr",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_is_standard_stream() {
        let writer = ConsoleWriter::stderr();
        assert!(writer.is_standard_stream());
        assert_eq!(writer.name(), "stderr");
        assert_eq!(writer.write(b"").unwrap(), 0);
        assert!(writer.close().is_ok());
    }
}
