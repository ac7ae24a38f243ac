//! Writer trait for log output destinations

use super::error::Result;
use std::sync::Arc;

/// A sink that accepts rendered log bytes.
///
/// Writers are shared between the logger and any composing writer, so every
/// method takes `&self` and implementations synchronize internally.
pub trait Writer: Send + Sync {
    /// Write the whole buffer, returning the number of bytes accepted.
    fn write(&self, buf: &[u8]) -> Result<usize>;

    /// Push any buffered bytes to the underlying sink.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release the sink. Must be idempotent.
    fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Process-wide streams (stdout/stderr) are never closed by the logger.
    fn is_standard_stream(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

/// Whether two handles point at the same writer instance
pub fn same_writer(a: &Arc<dyn Writer>, b: &Arc<dyn Writer>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
