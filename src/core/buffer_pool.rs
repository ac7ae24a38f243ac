//! Bounded pool of reusable line buffers
//!
//! Buffers whose capacity grew past `max_retained_capacity` are dropped on
//! return so a rare oversized message cannot pin memory in the pool forever.

use parking_lot::Mutex;

pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    max_pooled: usize,
    initial_capacity: usize,
    max_retained_capacity: usize,
}

impl BufferPool {
    pub fn new(max_pooled: usize, initial_capacity: usize, max_retained_capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::with_capacity(max_pooled)),
            max_pooled,
            initial_capacity,
            max_retained_capacity,
        }
    }

    /// Check out an empty buffer
    pub fn get(&self) -> Vec<u8> {
        self.buffers
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.initial_capacity))
    }

    /// Return a buffer for reuse
    pub fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > self.max_retained_capacity {
            return;
        }
        buf.clear();
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.max_pooled {
            buffers.push(buf);
        }
    }

    pub fn pooled(&self) -> usize {
        self.buffers.lock().len()
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(32, 512, 64 * 1024)
    }
}
