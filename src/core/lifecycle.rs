//! Cancellation and background-task tracking
//!
//! Every component that owns a background thread holds a [`Lifecycle`]. The
//! cancellation signal is a crossbeam channel that never carries a message:
//! dropping the sender disconnects every receiver, which wakes any task
//! blocked in [`CancellationToken::wait_timeout`] immediately.

use super::error::{LoggerError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default grace period for background work during close (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Cheap, cloneable view of a lifecycle's cancellation state
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: Receiver<()>,
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep for up to `timeout`, returning `true` as soon as cancellation
    /// is observed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(self.rx.recv_timeout(timeout), Err(RecvTimeoutError::Disconnected))
    }
}

struct Task {
    name: String,
    handle: JoinHandle<()>,
}

pub struct Lifecycle {
    cancel_tx: Mutex<Option<Sender<()>>>,
    token: CancellationToken,
    tasks: Mutex<Vec<Task>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            cancel_tx: Mutex::new(Some(tx)),
            token: CancellationToken { rx },
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signal cancellation to every task. Idempotent.
    pub fn cancel(&self) {
        drop(self.cancel_tx.lock().take());
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawn a named thread that receives this lifecycle's token
    pub fn spawn<F>(&self, name: &str, task: F) -> Result<()>
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let token = self.token();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || task(token))
            .map_err(|e| {
                LoggerError::io_operation("spawning background task", name.to_string(), e)
            })?;
        self.track(name, handle);
        Ok(())
    }

    /// Register an already spawned thread so shutdown waits for it
    pub fn track(&self, name: &str, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock();
        Self::reap(&mut tasks);
        tasks.push(Task {
            name: name.to_string(),
            handle,
        });
    }

    pub fn pending(&self) -> usize {
        let mut tasks = self.tasks.lock();
        Self::reap(&mut tasks);
        tasks.len()
    }

    /// Join finished tasks so long-lived components do not accumulate handles
    fn reap(tasks: &mut Vec<Task>) {
        let mut i = 0;
        while i < tasks.len() {
            if tasks[i].handle.is_finished() {
                let task = tasks.swap_remove(i);
                Self::join_task(task);
            } else {
                i += 1;
            }
        }
    }

    fn join_task(task: Task) {
        if task.handle.join().is_err() {
            eprintln!(
                "[LOGGER ERROR] Background task '{}' panicked",
                task.name
            );
        }
    }

    /// Wait for every tracked task, giving up after `grace`
    ///
    /// Tasks still running at the deadline are detached and reported as a
    /// [`LoggerError::ShutdownTimeout`].
    pub fn join_all(&self, component: &str, grace: Duration) -> Result<()> {
        let mut remaining = std::mem::take(&mut *self.tasks.lock());
        let start = Instant::now();

        loop {
            Self::reap(&mut remaining);
            if remaining.is_empty() {
                return Ok(());
            }

            if start.elapsed() >= grace {
                let names: Vec<String> = remaining.iter().map(|t| t.name.clone()).collect();
                eprintln!(
                    "[LOGGER WARNING] {} background task(s) did not finish within {:?}: {}",
                    component,
                    grace,
                    names.join(", ")
                );
                return Err(LoggerError::shutdown_timeout(component, grace));
            }

            thread::sleep(JOIN_POLL_INTERVAL);
        }
    }

    /// Cancel, then wait for tasks with a bounded grace period
    pub fn shutdown(&self, component: &str, grace: Duration) -> Result<()> {
        self.cancel();
        self.join_all(component, grace)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_cancel_wakes_waiting_task() {
        let lifecycle = Lifecycle::new();
        let stopped = Arc::new(AtomicBool::new(false));
        let stopped_clone = Arc::clone(&stopped);

        lifecycle
            .spawn("ticker", move |token| {
                while !token.wait_timeout(Duration::from_secs(60)) {}
                stopped_clone.store(true, Ordering::SeqCst);
            })
            .unwrap();

        let start = Instant::now();
        lifecycle.shutdown("test", Duration::from_secs(5)).unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(stopped.load(Ordering::SeqCst));
        assert!(lifecycle.is_cancelled());
    }

    #[test]
    fn test_join_all_times_out() {
        let lifecycle = Lifecycle::new();
        lifecycle
            .spawn("stubborn", |_token| thread::sleep(Duration::from_millis(500)))
            .unwrap();

        let result = lifecycle.join_all("test", Duration::from_millis(20));
        assert!(matches!(result, Err(LoggerError::ShutdownTimeout { .. })));
    }

    #[test]
    fn test_token_not_cancelled_initially() {
        let lifecycle = Lifecycle::new();
        let token = lifecycle.token();
        assert!(!token.is_cancelled());
        assert!(!token.wait_timeout(Duration::from_millis(1)));

        lifecycle.cancel();
        lifecycle.cancel();
        assert!(token.is_cancelled());
    }
}
