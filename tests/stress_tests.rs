//! Stress tests for concurrent use
//!
//! These tests verify:
//! - Concurrent add/remove/log never panics or deadlocks
//! - Writer count matches net adds minus removes
//! - Writes to one rotating file are never interleaved
//! - Policy and level swaps are safe while other threads log
//! - The filter stays bounded on adversarial input

use sentinel_log::prelude::*;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Default)]
struct Counter {
    writes: AtomicUsize,
}

impl Writer for Counter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(buf.len())
    }

    fn name(&self) -> &str {
        "counter"
    }
}

/// Hundreds of concurrent add/remove/log calls
#[test]
fn test_concurrent_writer_management() {
    let logger = Arc::new(Logger::new());
    logger.set_security_config(Some(SecurityConfig::new(4096, 1000).unwrap()));

    const THREADS: usize = 8;
    const ROUNDS: usize = 50;
    let barrier = Arc::new(Barrier::new(THREADS));
    let mut handles = Vec::new();

    for t in 0..THREADS {
        let logger = Arc::clone(&logger);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut kept = 0;
            for round in 0..ROUNDS {
                let writer: Arc<dyn Writer> = Arc::new(Counter::default());
                logger.add_writer(Arc::clone(&writer)).unwrap();
                logger.info(format!("thread {} round {}", t, round));
                if round % 2 == 0 {
                    assert!(logger.remove_writer(&writer).unwrap());
                } else {
                    kept += 1;
                }
            }
            kept
        }));
    }

    let kept: usize = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .sum();

    assert_eq!(logger.writer_count(), kept);
    assert_eq!(kept, THREADS * ROUNDS / 2);
    assert_eq!(logger.metrics().total_logged(), (THREADS * ROUNDS) as u64);
    assert!(logger.close().is_ok());
}

#[test]
fn test_concurrent_logging_to_rotating_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("concurrent.log");

    let logger = Arc::new(
        Logger::builder()
            .timestamp_format(None)
            .writer(
                RotatingFileWriter::new(
                    &log_file,
                    RotationConfig::new().with_max_size(16 * 1024).with_max_backups(50),
                )
                .unwrap(),
            )
            .build()
            .unwrap(),
    );

    const THREADS: usize = 8;
    const PER_THREAD: usize = 250;
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.info(format!("worker-{:02} entry-{:04} {}", t, i, "x".repeat(40)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    logger.close().unwrap();

    let mut total = 0;
    for entry in fs::read_dir(temp_dir.path()).unwrap().filter_map(|e| e.ok()) {
        let content = fs::read_to_string(entry.path()).unwrap();
        for line in content.lines() {
            assert!(line.starts_with("[INFO ] worker-"), "corrupted line: {}", line);
            assert!(line.ends_with(&"x".repeat(40)), "corrupted line: {}", line);
            total += 1;
        }
    }
    assert_eq!(total, THREADS * PER_THREAD);
}

#[test]
fn test_policy_and_level_swaps_under_load() {
    let counter = Arc::new(Counter::default());
    let logger = Arc::new(
        Logger::builder()
            .min_level(LogLevel::Trace)
            .shared_writer(counter.clone())
            .build()
            .unwrap(),
    );

    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let swapper = {
        let logger = Arc::clone(&logger);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut flip = false;
            while !stop.load(Ordering::Relaxed) {
                let policy = if flip {
                    SecurityConfig::new(128, 10).unwrap()
                } else {
                    SecurityConfig::default()
                };
                logger.set_security_config(Some(policy));
                logger.set_level(if flip { LogLevel::Trace } else { LogLevel::Debug });
                flip = !flip;
            }
        })
    };

    let loggers: Vec<_> = (0..4)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..500 {
                    logger.info(format!("token=abc{} payload {}", i, "y".repeat(200)));
                }
            })
        })
        .collect();
    for handle in loggers {
        handle.join().expect("Logging thread panicked");
    }
    stop.store(true, Ordering::Relaxed);
    swapper.join().expect("Swapper panicked");

    assert_eq!(counter.writes.load(Ordering::Relaxed), 2000);
}

#[test]
fn test_filter_bounded_on_adversarial_input() {
    let filter = SensitiveDataFilter::full();
    filter.add_pattern(r"(a+)+$").unwrap();
    filter.add_pattern(r"(a|aa)+b").unwrap();

    let input = format!("{}!", "a".repeat(10_000));
    let start = Instant::now();
    let _ = filter.filter(&input);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_shared_filter_across_threads() {
    let filter = Arc::new(SensitiveDataFilter::basic());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let filter = Arc::clone(&filter);
            thread::spawn(move || {
                for _ in 0..100 {
                    let out = filter.filter(&format!("api_key=k{} and 123-45-6789", i));
                    assert!(!out.contains("123-45-6789"));
                    assert!(!out.contains(&format!("k{}", i)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}
