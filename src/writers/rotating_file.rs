//! Size-rotating file writer with count/age retention and gzip compression
//!
//! The active file lives at the configured path. Rotation renames it to
//! `<path>.1`, shifting older backups up by one (`<path>.2`, ...) and
//! deleting whatever falls past `max_backups`. With compression enabled the
//! fresh `<path>.1` is gzipped in the background into a private staging file
//! and moved into whichever slot that backup occupies once the job finishes,
//! so writes and later rotations never wait on it.

use super::path::{create_parent_dirs, validate_log_path};
use crate::core::error::{LoggerError, Result};
use crate::core::lifecycle::{Lifecycle, DEFAULT_SHUTDOWN_TIMEOUT};
use crate::core::writer::Writer;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

const MIB: u64 = 1024 * 1024;
const COMPRESS_CHUNK: usize = 64 * 1024;

/// Rotation and retention settings
///
/// # Examples
///
/// ```
/// use sentinel_log::writers::RotationConfig;
/// use std::time::Duration;
///
/// let config = RotationConfig::new()
///     .with_max_size_mb(50)
///     .with_max_backups(7)
///     .with_max_age(Duration::from_secs(7 * 24 * 3600))
///     .with_compression(true);
/// assert_eq!(config.max_size, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// Rotate before a write that would push the file past this many bytes
    pub max_size: u64,
    /// Delete backups older than this; `Duration::ZERO` disables age retention
    pub max_age: Duration,
    /// Number of numbered backups to keep
    pub max_backups: usize,
    /// Gzip backups after rotation
    pub compress: bool,
    /// How often the age-retention task wakes up
    pub cleanup_interval: Duration,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size: 100 * MIB,
            max_age: Duration::from_secs(30 * 24 * 3600),
            max_backups: 10,
            compress: false,
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

impl RotationConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(mut self, mb: u64) -> Self {
        self.max_size = mb.saturating_mul(MIB);
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(LoggerError::config("RotationConfig", "max_size must be positive"));
        }
        if !self.max_age.is_zero() && self.cleanup_interval.is_zero() {
            return Err(LoggerError::config(
                "RotationConfig",
                "cleanup_interval must be positive when max_age is set",
            ));
        }
        Ok(())
    }
}

struct FileState {
    file: Option<BufWriter<File>>,
    /// Bytes written to the currently open file
    size: u64,
    /// Rotations so far; a backup made at rotation `g` sits in slot
    /// `rotations - g + 1`
    rotations: u64,
}

/// Rotating file writer
///
/// # Examples
///
/// ```no_run
/// use sentinel_log::writers::{RotatingFileWriter, RotationConfig};
/// use sentinel_log::Writer;
///
/// let writer = RotatingFileWriter::new(
///     "/var/log/app/app.log",
///     RotationConfig::new().with_max_size_mb(10).with_compression(true),
/// ).unwrap();
/// writer.write(b"started\n").unwrap();
/// writer.close().unwrap();
/// ```
pub struct RotatingFileWriter {
    path: Arc<PathBuf>,
    config: RotationConfig,
    state: Arc<Mutex<FileState>>,
    closed: AtomicBool,
    /// Age-retention task
    lifecycle: Lifecycle,
    /// In-flight gzip jobs
    compressions: Lifecycle,
}

impl RotatingFileWriter {
    /// Validate the path, open (or create) the file and start age retention
    pub fn new<P: AsRef<Path>>(path: P, config: RotationConfig) -> Result<Self> {
        config.validate()?;
        let path = validate_log_path(path.as_ref())?;
        create_parent_dirs(&path)?;

        let (file, size) = open_log_file(&path)?;

        let writer = Self {
            path: Arc::new(path),
            config,
            state: Arc::new(Mutex::new(FileState {
                file: Some(BufWriter::new(file)),
                size,
                rotations: 0,
            })),
            closed: AtomicBool::new(false),
            lifecycle: Lifecycle::new(),
            compressions: Lifecycle::new(),
        };

        if !writer.config.max_age.is_zero() {
            let path = Arc::clone(&writer.path);
            let max_age = writer.config.max_age;
            let interval = writer.config.cleanup_interval;
            writer.lifecycle.spawn("log-retention", move |token| loop {
                remove_expired_backups(&path, max_age);
                if token.wait_timeout(interval) {
                    break;
                }
            })?;
        }

        Ok(writer)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Bytes written to the currently open file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.state.lock().size
    }

    /// Path of the uncompressed backup at `index` (1 is most recent)
    #[must_use]
    pub fn backup_path(&self, index: usize) -> PathBuf {
        backup_path(&self.path, index)
    }

    /// Force a rotation now
    pub fn rotate(&self) -> Result<()> {
        let mut state = self.state.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::WriterClosed(self.name().to_string()));
        }
        self.rotate_locked(&mut state)
    }

    fn rotate_locked(&self, state: &mut FileState) -> Result<()> {
        if let Some(mut writer) = state.file.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        self.shift_backups()?;
        state.rotations += 1;

        if self.config.compress && self.config.max_backups > 0 {
            self.spawn_compression(state.rotations)?;
        }

        let (file, size) = open_log_file(&self.path).map_err(|e| {
            LoggerError::file_rotation(
                self.path.display().to_string(),
                format!("Failed to create new log file: {}", e),
            )
        })?;
        state.file = Some(BufWriter::new(file));
        state.size = size;

        Ok(())
    }

    /// Gzip the backup just moved into slot 1. The job reads through its own
    /// handle, so later rotations may rename the raw file underneath it.
    fn spawn_compression(&self, generation: u64) -> Result<()> {
        let backup = self.backup_path(1);
        let input = match File::open(&backup) {
            Ok(file) => file,
            // nothing was rotated in (the active file was missing)
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(LoggerError::compression(
                    backup.display().to_string(),
                    format!("cannot open backup: {}", e),
                ))
            }
        };

        let job = CompressionJob {
            base: Arc::clone(&self.path),
            state: Arc::clone(&self.state),
            generation,
            max_backups: self.config.max_backups,
        };
        let handle = thread::Builder::new()
            .name("log-compress".to_string())
            .spawn(move || {
                if let Err(e) = job.run(input) {
                    eprintln!("[LOGGER ERROR] {}", e);
                }
            })
            .map_err(|e| LoggerError::io_operation("spawning compression task", "log-compress", e))?;
        self.compressions.track("log-compress", handle);
        Ok(())
    }

    /// Drop the oldest backup, move every other one up a slot and move the
    /// active file to slot 1
    fn shift_backups(&self) -> Result<()> {
        let max = self.config.max_backups;

        if max == 0 {
            return remove_if_exists(&self.path).map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to discard log file: {}", e),
                )
            });
        }

        for oldest in [self.backup_path(max), gz_path(&self.backup_path(max))] {
            if let Err(e) = remove_if_exists(&oldest) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove oldest backup {}: {}",
                    oldest.display(),
                    e
                );
            }
        }

        for i in (1..max).rev() {
            let from = self.backup_path(i);
            let to = self.backup_path(i + 1);
            for (old, new) in [(gz_path(&from), gz_path(&to)), (from, to)] {
                if old.exists() {
                    fs::rename(&old, &new).map_err(|e| {
                        LoggerError::file_rotation(
                            old.display().to_string(),
                            format!("Failed to shift backup: {}", e),
                        )
                    })?;
                }
            }
        }

        if self.path.exists() {
            fs::rename(self.path.as_path(), self.backup_path(1)).map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;
        }

        Ok(())
    }
}

impl Writer for RotatingFileWriter {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::WriterClosed(self.name().to_string()));
        }

        let incoming = buf.len() as u64;
        if state.size.saturating_add(incoming) > self.config.max_size {
            self.rotate_locked(&mut state)?;
        }

        // Recover from an earlier failed rotation that left no handle
        if state.file.is_none() {
            let (file, size) = open_log_file(&self.path)?;
            state.file = Some(BufWriter::new(file));
            state.size = size;
        }

        if let Some(ref mut writer) = state.file {
            writer.write_all(buf).map_err(|e| {
                LoggerError::io_operation(
                    "writing log file",
                    self.path.display().to_string(),
                    e,
                )
            })?;
        }
        state.size += incoming;
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(ref mut writer) = state.file {
            writer.flush().map_err(|e| {
                LoggerError::io_operation("flushing log file", self.path.display().to_string(), e)
            })?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut errors = Vec::new();

        // Taking the lock waits out any rotation in progress, so every
        // compression job is tracked before the join below.
        let file = self.state.lock().file.take();
        if let Some(mut writer) = file {
            if let Err(e) = writer.flush() {
                errors.push(LoggerError::io_operation(
                    "closing log file",
                    self.path.display().to_string(),
                    e,
                ));
            }
        }

        if let Err(e) = self.lifecycle.shutdown("log-retention", DEFAULT_SHUTDOWN_TIMEOUT) {
            errors.push(e);
        }
        if let Err(e) = self.compressions.join_all("compression", DEFAULT_SHUTDOWN_TIMEOUT) {
            errors.push(e);
        }

        LoggerError::aggregate(errors)
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

impl Drop for RotatingFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close {}: {}", self.path.display(), e);
        }
    }
}

fn open_log_file(path: &Path) -> Result<(File, u64)> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path).map_err(|e| {
        LoggerError::io_operation("opening log file", path.display().to_string(), e)
    })?;
    let size = file
        .metadata()
        .map_err(|e| LoggerError::io_operation("reading log file metadata", path.display().to_string(), e))?
        .len();
    Ok((file, size))
}

fn backup_path(base: &Path, index: usize) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}", index));
    base.with_file_name(name)
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Whether `name` is `<base>.<N>` or `<base>.<N>.gz`
fn is_backup_name(name: &str, base: &str) -> bool {
    let Some(suffix) = name.strip_prefix(base).and_then(|s| s.strip_prefix('.')) else {
        return false;
    };
    let digits = suffix.strip_suffix(".gz").unwrap_or(suffix);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Delete backups whose modification time is older than `max_age`
fn remove_expired_backups(path: &Path, max_age: Duration) {
    let (Some(dir), Some(base)) = (path.parent(), path.file_name().and_then(|n| n.to_str())) else {
        return;
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("[LOGGER WARNING] Cannot scan {} for old backups: {}", dir.display(), e);
            return;
        }
    };

    let now = SystemTime::now();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_backup_name(name, base) {
            continue;
        }
        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .map(|modified| now.duration_since(modified).unwrap_or(Duration::ZERO) > max_age)
            .unwrap_or(false);
        if expired {
            if let Err(e) = remove_if_exists(&entry.path()) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove expired backup {}: {}",
                    entry.path().display(),
                    e
                );
            }
        }
    }
}

/// Background gzip of one rotated backup
struct CompressionJob {
    base: Arc<PathBuf>,
    state: Arc<Mutex<FileState>>,
    /// Rotation that produced the backup
    generation: u64,
    max_backups: usize,
}

impl CompressionJob {
    fn run(&self, input: File) -> Result<()> {
        let staging = staging_path(&self.base, self.generation);
        if let Err(e) = gzip_into(input, &staging) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }
        let state = self.state.lock();
        place_compressed(&self.base, &staging, self.generation, state.rotations, self.max_backups)
    }
}

/// `<path>.z<generation>.tmp`, a name no backup scan or shift ever touches
fn staging_path(base: &Path, generation: u64) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".z{}.tmp", generation));
    base.with_file_name(name)
}

fn gzip_into(input: File, staging: &Path) -> Result<()> {
    let fail = |message: String| LoggerError::compression(staging.display().to_string(), message);

    let mut reader = BufReader::with_capacity(COMPRESS_CHUNK, input);
    let output = File::create(staging).map_err(|e| fail(format!("cannot create: {}", e)))?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(COMPRESS_CHUNK, output),
        flate2::Compression::default(),
    );

    let mut chunk = vec![0u8; COMPRESS_CHUNK];
    loop {
        let n = reader
            .read(&mut chunk)
            .map_err(|e| fail(format!("read failed: {}", e)))?;
        if n == 0 {
            break;
        }
        encoder
            .write_all(&chunk[..n])
            .map_err(|e| fail(format!("compress failed: {}", e)))?;
    }

    encoder
        .finish()
        .and_then(|mut w| w.flush())
        .map_err(|e| fail(format!("finish failed: {}", e)))?;
    Ok(())
}

/// Move a finished gzip into the slot its backup occupies now. Must run
/// under the writer's state lock so no shift happens concurrently. If the
/// raw backup is gone (pushed past `max_backups` or expired) the gzip is
/// discarded.
fn place_compressed(
    base: &Path,
    staging: &Path,
    generation: u64,
    rotations: u64,
    max_backups: usize,
) -> Result<()> {
    let slot = usize::try_from(rotations.saturating_sub(generation) + 1).unwrap_or(usize::MAX);
    let raw = backup_path(base, slot);
    if slot > max_backups || !raw.exists() {
        return remove_if_exists(staging).map_err(|e| {
            LoggerError::compression(staging.display().to_string(), format!("cannot discard: {}", e))
        });
    }

    fs::rename(staging, gz_path(&raw)).map_err(|e| {
        let _ = fs::remove_file(staging);
        LoggerError::compression(raw.display().to_string(), format!("cannot move into place: {}", e))
    })?;
    if let Err(e) = fs::remove_file(&raw) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but failed to remove the original: {}",
            raw.display(),
            e
        );
    }
    Ok(())
}
