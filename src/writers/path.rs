//! Log path validation
//!
//! Every file-backed writer resolves its path here before touching the
//! filesystem. Rejections are permanent; nothing is auto-corrected.

use crate::core::error::{LoggerError, Result};
use std::fs::DirBuilder;
use std::path::{Component, Path, PathBuf};

pub const MAX_PATH_LENGTH: usize = 4096;

/// Validate `path` and resolve it to an absolute, cleaned path
///
/// Rejects empty paths, NUL bytes, paths longer than [`MAX_PATH_LENGTH`],
/// any `..` component, and paths without a file name.
pub fn validate_log_path(path: &Path) -> Result<PathBuf> {
    let display = path.display().to_string();
    let raw = path.as_os_str();

    if raw.is_empty() {
        return Err(LoggerError::invalid_path(display, "path is empty"));
    }
    if raw.as_encoded_bytes().contains(&0) {
        return Err(LoggerError::invalid_path(display, "path contains a NUL byte"));
    }
    if raw.len() > MAX_PATH_LENGTH {
        return Err(LoggerError::invalid_path(
            format!("{}...", display.chars().take(64).collect::<String>()),
            format!("path exceeds {} bytes", MAX_PATH_LENGTH),
        ));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(LoggerError::invalid_path(
            display,
            "parent directory traversal is not allowed",
        ));
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| {
                LoggerError::io_operation("resolving log path", "cannot read current directory", e)
            })?
            .join(path)
    };

    let cleaned: PathBuf = absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if cleaned.file_name().is_none() {
        return Err(LoggerError::invalid_path(display, "path has no file name"));
    }
    if cleaned.as_os_str().len() > MAX_PATH_LENGTH {
        return Err(LoggerError::invalid_path(
            display,
            format!("resolved path exceeds {} bytes", MAX_PATH_LENGTH),
        ));
    }

    Ok(cleaned)
}

/// Create the parent directories of `path`, owner-only on unix
pub fn create_parent_dirs(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(parent).map_err(|e| {
        LoggerError::io_operation(
            "create log directory",
            format!("Failed to create directory '{}'", parent.display()),
            e,
        )
    })
}
