// Log sink for the agent
//
// Lines go to a size-rotated file through tracing-appender's non-blocking
// worker. Rotation is file-rotate's `AppendCount` scheme: `<path>` becomes
// `<path>.1`, `<path>.1` becomes `<path>.2` and so on, keeping `backups` files.

use anyhow::{Context, Result};
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::FmtSubscriber;

/// Default log file path
pub const DEFAULT_LOG_FILE: &str = "cloudflare-ddns.log";

/// Default rotation threshold (10 MiB)
pub const DEFAULT_LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of rotated files kept
pub const DEFAULT_LOG_BACKUPS: usize = 3;

/// Logging settings resolved from the environment
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: Level,
    pub file: PathBuf,
    pub max_bytes: u64,
    pub backups: usize,
}

/// Install the global subscriber
///
/// The returned guard flushes pending lines when dropped, so `main` must
/// hold it until the process is about to exit.
pub fn init(settings: &LogSettings) -> Result<WorkerGuard> {
    let writer = rotating_writer(&settings.file, settings.max_bytes, settings.backups)
        .with_context(|| format!("Failed to open log file {}", settings.file.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.level)
        .with_ansi(false)
        .with_target(false)
        .with_writer(non_blocking)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(guard)
}

/// Size-rotated log file writer
///
/// Creates the parent directory and the file up front so an unwritable
/// location fails here instead of dropping lines later. A `max_bytes` of
/// zero disables rotation.
pub fn rotating_writer(
    path: &Path,
    max_bytes: u64,
    backups: usize,
) -> std::io::Result<FileRotate<AppendCount>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;

    let limit = match usize::try_from(max_bytes) {
        Ok(0) => ContentLimit::None,
        Ok(bytes) => ContentLimit::Bytes(bytes),
        Err(_) => ContentLimit::None,
    };

    Ok(FileRotate::new(
        path,
        AppendCount::new(backups),
        limit,
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    fn backup(path: &Path, n: usize) -> PathBuf {
        PathBuf::from(format!("{}.{}", path.display(), n))
    }

    #[test]
    fn test_creates_parent_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/nested/agent.log");

        let _writer = rotating_writer(&path, 100, 2).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_keeps_at_most_backups_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.log");

        let mut writer = rotating_writer(&path, 4, 2).unwrap();
        for line in ["aaa\n", "bbb\n", "ccc\n", "ddd\n"] {
            writer.write_all(line.as_bytes()).unwrap();
        }
        writer.flush().unwrap();

        assert_eq!(read(&path), "ddd\n");
        assert_eq!(read(&backup(&path, 1)), "ccc\n");
        assert_eq!(read(&backup(&path, 2)), "bbb\n");
        assert!(!backup(&path, 3).exists());
    }

    #[test]
    fn test_zero_max_bytes_never_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.log");

        let mut writer = rotating_writer(&path, 0, 2).unwrap();
        writer.write_all(b"aaa\n").unwrap();
        writer.write_all(b"bbb\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(read(&path), "aaa\nbbb\n");
        assert!(!backup(&path, 1).exists());
    }
}
