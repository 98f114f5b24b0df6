// # File Run Stamp Store
//
// File-based implementation of RunStampStore.
//
// ## File Format
//
// A single line holding seconds since the Unix epoch as a float:
//
// ```text
// 1736424000.123456
// ```
//
// ## Robustness
//
// - Atomic writes: the new value goes to `<path>.tmp`, then is renamed over `<path>`
// - Missing parent directories are created on first write
// - Unreadable content is logged and treated as "never ran"

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::state_store::RunStampStore;

/// File-based run stamp store
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::state::FileRunStampStore;
/// use dyndns_core::traits::RunStampStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRunStampStore::new(".last_run");
///     store.record_run(1_736_424_000.0).await?;
///     assert_eq!(store.last_run().await?, Some(1_736_424_000.0));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileRunStampStore {
    path: PathBuf,
}

impl FileRunStampStore {
    /// Create a store backed by `path`
    ///
    /// No I/O happens until the first read or write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the stamp file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse stamp file content
    ///
    /// Blank content counts as zero, matching a freshly truncated file.
    fn parse_stamp(content: &str) -> Option<f64> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Some(0.0);
        }
        trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        PathBuf::from(temp)
    }
}

#[async_trait]
impl RunStampStore for FileRunStampStore {
    async fn last_run(&self) -> Result<Option<f64>, Error> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Run stamp file does not exist: {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::state_store(format!(
                    "Failed to read run stamp file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        match Self::parse_stamp(&content) {
            Some(stamp) => Ok(Some(stamp)),
            None => {
                tracing::warn!(
                    "Run stamp file {} is not a number, treating it as never run",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    async fn record_run(&self, timestamp: f64) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(timestamp.to_string().as_bytes())
                .await
                .map_err(|e| {
                    Error::state_store(format!(
                        "Failed to write to temp file {}: {}",
                        temp_path.display(),
                        e
                    ))
                })?;

            file.flush().await?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Run stamp written to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileRunStampStore::new(dir.path().join(".last_run"));

        assert_eq!(store.last_run().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".last_run");
        let store = FileRunStampStore::new(&path);

        store.record_run(1_736_424_000.25).await.unwrap();
        store.record_run(1_736_424_060.5).await.unwrap();

        assert_eq!(store.last_run().await.unwrap(), Some(1_736_424_060.5));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "1736424060.5"
        );
        assert!(!store.temp_path().exists(), "temp file must be renamed away");
    }

    #[tokio::test]
    async fn test_garbage_reads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".last_run");
        std::fs::write(&path, "not a timestamp").unwrap();

        let store = FileRunStampStore::new(&path);
        assert_eq!(store.last_run().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_file_reads_as_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".last_run");
        std::fs::write(&path, "  \n").unwrap();

        let store = FileRunStampStore::new(&path);
        assert_eq!(store.last_run().await.unwrap(), Some(0.0));
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state").join(".last_run");
        let store = FileRunStampStore::new(&path);

        store.record_run(10.0).await.unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_parse_stamp_rejects_non_finite() {
        assert_eq!(FileRunStampStore::parse_stamp("NaN"), None);
        assert_eq!(FileRunStampStore::parse_stamp("inf"), None);
        assert_eq!(FileRunStampStore::parse_stamp(" 12.5\n"), Some(12.5));
    }
}
