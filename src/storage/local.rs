//! Local filesystem archive backend.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::RunMetadata;
use crate::storage::{ArchiveStore, LOG_FILE, METADATA_FILE};
use crate::utils::safe_component;

/// Filesystem-backed archive.
#[derive(Debug, Clone)]
pub struct LocalArchive {
    root: PathBuf,
}

impl LocalArchive {
    /// Create an archive rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for one run. Display names are sanitized before use as a
    /// path component; sanitization is idempotent, so names returned by
    /// `list_runs` round-trip.
    fn run_dir(&self, build_number: i64, display_name: &str) -> PathBuf {
        self.root
            .join(build_number.to_string())
            .join(safe_component(display_name))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read a file, returning None if it doesn't exist.
    async fn read_optional(&self, path: &PathBuf) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ArchiveStore for LocalArchive {
    async fn put_run(
        &self,
        build_number: i64,
        display_name: &str,
        metadata: &RunMetadata,
        log: &str,
    ) -> Result<()> {
        let dir = self.run_dir(build_number, display_name);

        let bytes = serde_json::to_vec_pretty(metadata)?;
        self.write_bytes(&dir.join(METADATA_FILE), &bytes).await?;
        self.write_bytes(&dir.join(LOG_FILE), log.as_bytes()).await?;
        Ok(())
    }

    async fn list_builds(&self) -> Result<Vec<i64>> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            AppError::archive(format!(
                "cannot read archive root {}: {e}",
                self.root.display()
            ))
        })?;

        let mut builds = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(number) = name.parse::<i64>() {
                    builds.push(number);
                }
            }
        }
        builds.sort_unstable();
        Ok(builds)
    }

    async fn list_runs(&self, build_number: i64) -> Result<Vec<String>> {
        let dir = self.root.join(build_number.to_string());
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| AppError::archive(format!("cannot read build {build_number}: {e}")))?;

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                runs.push(name.to_string());
            }
        }
        runs.sort_unstable();
        Ok(runs)
    }

    async fn read_metadata(
        &self,
        build_number: i64,
        display_name: &str,
    ) -> Result<Option<RunMetadata>> {
        let path = self.run_dir(build_number, display_name).join(METADATA_FILE);
        match self.read_optional(&path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn read_log(&self, build_number: i64, display_name: &str) -> Result<Option<String>> {
        let path = self.run_dir(build_number, display_name).join(LOG_FILE);
        match self.read_optional(&path).await? {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            None => Ok(None),
        }
    }
}
