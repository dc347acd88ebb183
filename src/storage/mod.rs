// src/storage/mod.rs

//! Archive persistence.
//!
//! One record per `(buildNumber, displayName)` key:
//!
//! ```text
//! {root}/
//! └── {buildNumber}/
//!     └── {displayName}/
//!         ├── metadata.json
//!         └── build.log
//! ```
//!
//! Writes overwrite silently; the crawler re-archives the whole tree on
//! every invocation.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RunMetadata;

// Re-export for convenience
pub use local::LocalArchive;

/// File name of the structured metadata document.
pub const METADATA_FILE: &str = "metadata.json";

/// File name of the raw console log.
pub const LOG_FILE: &str = "build.log";

/// Trait for archive backends.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Persist a run's metadata and console log, creating intermediate
    /// directories and overwriting any existing record at that key.
    async fn put_run(
        &self,
        build_number: i64,
        display_name: &str,
        metadata: &RunMetadata,
        log: &str,
    ) -> Result<()>;

    /// Build numbers present in the archive, ascending. Only directory
    /// names that are entirely digits count as builds.
    async fn list_builds(&self) -> Result<Vec<i64>>;

    /// Run directory names under a build, sorted for deterministic
    /// aggregation order.
    async fn list_runs(&self, build_number: i64) -> Result<Vec<String>>;

    /// Read a run's metadata; `None` if the record does not exist.
    async fn read_metadata(
        &self,
        build_number: i64,
        display_name: &str,
    ) -> Result<Option<RunMetadata>>;

    /// Read a run's console log; `None` if the log was never fetched.
    async fn read_log(&self, build_number: i64, display_name: &str) -> Result<Option<String>>;
}
