//! The persisted per-run record.

use serde::{Deserialize, Serialize};

use crate::utils::url::join;

/// Metadata persisted as `metadata.json` alongside a run's console log.
///
/// Field names match the upstream descriptor so existing archives written by
/// other tooling stay readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunMetadata {
    /// Build number this run belongs to
    pub number: i64,

    /// Unique run name within the build, e.g. "CouchDB » label=ubuntu #42"
    #[serde(rename = "fullDisplayName")]
    pub full_display_name: String,

    /// Build result (SUCCESS, FAILURE, ABORTED, ...); absent while running
    pub result: Option<String>,

    /// Base URL of the run on the CI server
    pub url: String,
}

impl RunMetadata {
    /// Only SUCCESS counts as passing; anything else is a failure.
    pub fn is_success(&self) -> bool {
        self.result.as_deref() == Some("SUCCESS")
    }

    /// URL of the raw console log for this run.
    pub fn console_url(&self) -> String {
        join(&self.url, "consoleText")
    }
}
