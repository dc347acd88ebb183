//! Application configuration structures.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::classifier::UNRECOGNIZED;

/// Environment variable overriding the archive root directory.
pub const ARCHIVE_DIR_ENV: &str = "JENKINS_LOGS_DIR";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Archive location settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Failure categories, in priority order (first match wins)
    #[serde(default = "defaults::categories")]
    pub categories: Vec<CategoryConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Resolve the archive root: the environment variable wins, otherwise
    /// the configured path is used with a warning.
    pub fn archive_root(&self) -> PathBuf {
        match env::var(ARCHIVE_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => {
                log::warn!(
                    "{} is not set; using {}",
                    ARCHIVE_DIR_ENV,
                    self.archive.root
                );
                PathBuf::from(&self.archive.root)
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.crawler.root_url)?;
        if self.archive.root.trim().is_empty() {
            return Err(AppError::validation("archive.root is empty"));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(AppError::validation("category with empty name"));
            }
            if category.name == UNRECOGNIZED {
                return Err(AppError::validation(format!(
                    "category name '{UNRECOGNIZED}' is reserved"
                )));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate category name '{}'",
                    category.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            archive: ArchiveConfig::default(),
            categories: defaults::categories(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Root URL of the matrix job to crawl
    #[serde(default = "defaults::root_url")]
    pub root_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            root_url: defaults::root_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Archive location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory holding one subdirectory per build number
    #[serde(default = "defaults::archive_root")]
    pub root: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: defaults::archive_root(),
        }
    }
}

/// A failure category and the patterns that identify it.
///
/// Declaration order is significant: categories are tried in order and the
/// first one with a matching pattern wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Category identifier (e.g. "network", "docker")
    pub name: String,

    /// Regular expressions, tried in order
    pub patterns: Vec<String>,
}

mod defaults {
    use super::CategoryConfig;

    // Crawler defaults
    pub fn root_url() -> String {
        "https://builds.apache.org/job/CouchDB/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; logsift/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Archive defaults
    pub fn archive_root() -> String {
        "jenkins-logs".into()
    }

    // The known CouchDB failure categories, highest priority first.
    pub fn categories() -> Vec<CategoryConfig> {
        fn category(name: &str, patterns: &[&str]) -> CategoryConfig {
            CategoryConfig {
                name: name.to_string(),
                patterns: patterns.iter().map(|p| p.to_string()).collect(),
            }
        }

        vec![
            category("aborted", &["Build was aborted"]),
            category(
                "network",
                &[
                    r"fatal: unable to access 'https://git-wip-us\.apache\.org",
                    r"fatal: read error: Connection reset by peer",
                ],
            ),
            category(
                "docker",
                &[r"Cannot connect to the Docker daemon\. Is the docker daemon running on this host\?"],
            ),
            category(
                "libdl",
                &[r"sed: error while loading shared libraries: libdl\.so\.2"],
            ),
            category(
                "eunit_replicator",
                &[
                    r"\*\*in function couch_replicator_filtered_tests:should_succeed",
                    r"\*\*error:\{assertion_failed,\[\{module,couch_replicator_compact_tests\}",
                ],
            ),
            category(
                "eunit_compression",
                &[
                    r"couchdb_file_compression_tests:110: should_compare_compression_methods.*\*failed\*",
                    r"in call from couchdb_file_compression_tests:setup/0 \(test/couchdb_file_compression_tests\.erl, line 38\)",
                ],
            ),
            category("eunit", &[r"ERROR: One or more eunit tests failed\."]),
        ]
    }
}
