// src/services/jenkins.rs

//! Fetch layer for the CI server.
//!
//! Every node of the job tree exposes a structured descriptor at the
//! `api/json` sub-path of its URL; a run's raw console log lives at
//! `consoleText`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::models::{BuildDescriptor, CrawlerConfig, ProjectDescriptor, RunDescriptor};
use crate::utils::http::create_client;
use crate::utils::url::join;

/// Sub-path serving a node's structured descriptor.
const API_SUFFIX: &str = "api/json";

/// Sub-path serving a run's raw console log.
const CONSOLE_SUFFIX: &str = "consoleText";

/// Trait for job-tree fetch backends.
///
/// The crawler walks the tree through this seam, so tests can drive it
/// against canned descriptors the same way `ArchiveStore` abstracts the
/// filesystem.
#[async_trait]
pub trait JobFetcher: Send + Sync {
    /// Fetch the project descriptor at the tree root.
    async fn fetch_project(&self, base_url: &str) -> Result<ProjectDescriptor>;

    /// Fetch one build's descriptor.
    async fn fetch_build(&self, base_url: &str) -> Result<BuildDescriptor>;

    /// Fetch one run's descriptor.
    async fn fetch_run(&self, base_url: &str) -> Result<RunDescriptor>;

    /// Fetch the raw console log of the run at `run_url`.
    async fn fetch_console_text(&self, run_url: &str) -> Result<String>;
}

/// HTTP client for the CI server's status API.
#[derive(Clone)]
pub struct JenkinsClient {
    client: reqwest::Client,
}

impl JenkinsClient {
    /// Create a client from crawler configuration.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }

    /// Fetch and decode the descriptor of the node at `base_url`.
    pub async fn fetch_descriptor<T: DeserializeOwned>(&self, base_url: &str) -> Result<T> {
        let url = join(base_url, API_SUFFIX);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl JobFetcher for JenkinsClient {
    async fn fetch_project(&self, base_url: &str) -> Result<ProjectDescriptor> {
        self.fetch_descriptor(base_url).await
    }

    async fn fetch_build(&self, base_url: &str) -> Result<BuildDescriptor> {
        self.fetch_descriptor(base_url).await
    }

    async fn fetch_run(&self, base_url: &str) -> Result<RunDescriptor> {
        self.fetch_descriptor(base_url).await
    }

    async fn fetch_console_text(&self, run_url: &str) -> Result<String> {
        let url = join(run_url, CONSOLE_SUFFIX);
        let text = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}
