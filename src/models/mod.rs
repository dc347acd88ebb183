// src/models/mod.rs

//! Domain models for the harvester and analyzer.

mod config;
mod descriptor;
mod record;

// Re-export all public types
pub use config::{ArchiveConfig, CategoryConfig, Config, CrawlerConfig};
pub use descriptor::{BuildDescriptor, NodeRef, ProjectDescriptor, RunDescriptor};
pub use record::RunMetadata;
