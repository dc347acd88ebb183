// src/services/mod.rs

//! Service layer.
//!
//! - Descriptor and console-log fetching (`JenkinsClient`)
//! - Failure classification (`RuleSet`)

pub mod classifier;
mod jenkins;

pub use classifier::{CategoryRule, RuleSet, UNRECOGNIZED};
pub use jenkins::{JenkinsClient, JobFetcher};
