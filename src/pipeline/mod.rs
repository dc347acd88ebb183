// src/pipeline/mod.rs

//! Pipeline entry points.
//!
//! - `run_crawl`: walk the job tree and archive every run
//! - `run_analyze`: classify archived failures and print the report

pub mod analyze;
pub mod crawl;

pub use analyze::{aggregate, render, run_analyze, CategoryAggregate, Report};
pub use crawl::{run_crawl, CrawlOutcome};
