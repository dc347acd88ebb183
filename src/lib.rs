// src/lib.rs

//! logsift: Jenkins matrix-build log harvesting and failure triage.
//!
//! Two decoupled stages share a filesystem archive: the crawler walks a
//! matrix job (project → build → run) and persists metadata plus console
//! logs; the analyzer classifies every failed run's log against an ordered
//! rule set and prints a ranked report.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
