// src/utils/mod.rs

//! Shared helpers: HTTP client construction, URL joining, path safety.

pub mod http;
pub mod path;
pub mod url;

pub use path::safe_component;
