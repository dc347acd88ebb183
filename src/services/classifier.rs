// src/services/classifier.rs

//! Failure classification engine.
//!
//! Categories are tried in declared order, and within a category patterns
//! are tried in declared order; the first match anywhere in the log decides.
//! A log no pattern matches falls into the reserved "unrecognized" category.

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::CategoryConfig;

/// Reserved category for logs no rule matched.
pub const UNRECOGNIZED: &str = "unrecognized";

/// A compiled failure category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    name: String,
    patterns: Vec<Regex>,
}

impl CategoryRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text of each pattern, in declared order.
    pub fn pattern_sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.as_str())
    }

    fn matches(&self, log: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(log))
    }
}

/// An ordered set of failure categories.
///
/// Order is an explicit sequence, never a map: the declaration order is the
/// priority order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CategoryRule>,
}

impl RuleSet {
    /// Compile category configuration into a rule set.
    ///
    /// A pattern that fails to compile is a configuration error, reported
    /// with its source text.
    pub fn compile(categories: &[CategoryConfig]) -> Result<Self> {
        let mut rules = Vec::with_capacity(categories.len());
        for category in categories {
            let mut patterns = Vec::with_capacity(category.patterns.len());
            for source in &category.patterns {
                let regex =
                    Regex::new(source).map_err(|e| AppError::pattern(source.clone(), e))?;
                patterns.push(regex);
            }
            rules.push(CategoryRule {
                name: category.name.clone(),
                patterns,
            });
        }
        Ok(Self { rules })
    }

    /// Classify a log: the name of the first matching category, or
    /// [`UNRECOGNIZED`]. Deterministic and total.
    pub fn classify(&self, log: &str) -> &str {
        for rule in &self.rules {
            if rule.matches(log) {
                return &rule.name;
            }
        }
        UNRECOGNIZED
    }

    /// Categories in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
