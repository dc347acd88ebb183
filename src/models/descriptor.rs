//! Upstream Jenkins descriptor schema.
//!
//! Descriptors are fetched from the `api/json` sub-path of a node URL.
//! Scalar fields tolerate both a plain scalar and the one-element-array
//! shape some API front-ends emit (`{"number": [7]}`), so the same structs
//! decode either form.

use serde::{Deserialize, Deserializer};

use crate::error::{AppError, Result};
use crate::models::RunMetadata;

/// Deserialize either `T` or a non-empty `[T, ...]`, taking the first element.
fn scalar_opt<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    let value = Option::<OneOrMany<T>>::deserialize(deserializer)?;
    Ok(match value {
        Some(OneOrMany::One(v)) => Some(v),
        Some(OneOrMany::Many(vs)) => vs.into_iter().next(),
        None => None,
    })
}

/// Top-level matrix project descriptor: the list of builds.
#[derive(Debug, Deserialize)]
pub struct ProjectDescriptor {
    #[serde(alias = "builds")]
    pub build: Option<Vec<NodeRef>>,
}

impl ProjectDescriptor {
    /// The build list; absence of the field is a root-level (fatal) error.
    pub fn builds(self) -> Result<Vec<NodeRef>> {
        self.build
            .ok_or_else(|| AppError::validation("missing field `build` in project descriptor"))
    }
}

/// Matrix build descriptor: the list of parameterized runs.
#[derive(Debug, Deserialize)]
pub struct BuildDescriptor {
    #[serde(alias = "runs")]
    pub run: Option<Vec<NodeRef>>,
}

impl BuildDescriptor {
    /// The run list; absence of the field skips this build's subtree.
    pub fn runs(self) -> Result<Vec<NodeRef>> {
        self.run
            .ok_or_else(|| AppError::validation("missing field `run` in build descriptor"))
    }
}

/// A child reference inside a project or build descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRef {
    #[serde(default, deserialize_with = "scalar_opt")]
    pub number: Option<i64>,

    #[serde(default, deserialize_with = "scalar_opt")]
    pub url: Option<String>,
}

impl NodeRef {
    /// Require both fields, naming the missing one in the error.
    pub fn validated(&self, context: &str) -> Result<(i64, &str)> {
        let number = self
            .number
            .ok_or_else(|| AppError::validation(format!("missing field `number` in {context}")))?;
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| AppError::validation(format!("missing field `url` in {context}")))?;
        Ok((number, url))
    }
}

/// Leaf matrix run descriptor.
#[derive(Debug, Deserialize)]
pub struct RunDescriptor {
    #[serde(default, deserialize_with = "scalar_opt")]
    pub number: Option<i64>,

    #[serde(rename = "fullDisplayName", default, deserialize_with = "scalar_opt")]
    pub full_display_name: Option<String>,

    #[serde(default, deserialize_with = "scalar_opt")]
    pub result: Option<String>,

    #[serde(default, deserialize_with = "scalar_opt")]
    pub url: Option<String>,
}

impl RunDescriptor {
    /// Validate required fields and produce the persisted metadata record.
    ///
    /// `result` may legitimately be absent while a run is in progress; the
    /// analyzer treats anything but SUCCESS as a failure, so it stays
    /// optional. `url` falls back to the parent listing's URL.
    pub fn into_metadata(self, fallback_url: &str) -> Result<RunMetadata> {
        let number = self
            .number
            .ok_or_else(|| AppError::validation("missing field `number` in run descriptor"))?;
        let full_display_name = self.full_display_name.ok_or_else(|| {
            AppError::validation("missing field `fullDisplayName` in run descriptor")
        })?;
        if full_display_name.trim().is_empty() {
            return Err(AppError::validation(
                "empty `fullDisplayName` in run descriptor",
            ));
        }
        Ok(RunMetadata {
            number,
            full_display_name,
            result: self.result,
            url: self.url.unwrap_or_else(|| fallback_url.to_string()),
        })
    }
}
