//! Options for policy reduction.

use crate::attributes::AttributePath;
use crate::error::Result;
use crate::schema::{self, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for [`crate::reduce`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReduceOptions {
    /// Attribute path prefixes whose known values are substituted in place
    /// of `target` references during reduction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_targets: Option<Vec<String>>,
}

impl ReduceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inline target prefixes.
    pub fn with_inline_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inline_targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    /// Parses options from JSON and validates them.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Parses options from YAML and validates them.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(yaml)?;
        Self::from_document(document)
    }

    fn from_document(document: Value) -> Result<Self> {
        schema::validate_document(Schema::ReduceOptions, &document)?;
        Ok(serde_json::from_value(document)?)
    }

    pub(crate) fn inline_paths(&self) -> Vec<AttributePath> {
        self.inline_targets
            .iter()
            .flatten()
            .map(|target| AttributePath::parse(target))
            .collect()
    }
}
