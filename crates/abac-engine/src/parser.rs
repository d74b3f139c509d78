//! Policy file parser.

use crate::engine;
use crate::error::{PolicyError, Result};
use crate::policy::Policy;
use serde::{Deserialize, Serialize};

/// Supported policy file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFormat {
    Yaml,
    Json,
}

impl PolicyFormat {
    /// Detects format from file extension.
    pub fn from_extension(path: &str) -> Option<Self> {
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            Some(PolicyFormat::Yaml)
        } else if path.ends_with(".json") {
            Some(PolicyFormat::Json)
        } else {
            None
        }
    }

    /// Detects format from content.
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('{') {
            PolicyFormat::Json
        } else {
            PolicyFormat::Yaml
        }
    }
}

/// Parses and validates a policy, auto-detecting format.
pub fn parse_policy(content: &str) -> Result<Policy> {
    parse_policy_with_format(content, PolicyFormat::detect(content))
}

/// Parses and validates a policy in the given format.
pub fn parse_policy_with_format(content: &str, format: PolicyFormat) -> Result<Policy> {
    match format {
        PolicyFormat::Yaml => Policy::from_yaml(content),
        PolicyFormat::Json => Policy::from_json(content),
    }
}

/// Parses every policy in a multi-document YAML stream.
///
/// Empty documents are skipped.
pub fn parse_policies_yaml(content: &str) -> Result<Vec<Policy>> {
    let mut policies = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let document = serde_yaml::Value::deserialize(document)?;
        if document.is_null() {
            continue;
        }

        let policy: Policy = serde_yaml::from_value(document)?;
        policy.validate()?;
        policies.push(policy);
    }

    Ok(policies)
}

/// A named set of policies that apply together.
///
/// The pack grants whatever any of its policies grants; see
/// [`PolicyPack::merged`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyPack {
    /// Pack name.
    pub name: String,

    /// Pack description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Policies in this pack.
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl PolicyPack {
    /// Creates an empty policy pack.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a policy to the pack.
    pub fn add_policy(&mut self, policy: Policy) {
        self.policies.push(policy);
    }

    /// Parses a policy pack from YAML, validating every policy.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let pack: PolicyPack = serde_yaml::from_str(yaml)?;

        for policy in &pack.policies {
            policy.validate()?;
        }

        Ok(pack)
    }

    /// Serializes the pack to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }

    /// Merges the pack's policies into a single policy.
    pub fn merged(&self) -> Result<Policy> {
        engine::merge(&self.policies)
    }
}
