//! Policy definition and management.

use crate::error::{PolicyError, Result};
use crate::schema;
use crate::types::{Condition, Rule, RuleList};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A complete policy: operation name to the rules that grant it.
///
/// Operations absent from `rules` are denied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    pub rules: IndexMap<String, RuleList>,
}

impl Policy {
    /// Creates an empty policy, which denies every operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rules for an operation.
    pub fn with_rules(mut self, operation: impl Into<String>, rules: impl Into<RuleList>) -> Self {
        self.rules.insert(operation.into(), rules.into());
        self
    }

    /// Grants an operation unconditionally.
    pub fn allow(self, operation: impl Into<String>) -> Self {
        self.with_rules(operation, RuleList::Allow)
    }

    /// Returns the rules for an operation.
    pub fn rule_list(&self, operation: &str) -> Option<&RuleList> {
        self.rules.get(operation)
    }

    /// Returns the operation names in policy order.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Parses a policy from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let policy: Policy = serde_yaml::from_str(yaml)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Parses a policy from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: Policy = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Serializes the policy to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }

    /// Serializes the policy to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PolicyError::SerializationError(e.to_string()))
    }

    /// Validates the policy against the policy schema.
    pub fn validate(&self) -> Result<()> {
        schema::validate_policy(self)
    }
}

/// Builder for creating rules.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    conditions: Vec<(String, Condition)>,
}

impl RuleBuilder {
    /// Creates a new rule builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition on an attribute path.
    pub fn condition(mut self, path: impl Into<String>, condition: Condition) -> Self {
        self.conditions.push((path.into(), condition));
        self
    }

    /// Adds an `equals` condition against a literal.
    pub fn equals(self, path: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.condition(path, Condition::new("equals").with_value(value))
    }

    /// Adds a condition comparing `path` with another attribute.
    pub fn targets(
        self,
        path: impl Into<String>,
        comparison: &str,
        target: impl Into<String>,
    ) -> Self {
        self.condition(path, Condition::new(comparison).with_target(target))
    }

    /// Builds the rule.
    pub fn build(self) -> Rule {
        self.conditions.into_iter().collect()
    }
}
