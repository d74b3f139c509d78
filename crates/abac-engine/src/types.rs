//! Core types for the policy engine.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Comparison operator of a condition.
///
/// Names the engine does not know are kept verbatim in [`Comparison::Other`]
/// and always evaluate to deny.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Comparison {
    Equals,
    NotEquals,
    Includes,
    NotIncludes,
    In,
    NotIn,
    Superset,
    Subset,
    StartsWith,
    EndsWith,
    PrefixOf,
    SuffixOf,
    Exists,
    Other(String),
}

impl Comparison {
    pub fn as_str(&self) -> &str {
        match self {
            Comparison::Equals => "equals",
            Comparison::NotEquals => "notEquals",
            Comparison::Includes => "includes",
            Comparison::NotIncludes => "notIncludes",
            Comparison::In => "in",
            Comparison::NotIn => "notIn",
            Comparison::Superset => "superset",
            Comparison::Subset => "subset",
            Comparison::StartsWith => "startsWith",
            Comparison::EndsWith => "endsWith",
            Comparison::PrefixOf => "prefixOf",
            Comparison::SuffixOf => "suffixOf",
            Comparison::Exists => "exists",
            Comparison::Other(name) => name,
        }
    }

    /// Returns true for operators this engine can evaluate.
    pub fn is_known(&self) -> bool {
        !matches!(self, Comparison::Other(_))
    }
}

impl From<&str> for Comparison {
    fn from(name: &str) -> Self {
        match name {
            "equals" => Comparison::Equals,
            "notEquals" => Comparison::NotEquals,
            "includes" => Comparison::Includes,
            "notIncludes" => Comparison::NotIncludes,
            "in" => Comparison::In,
            "notIn" => Comparison::NotIn,
            "superset" => Comparison::Superset,
            "subset" => Comparison::Subset,
            "startsWith" => Comparison::StartsWith,
            "endsWith" => Comparison::EndsWith,
            "prefixOf" => Comparison::PrefixOf,
            "suffixOf" => Comparison::SuffixOf,
            "exists" => Comparison::Exists,
            other => Comparison::Other(other.to_string()),
        }
    }
}

impl From<String> for Comparison {
    fn from(name: String) -> Self {
        match Comparison::from(name.as_str()) {
            Comparison::Other(_) => Comparison::Other(name),
            known => known,
        }
    }
}

impl From<Comparison> for String {
    fn from(comparison: Comparison) -> Self {
        match comparison {
            Comparison::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attribute comparison inside a rule.
///
/// The right-hand side is either a literal `value` or a `target` attribute
/// path resolved against the same attributes. Any other properties are kept
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub comparison: Comparison,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// An explicit `null` stays `Some(Value::Null)` so the validator sees it.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Condition {
    /// Creates a condition with no right-hand side.
    pub fn new(comparison: impl Into<Comparison>) -> Self {
        Self {
            comparison: comparison.into(),
            value: None,
            target: None,
            extra: Map::new(),
        }
    }

    /// Sets the literal compare value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the target attribute path.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Adds an extra property.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A rule: attribute path to condition, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rule(IndexMap<String, Condition>);

impl Rule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a condition, replacing any previous one for the same path.
    pub fn insert(&mut self, path: impl Into<String>, condition: Condition) -> Option<Condition> {
        self.0.insert(path.into(), condition)
    }

    pub fn get(&self, path: &str) -> Option<&Condition> {
        self.0.get(path)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Condition> {
        self.0.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Condition)> for Rule {
    fn from_iter<I: IntoIterator<Item = (String, Condition)>>(iter: I) -> Self {
        Rule(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Rule {
    type Item = (&'a String, &'a Condition);
    type IntoIter = indexmap::map::Iter<'a, String, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The rules for one operation.
///
/// Serialized as `true`, `false` or an array of rules. `Deny` is never
/// valid input to the schema; it only expresses an explicit deny in
/// hand-built or reduced policies.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleList {
    /// Unconditionally allowed.
    Allow,
    /// Unconditionally denied.
    Deny,
    /// Allowed when any one rule holds.
    Rules(Vec<Rule>),
}

impl RuleList {
    pub fn is_allow(&self) -> bool {
        matches!(self, RuleList::Allow)
    }

    /// Returns the rules, if this list is not a literal.
    pub fn rules(&self) -> Option<&[Rule]> {
        match self {
            RuleList::Rules(rules) => Some(rules),
            _ => None,
        }
    }
}

impl From<bool> for RuleList {
    fn from(allow: bool) -> Self {
        if allow {
            RuleList::Allow
        } else {
            RuleList::Deny
        }
    }
}

impl From<Vec<Rule>> for RuleList {
    fn from(rules: Vec<Rule>) -> Self {
        RuleList::Rules(rules)
    }
}

impl Serialize for RuleList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RuleList::Allow => serializer.serialize_bool(true),
            RuleList::Deny => serializer.serialize_bool(false),
            RuleList::Rules(rules) => rules.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RuleList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Rules(Vec<Rule>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Flag(flag) => RuleList::from(flag),
            Raw::Rules(rules) => RuleList::Rules(rules),
        })
    }
}
