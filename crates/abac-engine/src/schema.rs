//! Policy document schema.
//!
//! Structural checks that typed deserialization cannot express: operation
//! name bounds, non-empty rule lists, the attribute path grammar and the
//! allowed shapes of each comparison.

use crate::attributes::MAX_PATH_SEGMENTS;
use crate::error::{PolicyError, Result};
use crate::options::ReduceOptions;
use crate::policy::Policy;
use crate::types::{Comparison, Condition, Rule, RuleList};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

static PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([$%a-zA-Z_][$%0-9a-zA-Z_]*)|\*)(\.([$%0-9a-zA-Z_]*)|\*)*$")
        .expect("attribute path pattern is valid")
});

static OPERATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]+").expect("operation name pattern is valid"));

const OPERATION_NAME_MIN: usize = 1;
const OPERATION_NAME_MAX: usize = 64;

/// Documents the validator knows how to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Policy,
    ReduceOptions,
}

impl Schema {
    pub fn name(&self) -> &'static str {
        match self {
            Schema::Policy => "Policy",
            Schema::ReduceOptions => "ReduceOptions",
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validates an untyped JSON document against `schema`.
pub fn validate_document(schema: Schema, document: &Value) -> Result<()> {
    if !document.is_object() {
        return Err(PolicyError::invalid("data", "should be object"));
    }

    let shape_error = |err: serde_json::Error| PolicyError::invalid("data", err.to_string());
    match schema {
        Schema::Policy => {
            let policy: Policy = serde_json::from_value(document.clone()).map_err(shape_error)?;
            validate_policy(&policy)
        }
        Schema::ReduceOptions => {
            let options: ReduceOptions =
                serde_json::from_value(document.clone()).map_err(shape_error)?;
            validate_options(&options)
        }
    }
}

/// Validates a policy.
pub fn validate_policy(policy: &Policy) -> Result<()> {
    for (operation, rules) in &policy.rules {
        validate_operation_name(operation)?;

        let location = format!("rules.{operation}");
        match rules {
            RuleList::Allow => {}
            RuleList::Deny => {
                return Err(PolicyError::invalid(location, "should be equal to constant true"));
            }
            RuleList::Rules(rules) if rules.is_empty() => {
                return Err(PolicyError::invalid(location, "should NOT have fewer than 1 items"));
            }
            RuleList::Rules(rules) => {
                for (index, rule) in rules.iter().enumerate() {
                    validate_rule(&format!("{location}[{index}]"), rule)?;
                }
            }
        }
    }
    Ok(())
}

/// Validates reduce options.
pub fn validate_options(options: &ReduceOptions) -> Result<()> {
    match &options.inline_targets {
        Some(targets) if targets.is_empty() => Err(PolicyError::invalid(
            "data.inlineTargets",
            "should NOT have fewer than 1 items",
        )),
        _ => Ok(()),
    }
}

/// Returns true if `path` is a well-formed attribute path.
pub fn is_valid_path(path: &str) -> bool {
    PATH_PATTERN.is_match(path) && path.split('.').count() <= MAX_PATH_SEGMENTS
}

fn validate_operation_name(name: &str) -> Result<()> {
    let location = format!("rules['{name}']");
    let length = name.chars().count();
    if length < OPERATION_NAME_MIN {
        return Err(PolicyError::invalid(
            location,
            format!("should NOT be shorter than {OPERATION_NAME_MIN} characters"),
        ));
    }
    if length > OPERATION_NAME_MAX {
        return Err(PolicyError::invalid(
            location,
            format!("should NOT be longer than {OPERATION_NAME_MAX} characters"),
        ));
    }
    if !OPERATION_PATTERN.is_match(name) {
        return Err(PolicyError::invalid(
            location,
            format!("should match pattern \"{}\"", OPERATION_PATTERN.as_str()),
        ));
    }
    Ok(())
}

fn validate_rule(location: &str, rule: &Rule) -> Result<()> {
    for (path, condition) in rule {
        if !is_valid_path(path) {
            return Err(PolicyError::invalid(
                location,
                format!("has an invalid attribute path '{path}'"),
            ));
        }
        if matching_shapes(condition) != 1 {
            return Err(PolicyError::invalid(
                format!("{location}[\"{path}\"]"),
                "should match exactly one schema in oneOf",
            ));
        }
    }
    Ok(())
}

/// Counts the comparison shapes `condition` satisfies.
fn matching_shapes(condition: &Condition) -> usize {
    use Comparison::*;

    let comparison = &condition.comparison;
    let closed = condition.extra.is_empty();
    let value = condition.value.as_ref();
    let target = condition.target.as_deref();

    let shapes = [
        // literal list
        closed
            && target.is_none()
            && matches!(comparison, Superset | Subset | In | NotIn | Equals | NotEquals)
            && value.is_some_and(is_scalar_list),
        // literal scalar
        closed
            && target.is_none()
            && matches!(comparison, Includes | NotIncludes | Equals | NotEquals)
            && value.is_some_and(is_scalar),
        // string affixes, literal and/or target
        closed
            && matches!(comparison, StartsWith | PrefixOf | SuffixOf | EndsWith)
            && value.map_or(true, Value::is_string)
            && target.map_or(true, is_valid_path),
        // literal boolean
        closed
            && target.is_none()
            && matches!(comparison, Equals | NotEquals)
            && value.is_some_and(Value::is_boolean),
        // target
        closed
            && value.is_none()
            && matches!(
                comparison,
                Superset | Subset | In | Equals | Includes | NotIncludes | NotEquals | NotIn
            )
            && target.is_some_and(is_valid_path),
        // anything the engine does not compare with a right-hand side
        matches!(comparison, Exists | Other(_)),
    ];

    shapes.iter().filter(|matched| **matched).count()
}

fn is_scalar(value: &Value) -> bool {
    value.is_number() || value.is_string()
}

fn is_scalar_list(value: &Value) -> bool {
    value.as_array().is_some_and(|items| items.iter().all(is_scalar))
}
