//! Comparison evaluation.

use crate::attributes;
use crate::decision::Truth;
use crate::types::{Comparison, Condition};
use serde_json::Value;
use std::borrow::Cow;

/// Returns the right-hand side of `condition`.
///
/// A `target` takes precedence over a literal `value` and resolves to its
/// first value in `attributes`.
pub fn compare_value<'a>(condition: &'a Condition, attributes: &'a Value) -> Option<Cow<'a, Value>> {
    match &condition.target {
        Some(target) => attributes::resolve_first(attributes, target),
        None => condition.value.as_ref().map(Cow::Borrowed),
    }
}

/// Evaluates `condition` for one resolved attribute `value`.
///
/// Returns [`Truth::Unknown`] when the compare value is not available yet.
/// Unknown comparisons always evaluate to [`Truth::False`].
pub fn compare(condition: &Condition, value: &Value, attributes: &Value) -> Truth {
    if !condition.comparison.is_known() {
        return Truth::False;
    }

    // `value` was resolved, so it exists; `exists` needs nothing else.
    if condition.comparison == Comparison::Exists {
        return Truth::True;
    }

    let Some(expected) = compare_value(condition, attributes) else {
        return Truth::Unknown;
    };

    Truth::from(evaluate_operator(&condition.comparison, value, &expected))
}

fn evaluate_operator(comparison: &Comparison, left: &Value, right: &Value) -> bool {
    match comparison {
        Comparison::Equals => values_equal(left, right),
        Comparison::NotEquals => !values_equal(left, right),

        Comparison::Includes => left.as_array().is_some_and(|items| contains(items, right)),
        Comparison::NotIncludes => left.as_array().is_some_and(|items| !contains(items, right)),

        Comparison::In => right.as_array().is_some_and(|items| contains(items, left)),
        Comparison::NotIn => right.as_array().is_some_and(|items| !contains(items, left)),

        Comparison::Superset => match (left.as_array(), right.as_array()) {
            (Some(left), Some(right)) => right.iter().all(|item| contains(left, item)),
            _ => false,
        },
        Comparison::Subset => match (left.as_array(), right.as_array()) {
            (Some(left), Some(right)) => left.iter().all(|item| contains(right, item)),
            _ => false,
        },

        Comparison::StartsWith => strings(left, right).is_some_and(|(l, r)| l.starts_with(r)),
        Comparison::EndsWith => strings(left, right).is_some_and(|(l, r)| l.ends_with(r)),
        Comparison::PrefixOf => strings(left, right).is_some_and(|(l, r)| r.starts_with(l)),
        Comparison::SuffixOf => strings(left, right).is_some_and(|(l, r)| r.ends_with(l)),

        Comparison::Exists => true,
        Comparison::Other(_) => false,
    }
}

/// Structural equality where numbers compare by value (`1 == 1.0`).
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l == r,
            _ => match (l.as_u64(), r.as_u64()) {
                (Some(l), Some(r)) => l == r,
                _ => l.as_f64() == r.as_f64(),
            },
        },
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, l)| r.get(key).is_some_and(|r| values_equal(l, r)))
        }
        _ => left == right,
    }
}

fn contains(items: &[Value], needle: &Value) -> bool {
    items.iter().any(|item| values_equal(item, needle))
}

fn strings<'v>(left: &'v Value, right: &'v Value) -> Option<(&'v str, &'v str)> {
    Some((left.as_str()?, right.as_str()?))
}
