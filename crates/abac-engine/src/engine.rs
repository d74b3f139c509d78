//! Policy operations built on rule reduction.
//!
//! `reduce`, `validate`, `merge` and the privilege queries report malformed
//! policies as errors. The `enforce` family is fail-closed instead: a policy
//! that does not validate denies every operation.

use crate::attributes::AttributePath;
use crate::decision::Reduced;
use crate::error::Result;
use crate::options::ReduceOptions;
use crate::policy::Policy;
use crate::reducer;
use crate::schema;
use crate::types::{Condition, Rule, RuleList};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

/// Validates a policy, returning `true` if it is well formed.
pub fn validate(policy: &Policy) -> Result<bool> {
    schema::validate_policy(policy)?;
    Ok(true)
}

/// Merges policies into one with the same effect.
///
/// For each operation, `true` in any policy wins; otherwise the rule lists
/// are concatenated in input order.
pub fn merge(policies: &[Policy]) -> Result<Policy> {
    let mut rules: IndexMap<String, RuleList> = IndexMap::new();

    for policy in policies {
        validate(policy)?;

        for (operation, incoming) in &policy.rules {
            match (incoming, rules.get_mut(operation)) {
                (RuleList::Allow, Some(existing)) => *existing = RuleList::Allow,
                (RuleList::Rules(more), Some(RuleList::Rules(existing))) => {
                    existing.extend(more.iter().cloned());
                }
                (_, Some(_)) => {}
                (_, None) => {
                    rules.insert(operation.clone(), incoming.clone());
                }
            }
        }
    }

    Ok(Policy { rules })
}

/// Reduces a policy against the attributes known so far.
///
/// Operations that can no longer be granted are dropped. Operations that are
/// granted regardless of the missing attributes become `true`; the rest keep
/// their residual rules.
pub fn reduce(policy: &Policy, attributes: &Value, options: &ReduceOptions) -> Result<Policy> {
    validate(policy)?;
    schema::validate_options(options)?;

    let inline_targets = options.inline_paths();
    let mut rules = IndexMap::new();

    for (operation, rule_list) in &policy.rules {
        match reducer::reduce_rules(rule_list, attributes, &inline_targets) {
            Reduced::Allow => {
                debug!(operation = %operation, "operation allowed");
                rules.insert(operation.clone(), RuleList::Allow);
            }
            Reduced::Deny => {
                debug!(operation = %operation, "operation denied");
            }
            Reduced::Partial(residual) => {
                debug!(operation = %operation, rules = residual.len(), "operation pending");
                rules.insert(operation.clone(), RuleList::Rules(residual));
            }
        }
    }

    Ok(Policy { rules })
}

/// Returns true if `policy` grants `operation` given `attributes`.
///
/// Unknown operations and invalid policies deny.
pub fn enforce(operation: &str, policy: &Policy, attributes: &Value) -> bool {
    decide(operation, policy, attributes).is_some_and(|decision| decision.is_allowed())
}

/// Returns true if `policy` grants `operation` or might grant it once more
/// attributes are known.
///
/// Suitable for hiding or annotating client UI. It is not an authorization
/// check.
pub fn enforce_lenient(operation: &str, policy: &Policy, attributes: &Value) -> bool {
    decide(operation, policy, attributes).is_some_and(|decision| decision.may_allow())
}

/// Returns the first of `operations` that `policy` grants.
pub fn enforce_any<'o, S: AsRef<str>>(
    operations: &'o [S],
    policy: &Policy,
    attributes: &Value,
) -> Option<&'o str> {
    operations
        .iter()
        .map(|operation| operation.as_ref())
        .find(|operation| enforce(operation, policy, attributes))
}

/// Returns the operations `policy` grants given `attributes`, in policy order.
pub fn privileges(policy: &Policy, attributes: &Value) -> Result<Vec<String>> {
    let reduced = reduce(policy, attributes, &ReduceOptions::default())?;
    Ok(reduced
        .rules
        .into_iter()
        .filter(|(_, rules)| rules.is_allow())
        .map(|(operation, _)| operation)
        .collect())
}

/// Returns the operations `policy` grants or might grant once more
/// attributes are known, in policy order.
pub fn privileges_lenient(policy: &Policy, attributes: &Value) -> Result<Vec<String>> {
    let reduced = reduce(policy, attributes, &ReduceOptions::default())?;
    Ok(reduced.rules.into_keys().collect())
}

/// Collects the conditions keyed exactly by `attribute` in the rules of the
/// given privileges.
///
/// Operations are visited in policy order. Operations granted with `true`
/// contribute nothing.
pub fn extract<S: AsRef<str>>(
    policy: &Policy,
    privileges: &[S],
    attribute: &str,
) -> Result<Vec<Condition>> {
    validate(policy)?;

    let wanted = |operation: &str| privileges.iter().any(|p| p.as_ref() == operation);

    Ok(policy
        .rules
        .iter()
        .filter(|(operation, _)| wanted(operation))
        .filter_map(|(_, rules)| rules.rules())
        .flatten()
        .filter_map(|rule| rule.get(attribute).cloned())
        .collect())
}

/// Returns true if any rule of `policy` reads `attribute`, either as a rule
/// key or as a target, or reads something nested under it.
pub fn policy_requires_attribute(policy: &Policy, attribute: &str) -> bool {
    let attribute = AttributePath::parse(attribute);
    let reads = |path: &str| attribute.is_prefix_of(&AttributePath::parse(path));

    policy
        .rules
        .values()
        .filter_map(RuleList::rules)
        .flatten()
        .flat_map(|rule| rule.iter())
        .any(|(path, condition)| reads(path) || condition.target.as_deref().is_some_and(reads))
}

fn decide(operation: &str, policy: &Policy, attributes: &Value) -> Option<Reduced<Vec<Rule>>> {
    if let Err(err) = schema::validate_policy(policy) {
        warn!(operation = %operation, error = %err, "refusing to enforce invalid policy");
        return None;
    }

    let decision = match policy.rule_list(operation) {
        Some(rules) => reducer::reduce_rules(rules, attributes, &[]),
        None => Reduced::Deny,
    };
    Some(decision)
}
