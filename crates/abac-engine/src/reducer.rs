//! Partial evaluation of rules against known attributes.
//!
//! Reducing a rule evaluates every condition whose attribute is known and
//! keeps the rest as a residual rule. A rule list is allowed as soon as one
//! rule reduces to allow, and denied once every rule has been denied.

use crate::attributes::{self, AttributePath};
use crate::decision::{Reduced, Truth};
use crate::evaluator;
use crate::reversal;
use crate::types::{Condition, Rule, RuleList};
use serde_json::Value;
use std::borrow::Cow;

/// Reduces a single rule.
///
/// Each condition is first reversed if its key is known and its target is
/// not, then inlined if its target falls under one of `inline_targets` and
/// resolves. The condition is then checked against every value its path
/// resolves to:
/// - no values: the condition stays in the residual
/// - any value compares false: the whole rule is denied
/// - a value compares unknown: the condition stays in the residual
///
/// A rule with an empty residual is allowed.
pub fn reduce_rule(rule: &Rule, attributes: &Value, inline_targets: &[AttributePath]) -> Reduced<Rule> {
    let mut residual = Rule::new();

    for (path, condition) in rule {
        let (path, condition) = reversal::maybe_reverse(path, condition, attributes);
        let condition = inline(condition, attributes, inline_targets);

        let values = attributes::resolve(attributes, &path);
        if values.is_empty() {
            residual.insert(path.into_owned(), condition.into_owned());
            continue;
        }

        for value in &values {
            match evaluator::compare(&condition, value, attributes) {
                Truth::True => {}
                Truth::False => return Reduced::Deny,
                Truth::Unknown => {
                    residual.insert(path.into_owned(), condition.into_owned());
                    break;
                }
            }
        }
    }

    if residual.is_empty() {
        Reduced::Allow
    } else {
        Reduced::Partial(residual)
    }
}

/// Reduces the rules of one operation.
///
/// Rules that reduce to deny are dropped; if none remain the operation is
/// denied.
pub fn reduce_rules(
    rules: &RuleList,
    attributes: &Value,
    inline_targets: &[AttributePath],
) -> Reduced<Vec<Rule>> {
    let rules = match rules {
        RuleList::Allow => return Reduced::Allow,
        RuleList::Deny => return Reduced::Deny,
        RuleList::Rules(rules) => rules,
    };

    let mut residual = Vec::new();
    for rule in rules {
        match reduce_rule(rule, attributes, inline_targets) {
            Reduced::Allow => return Reduced::Allow,
            Reduced::Deny => {}
            Reduced::Partial(rule) => residual.push(rule),
        }
    }

    if residual.is_empty() {
        Reduced::Deny
    } else {
        Reduced::Partial(residual)
    }
}

fn inline<'c>(
    condition: Cow<'c, Condition>,
    attributes: &Value,
    inline_targets: &[AttributePath],
) -> Cow<'c, Condition> {
    let Some(target) = condition.target.as_deref() else {
        return condition;
    };

    let target_path = AttributePath::parse(target);
    if !inline_targets.iter().any(|prefix| prefix.is_prefix_of(&target_path)) {
        return condition;
    }

    let Some(value) = target_path.resolve(attributes).into_iter().next() else {
        return condition;
    };

    tracing::trace!(path = %target_path, "inlining target value");
    let mut condition = condition.into_owned();
    condition.value = Some(value.into_owned());
    condition.target = None;
    Cow::Owned(condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Comparison;
    use serde_json::json;

    fn rule(document: Value) -> Rule {
        serde_json::from_value(document).unwrap()
    }

    fn reduce(document: Value, attributes: &Value) -> Reduced<Rule> {
        reduce_rule(&rule(document), attributes, &[])
    }

    #[test]
    fn test_rule_allowed_when_every_condition_holds() {
        let attrs = json!({"user": {"groups": ["a", "b", "c"]}, "resource": {"dataset": "d1"}});
        let reduced = reduce(
            json!({
                "user.groups": {"comparison": "superset", "value": ["a", "b"]},
                "resource.dataset": {"comparison": "equals", "value": "d1"}
            }),
            &attrs,
        );
        assert_eq!(reduced, Reduced::Allow);
    }

    #[test]
    fn test_rule_denied_on_first_false() {
        let attrs = json!({"user": {"groups": ["a"]}});
        let reduced = reduce(
            json!({
                "resource.dataset": {"comparison": "equals", "value": "d1"},
                "user.groups": {"comparison": "superset", "value": ["a", "b"]}
            }),
            &attrs,
        );
        assert_eq!(reduced, Reduced::Deny);
    }

    #[test]
    fn test_unknown_attributes_stay_residual() {
        let attrs = json!({"user": {"groups": ["a", "b"]}});
        let reduced = reduce(
            json!({
                "user.groups": {"comparison": "superset", "value": ["a", "b"]},
                "resource.dataset": {"comparison": "equals", "value": "d1"}
            }),
            &attrs,
        );
        assert_eq!(
            reduced,
            Reduced::Partial(rule(json!({
                "resource.dataset": {"comparison": "equals", "value": "d1"}
            })))
        );
    }

    #[test]
    fn test_wildcard_values_all_checked() {
        let document = json!({"some.*.property": {"comparison": "equals", "value": "test"}});

        let all = json!({"some": [{"property": "test"}, {"property": "test"}]});
        assert_eq!(reduce(document.clone(), &all), Reduced::Allow);

        let one_off = json!({"some": [{"property": "test"}, {"property": "other"}]});
        assert_eq!(reduce(document.clone(), &one_off), Reduced::Deny);

        let missing = json!({"some": [{"property": "test"}, {"other": "test"}]});
        assert!(reduce(document, &missing).residual().is_some());
    }

    #[test]
    fn test_rule_list_short_circuits_on_allow() {
        let attrs = json!({"user": {"groups": ["admin"]}});
        let rules = RuleList::Rules(vec![
            rule(json!({"resource.dataset": {"comparison": "equals", "value": "d1"}})),
            rule(json!({"user.groups": {"comparison": "includes", "value": "admin"}})),
        ]);
        assert_eq!(reduce_rules(&rules, &attrs, &[]), Reduced::Allow);
    }

    #[test]
    fn test_rule_list_drops_denied_rules() {
        let attrs = json!({"user": {"groups": []}});
        let rules = RuleList::Rules(vec![
            rule(json!({"user.groups": {"comparison": "includes", "value": "admin"}})),
            rule(json!({"resource.dataset": {"comparison": "equals", "value": "d1"}})),
        ]);
        assert_eq!(
            reduce_rules(&rules, &attrs, &[]),
            Reduced::Partial(vec![rule(json!({
                "resource.dataset": {"comparison": "equals", "value": "d1"}
            }))])
        );

        let denied = RuleList::Rules(vec![rule(json!({
            "user.groups": {"comparison": "includes", "value": "admin"}
        }))]);
        assert_eq!(reduce_rules(&denied, &attrs, &[]), Reduced::Deny);
    }

    #[test]
    fn test_rule_list_literals() {
        assert_eq!(reduce_rules(&RuleList::Allow, &Value::Null, &[]), Reduced::Allow);
        assert_eq!(reduce_rules(&RuleList::Deny, &Value::Null, &[]), Reduced::Deny);
        assert_eq!(reduce_rules(&RuleList::Rules(vec![]), &Value::Null, &[]), Reduced::Deny);
    }

    #[test]
    fn test_reversed_conditions_in_residual() {
        let attrs = json!({
            "user": {"customAttributes": {
                "secret": "confidential",
                "id": "user-id",
                "patient": "patient-zero",
                "patients": ["patient-one", "patient-two"],
                "rank": "1-2-3",
                "positions": ["ADMIRAL", "CAPTAIN"]
            }},
            "resource": {"carrierName": "verizon", "lastName": "Johnson"}
        });

        let reduced = reduce(
            json!({
                "user.customAttributes.secret": {"comparison": "suffixOf", "target": "resource.secret"},
                "user.customAttributes.id": {"comparison": "equals", "target": "resource.id"},
                "user.customAttributes.isActive": {"comparison": "exists"},
                "user.customAttributes.patient": {"comparison": "in", "target": "resource.patients"},
                "user.customAttributes.patients": {"comparison": "includes", "target": "resource.patient"},
                "user.customAttributes.rank": {"comparison": "prefixOf", "target": "resource.rankOrder"},
                "user.customAttributes.positions": {"comparison": "superset", "target": "resource.positions"},
                "user.customAttributes.favoriteSauce": {"comparison": "in", "value": ["ketchup", "mayo"]},
                "user.customAttributes.lastNames": {"comparison": "includes", "target": "resource.lastName"},
                "user.customAttributes.carrierNames": {"comparison": "notIncludes", "target": "resource.carrierName"}
            }),
            &attrs,
        );

        assert_eq!(
            reduced,
            Reduced::Partial(rule(json!({
                "resource.secret": {"comparison": "endsWith", "target": "user.customAttributes.secret"},
                "resource.id": {"comparison": "equals", "target": "user.customAttributes.id"},
                "user.customAttributes.isActive": {"comparison": "exists"},
                "resource.patients": {"comparison": "includes", "target": "user.customAttributes.patient"},
                "resource.patient": {"comparison": "in", "target": "user.customAttributes.patients"},
                "resource.rankOrder": {"comparison": "startsWith", "target": "user.customAttributes.rank"},
                "resource.positions": {"comparison": "subset", "target": "user.customAttributes.positions"},
                "user.customAttributes.favoriteSauce": {"comparison": "in", "value": ["ketchup", "mayo"]},
                "user.customAttributes.lastNames": {"comparison": "includes", "target": "resource.lastName"},
                "user.customAttributes.carrierNames": {"comparison": "notIncludes", "target": "resource.carrierName"}
            })))
        );
    }

    #[test]
    fn test_inline_targets() {
        let attrs = json!({
            "user": {
                "customAttributes": {
                    "myCustomPatients": ["patient-one", "patient-two"],
                    "forbiddenOrgId": "e-corp",
                    "isPastDue": true
                },
                "customAttributesEdgeCase": "some-value"
            },
            "resource": {"ownerId": "testuser"}
        });
        let inline = [AttributePath::parse("user.customAttributes")];

        let reduced = reduce_rule(
            &rule(json!({
                "resource.id": {"comparison": "in", "target": "user.customAttributes.myCustomPatients"},
                "resource.orgId": {"comparison": "notEquals", "target": "user.customAttributes.forbiddenOrgId"},
                "resource.isPastDue": {"comparison": "notEquals", "target": "user.customAttributes.isPastDue"},
                "resource.anotherSecret": {"comparison": "equals", "target": "user.customAttributesEdgeCase"},
                "resource.isActive": {"comparison": "equals", "target": "user.customAttributes.isActive"}
            })),
            &attrs,
            &inline,
        );

        assert_eq!(
            reduced,
            Reduced::Partial(rule(json!({
                "resource.id": {"comparison": "in", "value": ["patient-one", "patient-two"]},
                "resource.orgId": {"comparison": "notEquals", "value": "e-corp"},
                "resource.isPastDue": {"comparison": "notEquals", "value": true},
                "resource.anotherSecret": {"comparison": "equals", "target": "user.customAttributesEdgeCase"},
                "resource.isActive": {"comparison": "equals", "target": "user.customAttributes.isActive"}
            })))
        );
    }

    #[test]
    fn test_inline_falsy_values() {
        let attrs = json!({"user": {"flags": {"isPastDue": false, "balance": 0, "nickname": ""}}});
        let inline = [AttributePath::parse("user.flags")];

        let reduced = reduce_rule(
            &rule(json!({
                "resource.isPastDue": {"comparison": "equals", "target": "user.flags.isPastDue"},
                "resource.balance": {"comparison": "notEquals", "target": "user.flags.balance"},
                "resource.nickname": {"comparison": "equals", "target": "user.flags.nickname"}
            })),
            &attrs,
            &inline,
        );

        let residual = reduced.residual().unwrap();
        for (path, expected) in [
            ("resource.isPastDue", json!(false)),
            ("resource.balance", json!(0)),
            ("resource.nickname", json!("")),
        ] {
            let condition = residual.get(path).unwrap();
            assert_eq!(condition.value, Some(expected), "{path}");
            assert_eq!(condition.target, None, "{path}");
        }
    }

    #[test]
    fn test_inlined_value_is_compared() {
        let attrs = json!({"user": {"id": "u1"}, "resource": {"ownerId": "u1"}});
        let inline = [AttributePath::parse("user")];
        let condition = Condition::new(Comparison::Equals).with_target("user.id");
        let rule: Rule = [("resource.ownerId".to_string(), condition)].into_iter().collect();

        assert_eq!(reduce_rule(&rule, &attrs, &inline), Reduced::Allow);
    }
}
