//! Property-based tests using proptest.
//!
//! Policies are generated valid by construction over a small attribute
//! vocabulary: rule keys live under `user`, targets under `resource`, and
//! every slot is used at most once per rule.

use abac_engine::attributes;
use abac_engine::{
    enforce, enforce_lenient, merge, privileges, privileges_lenient, reduce, validate, Condition,
    Policy, ReduceOptions, Rule, RuleBuilder, RuleList,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const SLOTS: [&str; 3] = ["a", "b", "c"];
const OPERATIONS: [&str; 3] = ["readData", "writeData", "deleteData"];
const COMPARISONS: [&str; 13] = [
    "equals",
    "notEquals",
    "includes",
    "notIncludes",
    "in",
    "notIn",
    "superset",
    "subset",
    "startsWith",
    "endsWith",
    "prefixOf",
    "suffixOf",
    "exists",
];

fn attribute_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(json!("x")),
        Just(json!("y")),
        Just(json!("xy")),
        Just(json!([])),
        Just(json!(["x"])),
        Just(json!(["x", "y"])),
    ]
}

fn entity() -> impl Strategy<Value = Value> {
    prop::collection::vec(prop::option::of(attribute_value()), SLOTS.len()).prop_map(|values| {
        let fields: Map<String, Value> = SLOTS
            .iter()
            .zip(values)
            .filter_map(|(slot, value)| value.map(|value| (slot.to_string(), value)))
            .collect();
        Value::Object(fields)
    })
}

fn attribute_bundle() -> impl Strategy<Value = Value> {
    (entity(), entity()).prop_map(|(user, resource)| json!({"user": user, "resource": resource}))
}

fn literal_condition(comparison: &str, literal: &str) -> Condition {
    match comparison {
        "superset" | "subset" | "in" | "notIn" => Condition::new(comparison).with_value(json!([literal])),
        _ => Condition::new(comparison).with_value(literal),
    }
}

fn condition(slot: usize) -> impl Strategy<Value = (String, Condition)> {
    (
        prop::sample::select(COMPARISONS.to_vec()),
        any::<bool>(),
        prop::sample::select(vec!["x", "y", "xy"]),
    )
        .prop_map(move |(comparison, by_target, literal)| {
            let condition = match comparison {
                "exists" => Condition::new(comparison),
                _ if by_target => Condition::new(comparison).with_target(format!("resource.{}", SLOTS[slot])),
                _ => literal_condition(comparison, literal),
            };
            (format!("user.{}", SLOTS[slot]), condition)
        })
}

fn rule() -> impl Strategy<Value = Rule> {
    prop::sample::subsequence(vec![0usize, 1, 2], 1..=SLOTS.len())
        .prop_flat_map(|slots| slots.into_iter().map(condition).collect::<Vec<_>>())
        .prop_map(|conditions| conditions.into_iter().collect())
}

fn rule_list() -> impl Strategy<Value = RuleList> {
    prop_oneof![
        1 => Just(RuleList::Allow),
        4 => prop::collection::vec(rule(), 1..3).prop_map(RuleList::Rules),
    ]
}

fn policy() -> impl Strategy<Value = Policy> {
    prop::collection::vec((prop::sample::select(OPERATIONS.to_vec()), rule_list()), 0..4).prop_map(
        |entries| {
            entries
                .into_iter()
                .fold(Policy::new(), |policy, (operation, rules)| policy.with_rules(operation, rules))
        },
    )
}

fn only_user(attributes: &Value) -> Value {
    json!({"user": attributes["user"].clone()})
}

proptest! {
    #[test]
    fn generated_policies_are_valid(policy in policy()) {
        prop_assert!(validate(&policy).is_ok());
    }

    #[test]
    fn reduce_is_idempotent(policy in policy(), attrs in attribute_bundle()) {
        let options = ReduceOptions::default();
        let once = reduce(&policy, &attrs, &options).unwrap();
        let twice = reduce(&once, &attrs, &options).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn partial_reduce_is_idempotent(policy in policy(), attrs in attribute_bundle()) {
        let partial = only_user(&attrs);
        let options = ReduceOptions::default();
        let once = reduce(&policy, &partial, &options).unwrap();
        let twice = reduce(&once, &partial, &options).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn enforce_agrees_with_reduce(policy in policy(), attrs in attribute_bundle()) {
        let reduced = reduce(&policy, &attrs, &ReduceOptions::default()).unwrap();
        for operation in OPERATIONS {
            let allowed = reduced.rule_list(operation) == Some(&RuleList::Allow);
            prop_assert_eq!(enforce(operation, &policy, &attrs), allowed);
        }
    }

    #[test]
    fn lenient_agrees_with_privileges_lenient(policy in policy(), attrs in attribute_bundle()) {
        let lenient = privileges_lenient(&policy, &attrs).unwrap();
        for operation in OPERATIONS {
            prop_assert_eq!(
                enforce_lenient(operation, &policy, &attrs),
                lenient.iter().any(|granted| granted == operation)
            );
        }
    }

    #[test]
    fn reversed_residual_enforces_like_original(policy in policy(), attrs in attribute_bundle()) {
        let reduced = reduce(&policy, &only_user(&attrs), &ReduceOptions::default()).unwrap();
        prop_assert!(validate(&reduced).is_ok());
        for operation in OPERATIONS {
            prop_assert_eq!(
                enforce(operation, &reduced, &attrs),
                enforce(operation, &policy, &attrs),
                "operation {}", operation
            );
        }
    }

    #[test]
    fn merge_of_one_is_identity(policy in policy()) {
        prop_assert_eq!(merge(std::slice::from_ref(&policy)).unwrap(), policy);
    }

    #[test]
    fn merge_is_most_permissive(policies in prop::collection::vec(policy(), 0..4), attrs in attribute_bundle()) {
        let merged = merge(&policies).unwrap();
        for operation in OPERATIONS {
            if policies.iter().any(|p| p.rule_list(operation) == Some(&RuleList::Allow)) {
                prop_assert_eq!(merged.rule_list(operation), Some(&RuleList::Allow));
            }
            let any_grants = policies.iter().any(|p| enforce(operation, p, &attrs));
            prop_assert_eq!(enforce(operation, &merged, &attrs), any_grants);
        }
    }

    #[test]
    fn wildcard_fails_if_any_branch_fails(items in prop::collection::vec(prop::option::of(0i64..10), 0..6)) {
        let array: Vec<Value> = items
            .iter()
            .map(|item| match item {
                Some(n) => json!({"b": n}),
                None => json!({"c": 0}),
            })
            .collect();
        let attrs = json!({"a": array});

        let resolved: Vec<Value> = attributes::resolve(&attrs, "a.*.b")
            .into_iter()
            .map(|value| value.into_owned())
            .collect();

        let expected: Vec<Value> = match items.iter().copied().collect::<Option<Vec<i64>>>() {
            Some(all) => all.into_iter().map(Value::from).collect(),
            None => Vec::new(),
        };
        prop_assert_eq!(resolved, expected);
    }

    #[test]
    fn unknown_comparison_denies(
        attrs in attribute_bundle(),
        slot in prop::sample::select(SLOTS.to_vec()),
        by_target in any::<bool>(),
    ) {
        let condition = if by_target {
            Condition::new("mystery").with_target(format!("resource.{slot}"))
        } else {
            Condition::new("mystery").with_value("x")
        };
        let policy = Policy::new().with_rules(
            "readData",
            vec![RuleBuilder::new().condition(format!("user.{slot}"), condition).build()],
        );

        prop_assert!(!enforce("readData", &policy, &attrs));
        prop_assert!(privileges(&policy, &attrs).unwrap().is_empty());
    }
}
