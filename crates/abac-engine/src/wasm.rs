//! WASM bindings for the policy engine.
//!
//! Policies, attributes and options cross the boundary as JSON strings.
//! Missing attributes may be passed as an empty string.

#![cfg(feature = "wasm")]

use crate::engine;
use crate::options::ReduceOptions;
use crate::policy::Policy;
use js_sys::Array;
use serde_json::Value;
use wasm_bindgen::prelude::*;

fn js_error(err: impl ToString) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_policy(json: &str) -> Result<Policy, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid policy: {}", e)))
}

fn parse_attributes(json: &str) -> Result<Value, JsValue> {
    if json.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid attributes: {}", e)))
}

fn to_array(items: impl IntoIterator<Item = String>) -> Array {
    items.into_iter().map(|item| JsValue::from_str(&item)).collect()
}

/// Validates a policy. Throws with the schema violation if it is malformed.
#[wasm_bindgen]
pub fn validate(policy_json: &str) -> Result<bool, JsValue> {
    engine::validate(&parse_policy(policy_json)?).map_err(js_error)
}

/// Merges a JSON array of policies into one policy (JSON).
#[wasm_bindgen]
pub fn merge(policies_json: &str) -> Result<String, JsValue> {
    let policies: Vec<Policy> = serde_json::from_str(policies_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid policies: {}", e)))?;
    let merged = engine::merge(&policies).map_err(js_error)?;
    serde_json::to_string(&merged).map_err(js_error)
}

/// Reduces a policy against the given attributes, returning the reduced
/// policy as JSON. `options_json` may be empty.
#[wasm_bindgen]
pub fn reduce(policy_json: &str, attributes_json: &str, options_json: &str) -> Result<String, JsValue> {
    let policy = parse_policy(policy_json)?;
    let attributes = parse_attributes(attributes_json)?;
    let options = if options_json.trim().is_empty() {
        ReduceOptions::default()
    } else {
        ReduceOptions::from_json(options_json).map_err(js_error)?
    };

    let reduced = engine::reduce(&policy, &attributes, &options).map_err(js_error)?;
    serde_json::to_string(&reduced).map_err(js_error)
}

/// Returns true if the policy grants the operation. Never throws; malformed
/// input denies.
#[wasm_bindgen]
pub fn enforce(operation: &str, policy_json: &str, attributes_json: &str) -> bool {
    match (parse_policy(policy_json), parse_attributes(attributes_json)) {
        (Ok(policy), Ok(attributes)) => engine::enforce(operation, &policy, &attributes),
        _ => false,
    }
}

/// Returns true if the policy grants the operation or might once more
/// attributes are known. For UI gating only.
#[wasm_bindgen(js_name = enforceLenient)]
pub fn enforce_lenient(operation: &str, policy_json: &str, attributes_json: &str) -> bool {
    match (parse_policy(policy_json), parse_attributes(attributes_json)) {
        (Ok(policy), Ok(attributes)) => engine::enforce_lenient(operation, &policy, &attributes),
        _ => false,
    }
}

/// Returns the first granted operation name, or `false`.
#[wasm_bindgen(js_name = enforceAny)]
pub fn enforce_any(operations: Vec<String>, policy_json: &str, attributes_json: &str) -> JsValue {
    let (Ok(policy), Ok(attributes)) = (parse_policy(policy_json), parse_attributes(attributes_json)) else {
        return JsValue::FALSE;
    };

    match engine::enforce_any(&operations, &policy, &attributes) {
        Some(operation) => JsValue::from_str(operation),
        None => JsValue::FALSE,
    }
}

/// Lists the operations the policy grants.
#[wasm_bindgen]
pub fn privileges(policy_json: &str, attributes_json: &str) -> Result<Array, JsValue> {
    let policy = parse_policy(policy_json)?;
    let attributes = parse_attributes(attributes_json)?;
    engine::privileges(&policy, &attributes)
        .map(to_array)
        .map_err(js_error)
}

/// Lists the operations the policy grants or might grant.
#[wasm_bindgen(js_name = privilegesLenient)]
pub fn privileges_lenient(policy_json: &str, attributes_json: &str) -> Result<Array, JsValue> {
    let policy = parse_policy(policy_json)?;
    let attributes = parse_attributes(attributes_json)?;
    engine::privileges_lenient(&policy, &attributes)
        .map(to_array)
        .map_err(js_error)
}

/// Returns the conditions on `attribute` within the given privileges, as a
/// JSON array.
#[wasm_bindgen]
pub fn extract(policy_json: &str, privileges: Vec<String>, attribute: &str) -> Result<String, JsValue> {
    let policy = parse_policy(policy_json)?;
    let conditions = engine::extract(&policy, &privileges, attribute).map_err(js_error)?;
    serde_json::to_string(&conditions).map_err(js_error)
}

/// Returns true if any rule reads the attribute or something nested under it.
#[wasm_bindgen(js_name = policyRequiresAttribute)]
pub fn policy_requires_attribute(policy_json: &str, attribute: &str) -> Result<bool, JsValue> {
    let policy = parse_policy(policy_json)?;
    Ok(engine::policy_requires_attribute(&policy, attribute))
}

/// Returns the version of the policy engine.
#[wasm_bindgen]
pub fn version() -> String {
    crate::VERSION.to_string()
}
