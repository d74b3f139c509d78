//! ABAC Policy Engine
//!
//! Attribute-based access control over JSON attribute bundles. A policy maps
//! operation names to lists of rules; a rule is a set of attribute
//! comparisons that must all hold. Policies can be enforced outright, or
//! reduced against the attributes known so far into a smaller policy that
//! only mentions what is still missing.
//!
//! Compiles to native and, with the `wasm` feature, to WASM for browser
//! clients.
//!
//! ```
//! use abac_engine::prelude::*;
//! use serde_json::json;
//!
//! let policy = Policy::from_json(r#"{"rules": {"readData": [
//!     {"resource.ownerId": {"comparison": "equals", "target": "user.id"}}
//! ]}}"#).unwrap();
//!
//! let attributes = json!({"user": {"id": "u1"}, "resource": {"ownerId": "u1"}});
//! assert!(enforce("readData", &policy, &attributes));
//! ```

pub mod attributes;
pub mod decision;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod options;
pub mod parser;
pub mod policy;
pub mod reducer;
pub mod reversal;
pub mod schema;
pub mod types;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use decision::{Reduced, Truth};
pub use engine::{
    enforce, enforce_any, enforce_lenient, extract, merge, policy_requires_attribute, privileges,
    privileges_lenient, reduce, validate,
};
pub use error::{PolicyError, Result};
pub use options::ReduceOptions;
pub use policy::{Policy, RuleBuilder};
pub use types::{Comparison, Condition, Rule, RuleList};

/// Version of the policy engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::decision::{Reduced, Truth};
    pub use crate::engine::*;
    pub use crate::error::{PolicyError, Result};
    pub use crate::options::ReduceOptions;
    pub use crate::policy::{Policy, RuleBuilder};
    pub use crate::types::*;
}
