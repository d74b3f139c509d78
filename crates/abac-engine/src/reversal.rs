//! Condition reversal.
//!
//! A rule such as `{"user.patients": {"comparison": "includes", "target": "resource.subject"}}`
//! can only be decided once both sides are known. When the key side is known
//! and the target side is not, the condition is flipped so the unknown side
//! becomes the key: `{"resource.subject": {"comparison": "in", "target": "user.patients"}}`.
//! The flipped form states the same relation, and lets a partially reduced
//! policy be evaluated later with only the missing attributes.

use crate::attributes;
use crate::types::{Comparison, Condition};
use serde_json::Value;
use std::borrow::Cow;

impl Comparison {
    /// Returns the comparison stating the same relation with both sides swapped.
    ///
    /// `exists` has no target to swap with, and unknown comparisons have no
    /// defined inverse; both return `None`.
    pub fn reversed(&self) -> Option<Comparison> {
        let reversed = match self {
            Comparison::Equals => Comparison::Equals,
            Comparison::NotEquals => Comparison::NotEquals,
            Comparison::Includes => Comparison::In,
            Comparison::In => Comparison::Includes,
            Comparison::NotIncludes => Comparison::NotIn,
            Comparison::NotIn => Comparison::NotIncludes,
            Comparison::Superset => Comparison::Subset,
            Comparison::Subset => Comparison::Superset,
            Comparison::StartsWith => Comparison::PrefixOf,
            Comparison::PrefixOf => Comparison::StartsWith,
            Comparison::EndsWith => Comparison::SuffixOf,
            Comparison::SuffixOf => Comparison::EndsWith,
            Comparison::Exists | Comparison::Other(_) => return None,
        };
        Some(reversed)
    }
}

/// Flips `(path, condition)` when `path` is known and its target is not.
///
/// Otherwise returns both unchanged.
pub fn maybe_reverse<'r>(
    path: &'r str,
    condition: &'r Condition,
    attributes: &Value,
) -> (Cow<'r, str>, Cow<'r, Condition>) {
    let unchanged = (Cow::Borrowed(path), Cow::Borrowed(condition));

    let Some(target) = condition.target.as_deref() else {
        return unchanged;
    };
    let Some(reversed) = condition.comparison.reversed() else {
        return unchanged;
    };

    if attributes::is_known(attributes, path) && !attributes::is_known(attributes, target) {
        tracing::trace!(
            path = %path,
            target_path = %target,
            comparison = %condition.comparison,
            "reversing condition"
        );
        return (
            Cow::Owned(target.to_string()),
            Cow::Owned(Condition::new(reversed).with_target(path)),
        );
    }

    unchanged
}
