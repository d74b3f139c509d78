//! Attribute path resolution.
//!
//! Paths use dot notation over the attribute bundle:
//! - `user.groups` looks up nested keys
//! - `array.0.value` indexes into arrays
//! - `some.*.property` fans out over every child of `some`; if any child
//!   fails to resolve, the whole path resolves to nothing
//! - `object.%keys` yields the key names of `object` as an array, so
//!   `object.%keys.length` and `object.%keys.*` constrain the key set
//! - `%%keys` matches a literal `%keys` key
//!
//! `null` is treated as absent at every level.

use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Maximum number of segments accepted in rule keys and targets.
pub const MAX_PATH_SEGMENTS: usize = 32;

/// One segment of an attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal key or array index.
    Key(String),
    /// `*`: every child of the current container.
    Wildcard,
    /// `%keys`: the key names of the current container.
    Keys,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw {
            "*" => Segment::Wildcard,
            "%keys" => Segment::Keys,
            _ => match raw.strip_prefix("%%") {
                Some(rest) => Segment::Key(format!("%{rest}")),
                None => Segment::Key(raw.to_string()),
            },
        }
    }
}

/// A parsed, dot-delimited attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    raw: String,
    segments: Vec<Segment>,
}

impl AttributePath {
    pub fn parse(path: &str) -> Self {
        Self {
            raw: path.to_string(),
            segments: path.split('.').map(Segment::parse).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true if `self` is a segment-wise prefix of `other`.
    ///
    /// `user` and `user.patients` are prefixes of `user.patients`;
    /// `user.pat` is not.
    pub fn is_prefix_of(&self, other: &AttributePath) -> bool {
        self.segments.len() <= other.segments.len()
            && self
                .raw
                .split('.')
                .zip(other.raw.split('.'))
                .all(|(left, right)| left == right)
    }

    /// Resolves this path against `attributes`.
    pub fn resolve<'a>(&self, attributes: &'a Value) -> Vec<Cow<'a, Value>> {
        resolve_segments(Cow::Borrowed(attributes), &self.segments)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Resolves `path` against `attributes` into every value it names.
pub fn resolve<'a>(attributes: &'a Value, path: &str) -> Vec<Cow<'a, Value>> {
    AttributePath::parse(path).resolve(attributes)
}

/// Resolves `path` and returns the first value, if any.
pub fn resolve_first<'a>(attributes: &'a Value, path: &str) -> Option<Cow<'a, Value>> {
    resolve(attributes, path).into_iter().next()
}

/// Returns true if `path` names at least one value in `attributes`.
pub fn is_known(attributes: &Value, path: &str) -> bool {
    !resolve(attributes, path).is_empty()
}

fn resolve_segments<'a>(current: Cow<'a, Value>, segments: &[Segment]) -> Vec<Cow<'a, Value>> {
    if current.is_null() {
        return Vec::new();
    }

    let Some((segment, rest)) = segments.split_first() else {
        return vec![current];
    };

    match segment {
        Segment::Wildcard => {
            let branches = match current {
                Cow::Borrowed(value) => children(value).into_iter().map(Cow::Borrowed).collect(),
                Cow::Owned(value) => children(&value)
                    .into_iter()
                    .map(|child| Cow::Owned(child.clone()))
                    .collect::<Vec<_>>(),
            };

            let mut values = Vec::new();
            for child in branches {
                let resolved = resolve_segments(child, rest);
                if resolved.is_empty() {
                    return Vec::new();
                }
                values.extend(resolved);
            }
            values
        }
        Segment::Keys => resolve_segments(Cow::Owned(key_names(&current)), rest),
        Segment::Key(key) => {
            let child = match current {
                Cow::Borrowed(value) => lookup(value, key),
                Cow::Owned(value) => lookup(&value, key).map(|child| Cow::Owned(child.into_owned())),
            };
            match child {
                Some(child) => resolve_segments(child, rest),
                None => Vec::new(),
            }
        }
    }
}

fn children(value: &Value) -> Vec<&Value> {
    match value {
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    }
}

fn key_names(value: &Value) -> Value {
    match value {
        Value::Object(map) => map.keys().cloned().map(Value::String).collect(),
        Value::Array(items) => (0..items.len()).map(|i| Value::String(i.to_string())).collect(),
        _ => Value::Array(Vec::new()),
    }
}

fn lookup<'v>(value: &'v Value, key: &str) -> Option<Cow<'v, Value>> {
    match value {
        Value::Object(map) => map.get(key).map(Cow::Borrowed),
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) => items.get(index).map(Cow::Borrowed),
            Err(_) if key == "length" => Some(Cow::Owned(Value::from(items.len()))),
            Err(_) => None,
        },
        Value::String(s) if key == "length" => Some(Cow::Owned(Value::from(s.chars().count()))),
        _ => None,
    }
}
