//! `Node` — the merged tree
//!
//! A closed enum: three plain variants mirroring JSON containers and leaves,
//! and three matcher variants. Consumers (reify, extract, verifiers) match on
//! it exhaustively.
//!
//! # Serialized form
//!
//! Externally tagged with `snake_case` variant names:
//!
//! ```yaml
//! object:
//!   name:
//!     type_match:
//!       scalar: Mary
//!   tags:
//!     collection:
//!       contents: { scalar: red }
//!       min: 1
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A node of the merged tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    /// Unmatched leaf (`null`, bool, number or string), value unchanged.
    Scalar(Value),

    /// Unmatched object, each value merged.
    Object(BTreeMap<String, Node>),

    /// Unmatched array, each element merged.
    Sequence(Vec<Node>),

    /// Actual value must have the example's shape and types, not its exact value.
    TypeMatch(Box<Node>),

    /// Actual value must match `pattern`. `generate` is the example value.
    PatternMatch {
        /// Example value used when producing concrete bodies.
        generate: String,
        /// Regular expression the actual value must satisfy.
        pattern: String,
    },

    /// Actual array must have at least `min` elements, each matching `contents`.
    Collection {
        /// The single representative element, itself fully merged.
        contents: Box<Node>,
        /// Minimum number of elements.
        min: usize,
    },
}

impl Node {
    /// Wrap a plain value without applying any rule.
    ///
    /// This is what [`merge`](crate::merge) returns when there are no rules.
    #[must_use]
    pub fn lift(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::lift(v)))
                    .collect(),
            ),
            Value::Array(items) => Self::Sequence(items.iter().map(Self::lift).collect()),
            scalar => Self::Scalar(scalar.clone()),
        }
    }

    /// `TypeMatch(example)`
    #[must_use]
    pub fn type_match(example: Node) -> Self {
        Self::TypeMatch(Box::new(example))
    }

    /// `PatternMatch { generate, pattern }`
    #[must_use]
    pub fn pattern_match(generate: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::PatternMatch {
            generate: generate.into(),
            pattern: pattern.into(),
        }
    }

    /// `Collection { contents, min }`
    #[must_use]
    pub fn collection(contents: Node, min: usize) -> Self {
        Self::Collection {
            contents: Box::new(contents),
            min,
        }
    }

    /// `true` for `TypeMatch`, `PatternMatch` and `Collection`.
    #[must_use]
    pub fn is_matcher(&self) -> bool {
        matches!(
            self,
            Self::TypeMatch(_) | Self::PatternMatch { .. } | Self::Collection { .. }
        )
    }

    /// Child of an `Object`, looking through a wrapping `TypeMatch`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Self::Object(map) => map.get(key),
            Self::TypeMatch(inner) => inner.get(key),
            _ => None,
        }
    }

    /// Element of a `Sequence`, looking through a wrapping `TypeMatch`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Node> {
        match self {
            Self::Sequence(items) => items.get(index),
            Self::TypeMatch(inner) => inner.at(index),
            _ => None,
        }
    }

    /// The wrapped node of a `TypeMatch`, or the representative of a `Collection`.
    #[must_use]
    pub fn contents(&self) -> Option<&Node> {
        match self {
            Self::TypeMatch(inner) => Some(inner),
            Self::Collection { contents, .. } => Some(contents),
            _ => None,
        }
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        Self::lift(value)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Self::lift(&value)
    }
}
