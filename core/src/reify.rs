//! Reify — turn a merged tree back into a concrete body
//!
//! Matchers are replaced by the example they carry:
//!
//! | Node | Value |
//! |------|-------|
//! | `TypeMatch(n)` | `reify(n)` |
//! | `PatternMatch { generate, .. }` | `generate` as a string |
//! | `Collection { contents, min }` | `max(min, 1)` copies of `reify(contents)` |

use crate::Node;
use serde_json::Value;

/// Produce a concrete value satisfying `node`.
///
/// # Example
///
/// ```
/// use matchmerge::{reify, Node};
/// use serde_json::json;
///
/// let node = Node::collection(Node::type_match(Node::Scalar(json!("red"))), 2);
/// assert_eq!(reify(&node), json!(["red", "red"]));
/// ```
#[must_use]
pub fn reify(node: &Node) -> Value {
    match node {
        Node::Scalar(value) => value.clone(),
        Node::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), reify(child)))
                .collect(),
        ),
        Node::Sequence(items) => Value::Array(items.iter().map(reify).collect()),
        Node::TypeMatch(inner) => reify(inner),
        Node::PatternMatch { generate, .. } => Value::String(generate.clone()),
        Node::Collection { contents, min } => {
            let element = reify(contents);
            Value::Array(vec![element; (*min).max(1)])
        }
    }
}
