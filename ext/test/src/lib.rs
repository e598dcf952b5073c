//! matchmerge-test: Helpers for conformance testing
//!
//! Wraps [`Merge`](matchmerge::Merge) with a [`CapturingSink`] so tests can
//! assert on the tree and the warnings together, and provides the YAML fixture
//! runner behind the `fixtures` feature.
//!
//! # Example
//!
//! ```
//! use matchmerge_test::prelude::*;
//! use serde_json::json;
//!
//! let outcome = merge_capturing(
//!     &json!({ "name": "Mary" }),
//!     &json!({ "$.body.name": { "match": "type", "ignored": "x" } }),
//! )
//! .unwrap();
//!
//! assert!(matches!(outcome.tree.get("name"), Some(Node::TypeMatch(_))));
//! assert_eq!(outcome.warnings.len(), 1);
//! ```

use matchmerge::prelude::*;
use matchmerge::{extract_at, ConcretePath};
use serde_json::Value;

#[cfg(feature = "fixtures")]
pub mod fixture;

/// A merged tree together with every warning the merge reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The merged tree.
    pub tree: Node,
    /// Warnings, in the order they were reported.
    pub warnings: Vec<String>,
}

impl Outcome {
    /// Number of warnings containing every one of `needles`.
    #[must_use]
    pub fn count_warnings(&self, needles: &[&str]) -> usize {
        self.warnings
            .iter()
            .filter(|w| needles.iter().all(|n| w.contains(n)))
            .count()
    }
}

/// Merge a rule-set document into `expected` at `$.body`, capturing warnings.
///
/// # Errors
///
/// Returns the [`MergeError`] if the rule-set document is malformed.
pub fn merge_capturing(expected: &Value, rules: &Value) -> Result<Outcome, MergeError> {
    merge_capturing_at(expected, rules, ConcretePath::body())
}

/// Like [`merge_capturing`], walking from `root`.
///
/// # Errors
///
/// Returns the [`MergeError`] if the rule-set document is malformed.
pub fn merge_capturing_at(
    expected: &Value,
    rules: &Value,
    root: ConcretePath,
) -> Result<Outcome, MergeError> {
    let rules = RuleSet::from_json_value(rules)?;
    let sink = CapturingSink::new();
    let tree = Merge::new(Some(&rules))
        .with_sink(&sink)
        .at_root(root)
        .merge(expected);
    Ok(Outcome {
        tree,
        warnings: sink.take(),
    })
}

/// Extract `tree` into an example and rules at `root`, then merge them again.
///
/// For any tree produced by a merge at `root`, the result equals `tree`.
///
/// # Errors
///
/// Returns [`MergeError::PathSyntax`] if `root` cannot be used as a rule path.
pub fn round_trip(tree: &Node, root: &ConcretePath) -> Result<Node, MergeError> {
    let (example, rules) = extract_at(tree, RulePath::parse(&root.to_string())?);
    let sink = CapturingSink::new();
    Ok(Merge::new(Some(&rules))
        .with_sink(&sink)
        .at_root(root.clone())
        .merge(&example))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{merge_capturing, merge_capturing_at, round_trip, Outcome};
    pub use matchmerge::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn captures_tree_and_warnings() {
        let outcome = merge_capturing(
            &json!({ "a": [1, 2] }),
            &json!({ "$.body.a": { "min": 1 } }),
        )
        .unwrap();
        assert_eq!(outcome.tree.get("a"), Some(&Node::collection(Node::Scalar(json!(1)), 1)));
        assert_eq!(outcome.count_warnings(&["WARN", "Only the first item"]), 1);
    }

    #[test]
    fn malformed_rules_are_errors() {
        let err = merge_capturing(&json!({}), &json!({ "body": {} })).unwrap_err();
        assert!(matches!(err, MergeError::PathSyntax { .. }));
    }

    #[test]
    fn custom_root_round_trips() {
        let root = ConcretePath::parse("$.request.body").unwrap();
        let outcome = merge_capturing_at(
            &json!({ "ids": ["x1"] }),
            &json!({
                "$.request.body.ids": { "min": 2 },
                "$.request.body.ids[*]": { "match": "regex", "regex": "^x\\d$" }
            }),
            root.clone(),
        )
        .unwrap();
        assert!(outcome.warnings.is_empty());
        assert_eq!(round_trip(&outcome.tree, &root).unwrap(), outcome.tree);
    }

    #[test]
    fn plain_tree_round_trips() {
        let tree = Node::lift(&json!({ "a": { "b": [null, true] } }));
        assert_eq!(round_trip(&tree, &ConcretePath::body()).unwrap(), tree);
    }
}
