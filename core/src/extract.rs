//! Extract — split a merged tree into an example body and its rules
//!
//! The inverse of [`merge`](crate::merge): for a tree produced by merge,
//!
//! ```text
//! let (example, rules) = extract(&tree);
//! merge(&example, Some(&rules)) == tree
//! ```
//!
//! Every rule is keyed at an exact position. Collection contents are keyed
//! under `[*]`, which is the only address that reaches the representative
//! element when the example is merged again.

use crate::{reify, Node, Rule, RulePath, RuleSet, Segment};
use serde_json::Value;

/// Split `node` into an example body and the rules under `$.body`.
///
/// # Example
///
/// ```
/// use matchmerge::{extract, Node, RulePath};
/// use serde_json::json;
///
/// let tree = Node::collection(Node::type_match(Node::Scalar(json!("red"))), 1);
/// let (example, rules) = extract(&tree);
///
/// assert_eq!(example, json!(["red"]));
/// let element = RulePath::parse("$.body[*]").unwrap();
/// assert!(rules.get(&element).is_some_and(|r| r.is_type_match()));
/// ```
#[must_use]
pub fn extract(node: &Node) -> (Value, RuleSet) {
    extract_at(node, RulePath::body())
}

/// Split `node` into an example and the rules under `root`.
#[must_use]
pub fn extract_at(node: &Node, root: RulePath) -> (Value, RuleSet) {
    let mut rules = RuleSet::new();
    let mut path = root;
    collect(node, &mut path, &mut rules);
    (reify(node), rules)
}

fn collect(node: &Node, path: &mut RulePath, rules: &mut RuleSet) {
    match node {
        Node::Scalar(_) => {}
        Node::Object(map) => {
            for (key, child) in map {
                path.push(Segment::Key(key.clone()));
                collect(child, path, rules);
                path.pop();
            }
        }
        Node::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                path.push(Segment::Index(index));
                collect(item, path, rules);
                path.pop();
            }
        }
        Node::TypeMatch(inner) => {
            rules.rule_mut(path.clone()).absorb(Rule::type_match());
            collect(inner, path, rules);
        }
        Node::PatternMatch { pattern, .. } => {
            rules.rule_mut(path.clone()).absorb(Rule::regex(pattern.as_str()));
        }
        Node::Collection { contents, min } => {
            rules.rule_mut(path.clone()).absorb(Rule::min_items(*min));
            path.push(Segment::Wildcard);
            collect(contents, path, rules);
            path.pop();
        }
    }
}
