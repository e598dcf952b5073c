//! Merge — apply matching rules to an example body
//!
//! The walk is depth-first. At every position it resolves two rules before
//! deciding anything:
//!
//! - the **own rule**, the most specific rule addressing the position itself
//! - for arrays, the **element rule**, addressing `path[*]` or `path[*].*`
//!
//! # Decision table
//!
//! | Value | Own rule | Element rule | Result |
//! |-------|----------|--------------|--------|
//! | scalar | `match: regex` (or bare `regex`) | any | `PatternMatch` |
//! | scalar | `match: type` | any | `TypeMatch(Scalar)` |
//! | object | `match: type` | any | `TypeMatch(Object)` of merged children |
//! | array | `min` | any | `Collection` of the first element, merged at `path[*]` |
//! | array | `match: type`, no `min` | none | `TypeMatch(Sequence)` of the raw elements |
//! | array | anything else | any | `Sequence`, each element merged at `path[i]` |
//!
//! `min` always wins: a parent `match: type`, an element `match: type`, or both,
//! still produce a `Collection` when `min` is present.
//!
//! # Diagnostics
//!
//! Each problem with a rule is reported once per merge, however many positions
//! the rule addresses. Reports never change the result beyond making the
//! offending directive inert.

use crate::diagnostics::Warning;
use crate::rule::Resolved;
use crate::{
    ConcretePath, DiagnosticSink, MergeError, Node, RuleSet, Segment, StderrSink, ValueKind,
    MAX_REGEX_PATTERN_LENGTH,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

static STDERR: StderrSink = StderrSink;

/// Merges a [`RuleSet`] into example bodies.
///
/// # Example
///
/// ```
/// use matchmerge::{CapturingSink, Merge, Node, RuleSet};
/// use serde_json::json;
///
/// let rules = RuleSet::from_json_value(&json!({
///     "$.body.name": { "match": "type" }
/// }))
/// .unwrap();
///
/// let sink = CapturingSink::new();
/// let tree = Merge::new(Some(&rules))
///     .with_sink(&sink)
///     .merge(&json!({ "name": "Mary" }));
///
/// assert_eq!(
///     tree.get("name"),
///     Some(&Node::type_match(Node::Scalar(json!("Mary"))))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Merge<'a> {
    rules: Option<&'a RuleSet>,
    sink: &'a dyn DiagnosticSink,
    root: ConcretePath,
}

impl<'a> Merge<'a> {
    /// Merge with the given rules (or none), reporting to standard error,
    /// walking from `$.body`.
    #[must_use]
    pub fn new(rules: Option<&'a RuleSet>) -> Self {
        Self {
            rules,
            sink: &STDERR,
            root: ConcretePath::body(),
        }
    }

    /// Report warnings to `sink` instead of standard error.
    #[must_use]
    pub fn with_sink(mut self, sink: &'a dyn DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    /// Walk from `root` instead of `$.body`.
    #[must_use]
    pub fn at_root(mut self, root: ConcretePath) -> Self {
        self.root = root;
        self
    }

    /// Merge the rules into `expected`.
    ///
    /// Without rules (absent or empty) the result is [`Node::lift`] of the input
    /// and nothing is reported.
    #[must_use]
    pub fn merge(&self, expected: &Value) -> Node {
        let Some(rules) = self.rules.filter(|r| !r.is_empty()) else {
            return Node::lift(expected);
        };
        let mut walk = Walk {
            rules,
            sink: self.sink,
            reported: HashSet::new(),
            patterns: HashMap::new(),
        };
        let mut path = self.root.clone();
        walk.node(expected, &mut path)
    }
}

/// Merge `rules` into `expected`, reporting to standard error.
#[must_use]
pub fn merge(expected: &Value, rules: Option<&RuleSet>) -> Node {
    Merge::new(rules).merge(expected)
}

/// Parse a rule-set document, then merge it into `expected`.
///
/// # Errors
///
/// Returns the [`MergeError`] from [`RuleSet::from_json_value`]; no merge
/// happens with a malformed rule set.
pub fn merge_document(expected: &Value, rules: &Value) -> Result<Node, MergeError> {
    let rules = RuleSet::from_json_value(rules)?;
    Ok(merge(expected, Some(&rules)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Walk
// ═══════════════════════════════════════════════════════════════════════════════

/// Things reported at most once per rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Report {
    Unrecognized,
    UnsupportedMatch,
    RegexOn(ValueKind),
    MinOn(ValueKind),
    MissingPattern,
    InvalidPattern,
    ParentTypeIgnored,
    EmptyCollection,
}

struct Walk<'r> {
    rules: &'r RuleSet,
    sink: &'r dyn DiagnosticSink,
    reported: HashSet<(usize, Report)>,
    /// Pattern validity by rule id, so each pattern compiles once.
    patterns: HashMap<usize, bool>,
}

impl<'r> Walk<'r> {
    fn node(&mut self, value: &Value, path: &mut ConcretePath) -> Node {
        let own = self.own_rule(path);
        match value {
            Value::Object(map) => self.object(map, path, own),
            Value::Array(items) => self.sequence(items, path, own),
            scalar => self.scalar(scalar, own),
        }
    }

    /// The rule addressing `path`, after reporting its problems.
    /// A rule with an unsupported `match` is inert and comes back as `None`.
    fn own_rule(&mut self, path: &ConcretePath) -> Option<Resolved<'r>> {
        let found = self.rules.lookup(path)?;
        self.vet(found).then_some(found)
    }

    /// Report the unrecognized attributes and unsupported `match` of a rule.
    /// Returns `false` if the unsupported `match` leaves the rule inert.
    fn vet(&mut self, found: Resolved<'r>) -> bool {
        let unrecognized = found.rule.unrecognized();
        if !unrecognized.is_empty() {
            self.report(found, Report::Unrecognized, || {
                Warning::UnrecognizedAttributes {
                    path: found.path.clone(),
                    attributes: unrecognized.clone(),
                }
            });
        }
        if let Some(value) = found.rule.unsupported_match() {
            self.report(found, Report::UnsupportedMatch, || Warning::UnsupportedMatch {
                path: found.path.clone(),
                value: value.to_owned(),
            });
            return false;
        }
        true
    }

    /// Whether the elements of the array at `path` have a rule that directs
    /// something. Every element rule consulted is reported here, since a
    /// whole-array match never walks the elements.
    fn has_element_rule(&mut self, path: &ConcretePath) -> bool {
        let mut directed = false;
        for kind in [ValueKind::Sequence, ValueKind::Object] {
            if let Some(found) = self.rules.lookup(&path.child_wildcard(kind)) {
                self.vet(found);
                directed |= !found.rule.is_inert();
            }
        }
        directed
    }

    fn report(&mut self, found: Resolved<'r>, what: Report, warning: impl FnOnce() -> Warning) {
        if self.reported.insert((found.id, what)) {
            self.sink.warn(&warning().to_string());
        }
    }

    /// Report `min` and `regex` on values they cannot shape.
    fn check_container(&mut self, own: Option<Resolved<'r>>, kind: ValueKind) {
        let Some(found) = own else { return };
        if kind != ValueKind::Sequence && found.rule.min().is_some() {
            self.report(found, Report::MinOn(kind), || Warning::Inapplicable {
                path: found.path.clone(),
                directive: "min",
                kind,
            });
        }
        if kind != ValueKind::Scalar && found.rule.is_regex_match() {
            self.report(found, Report::RegexOn(kind), || Warning::Inapplicable {
                path: found.path.clone(),
                directive: "regex",
                kind,
            });
        }
    }

    /// The usable pattern of a regex rule, reporting why it is unusable otherwise.
    fn pattern(&mut self, found: Resolved<'r>) -> Option<&'r str> {
        let Some(pattern) = found.rule.pattern() else {
            self.report(found, Report::MissingPattern, || Warning::MissingPattern {
                path: found.path.clone(),
            });
            return None;
        };
        let cached = self.patterns.get(&found.id).copied();
        let valid = match cached {
            Some(valid) => valid,
            None => {
                let checked = check_pattern(pattern);
                let valid = checked.is_ok();
                if let Err(source) = checked {
                    self.report(found, Report::InvalidPattern, || Warning::InvalidPattern {
                        path: found.path.clone(),
                        pattern: pattern.to_owned(),
                        source,
                    });
                }
                self.patterns.insert(found.id, valid);
                valid
            }
        };
        valid.then_some(pattern)
    }

    fn scalar(&mut self, value: &Value, own: Option<Resolved<'r>>) -> Node {
        self.check_container(own, ValueKind::Scalar);
        let Some(found) = own else {
            return Node::Scalar(value.clone());
        };
        if found.rule.is_regex_match() {
            if let Some(pattern) = self.pattern(found) {
                return Node::pattern_match(stringify(value), pattern);
            }
            return Node::Scalar(value.clone());
        }
        if found.rule.is_type_match() {
            return Node::type_match(Node::Scalar(value.clone()));
        }
        Node::Scalar(value.clone())
    }

    fn object(
        &mut self,
        map: &Map<String, Value>,
        path: &mut ConcretePath,
        own: Option<Resolved<'r>>,
    ) -> Node {
        self.check_container(own, ValueKind::Object);
        let mut merged = BTreeMap::new();
        for (key, child) in map {
            path.push(Segment::Key(key.clone()));
            let node = self.node(child, path);
            path.pop();
            merged.insert(key.clone(), node);
        }
        let merged = Node::Object(merged);
        match own {
            Some(found) if found.rule.is_type_match() => Node::type_match(merged),
            _ => merged,
        }
    }

    fn sequence(
        &mut self,
        items: &[Value],
        path: &mut ConcretePath,
        own: Option<Resolved<'r>>,
    ) -> Node {
        self.check_container(own, ValueKind::Sequence);

        if let Some(found) = own {
            if let Some(min) = found.rule.min() {
                if let Some((first, rest)) = items.split_first() {
                    if !rest.is_empty() {
                        self.sink.warn(
                            &Warning::ExtraCollectionItems {
                                path: path.clone(),
                                ignored: rest.len(),
                            }
                            .to_string(),
                        );
                    }
                    tracing::trace!(path = %path, min, "collapsing array into collection");
                    path.push(Segment::Wildcard);
                    let contents = self.node(first, path);
                    path.pop();
                    return Node::collection(contents, min);
                }
                self.report(found, Report::EmptyCollection, || Warning::EmptyCollection {
                    path: path.clone(),
                });
            }

            if found.rule.is_type_match() {
                if !self.has_element_rule(path) {
                    tracing::trace!(path = %path, "matching whole array by type");
                    let raw = items.iter().map(Node::lift).collect();
                    return Node::type_match(Node::Sequence(raw));
                }
                if found.rule.min().is_none() {
                    self.report(found, Report::ParentTypeIgnored, || {
                        Warning::ParentTypeIgnored {
                            path: found.path.clone(),
                        }
                    });
                }
            }
        }

        let mut merged = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            path.push(Segment::Index(index));
            merged.push(self.node(item, path));
            path.pop();
        }
        Node::Sequence(merged)
    }
}

/// The example string for a pattern match.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_pattern(pattern: &str) -> Result<(), String> {
    if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
        return Err(format!(
            "pattern length is {}, but maximum allowed is {MAX_REGEX_PATTERN_LENGTH}",
            pattern.len()
        ));
    }
    regex::Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| e.to_string())
}
