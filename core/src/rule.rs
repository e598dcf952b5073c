//! Rules — parsed matching directives
//!
//! A [`Rule`] is the attribute mapping attached to one rule key. Three attributes
//! are recognized:
//!
//! | Attribute | Value | Meaning |
//! |-----------|-------|---------|
//! | `match` | `"type"` / `"regex"` | match by shape, or by pattern |
//! | `regex` | string | the pattern for `match: regex` |
//! | `min` | non-negative integer | array cardinality, collapses the array |
//!
//! Everything else, including a recognized attribute holding the wrong JSON type,
//! is kept verbatim in [`Rule::unrecognized`] so the merge walk can report it.

use crate::{ConcretePath, RulePath};
use serde::ser::SerializeMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// The value of a rule's `match` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// `match: type`: match the shape, not the exact value.
    Type,
    /// `match: regex`: match the `regex` attribute.
    Regex,
    /// Anything else. The whole rule is inert.
    Unsupported(String),
}

impl MatchKind {
    /// Classify a `match` value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "type" => Self::Type,
            "regex" => Self::Regex,
            other => Self::Unsupported(other.to_owned()),
        }
    }

    /// The attribute value as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Type => "type",
            Self::Regex => "regex",
            Self::Unsupported(v) => v,
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directives attached to one rule path.
///
/// # Example
///
/// ```
/// use matchmerge::{MatchKind, Rule};
/// use serde_json::json;
///
/// let attrs = json!({ "match": "type", "min": 2, "max": 5 });
/// let rule = Rule::from_attributes(attrs.as_object().unwrap());
///
/// assert_eq!(rule.match_kind(), Some(&MatchKind::Type));
/// assert_eq!(rule.min(), Some(2));
/// assert!(rule.unrecognized().contains_key("max"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    match_kind: Option<MatchKind>,
    regex: Option<String>,
    min: Option<usize>,
    unrecognized: Map<String, Value>,
}

impl Rule {
    /// Build a rule from its attribute mapping. Never fails.
    #[must_use]
    pub fn from_attributes(attributes: &Map<String, Value>) -> Self {
        let mut rule = Self::default();
        for (name, value) in attributes {
            let recognized = match (name.as_str(), value) {
                ("match", Value::String(kind)) => {
                    rule.match_kind = Some(MatchKind::parse(kind));
                    true
                }
                ("regex", Value::String(pattern)) => {
                    rule.regex = Some(pattern.clone());
                    true
                }
                ("min", Value::Number(n)) => match n.as_u64().and_then(|n| usize::try_from(n).ok())
                {
                    Some(min) => {
                        rule.min = Some(min);
                        true
                    }
                    None => false,
                },
                _ => false,
            };
            if !recognized {
                rule.unrecognized.insert(name.clone(), value.clone());
            }
        }
        rule
    }

    /// `{"match": "type"}`
    #[must_use]
    pub fn type_match() -> Self {
        Self {
            match_kind: Some(MatchKind::Type),
            ..Self::default()
        }
    }

    /// `{"match": "regex", "regex": pattern}`
    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            match_kind: Some(MatchKind::Regex),
            regex: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// `{"min": min}`
    #[must_use]
    pub fn min_items(min: usize) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    /// Add `match: type` to this rule.
    #[must_use]
    pub fn with_type_match(mut self) -> Self {
        self.match_kind = Some(MatchKind::Type);
        self
    }

    /// Add `min` to this rule.
    #[must_use]
    pub fn with_min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    /// The `match` attribute, if present and a string.
    #[must_use]
    pub fn match_kind(&self) -> Option<&MatchKind> {
        self.match_kind.as_ref()
    }

    /// The `regex` attribute, if present and a string.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.regex.as_deref()
    }

    /// The `min` attribute, if present and a non-negative integer.
    #[must_use]
    pub fn min(&self) -> Option<usize> {
        self.min
    }

    /// Attributes that are not recognized directives.
    #[must_use]
    pub fn unrecognized(&self) -> &Map<String, Value> {
        &self.unrecognized
    }

    /// `match: type`.
    #[must_use]
    pub fn is_type_match(&self) -> bool {
        self.match_kind == Some(MatchKind::Type)
    }

    /// `match: regex`, or a bare `regex` with no `match` attribute.
    #[must_use]
    pub fn is_regex_match(&self) -> bool {
        match &self.match_kind {
            Some(MatchKind::Regex) => true,
            None => self.regex.is_some(),
            _ => false,
        }
    }

    /// The unsupported `match` value, if any. Such a rule is inert.
    #[must_use]
    pub fn unsupported_match(&self) -> Option<&str> {
        match &self.match_kind {
            Some(MatchKind::Unsupported(v)) => Some(v),
            _ => None,
        }
    }

    /// `true` if the rule carries no directive the walk could act on.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.unsupported_match().is_some()
            || (self.match_kind.is_none() && self.regex.is_none() && self.min.is_none())
    }

    /// Fold another rule's attributes into this one. The other rule wins on conflict.
    pub fn absorb(&mut self, other: Rule) {
        if other.match_kind.is_some() {
            self.match_kind = other.match_kind;
        }
        if other.regex.is_some() {
            self.regex = other.regex;
        }
        if other.min.is_some() {
            self.min = other.min;
        }
        self.unrecognized.extend(other.unrecognized);
    }

    /// The attribute mapping this rule was built from (recognized attributes first).
    #[must_use]
    pub fn to_attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        if let Some(kind) = &self.match_kind {
            attributes.insert("match".into(), Value::from(kind.as_str()));
        }
        if let Some(pattern) = &self.regex {
            attributes.insert("regex".into(), Value::from(pattern.as_str()));
        }
        if let Some(min) = self.min {
            attributes.insert("min".into(), Value::from(min));
        }
        for (name, value) in &self.unrecognized {
            attributes.insert(name.clone(), value.clone());
        }
        attributes
    }
}

/// A rule found for one walk position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resolved<'r> {
    /// Position in the rule set, stable for the lifetime of the set.
    pub id: usize,
    pub path: &'r RulePath,
    pub rule: &'r Rule,
}

/// Rules keyed by parsed path.
///
/// Paths are parsed once when the set is built (see
/// [`RuleSet::from_json_value`](crate::RuleSet::from_json_value) and friends).
/// Two keys that parse to the same path collapse into one entry, and the later
/// one replaces the earlier.
///
/// # Lookup
///
/// When several rule paths match a walk position, the one with the fewest
/// wildcards wins. Ties go to the rule inserted first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    entries: Vec<(RulePath, Rule)>,
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule, replacing any rule already at the same path.
    ///
    /// Returns the replaced rule.
    pub fn insert(&mut self, path: RulePath, rule: Rule) -> Option<Rule> {
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some((_, existing)) => Some(std::mem::replace(existing, rule)),
            None => {
                self.entries.push((path, rule));
                None
            }
        }
    }

    /// The rule at exactly this path, creating an empty one if needed.
    pub fn rule_mut(&mut self, path: RulePath) -> &mut Rule {
        let index = match self.entries.iter().position(|(p, _)| *p == path) {
            Some(index) => index,
            None => {
                self.entries.push((path, Rule::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// The rule keyed at exactly this path (no wildcard resolution).
    #[must_use]
    pub fn get(&self, path: &RulePath) -> Option<&Rule> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, r)| r)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&RulePath, &Rule)> {
        self.entries.iter().map(|(p, r)| (p, r))
    }

    /// The most specific rule addressing `path`.
    pub(crate) fn lookup(&self, path: &ConcretePath) -> Option<Resolved<'_>> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, (p, _))| p.matches(path))
            .min_by_key(|(id, (p, _))| (p.wildcards(), *id))
            .map(|(id, (path, rule))| Resolved { id, path, rule })
    }
}

impl FromIterator<(RulePath, Rule)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (RulePath, Rule)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (path, rule) in iter {
            set.insert(path, rule);
        }
        set
    }
}

impl Serialize for RuleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, rule) in &self.entries {
            map.serialize_entry(&path.to_string(), &rule.to_attributes())?;
        }
        map.end()
    }
}
