//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the merge engine.
//!
//! ```yaml
//! name: type_rule_wraps_scalar
//! description: A type rule on a leaf wraps it in a type matcher
//! example: { name: Mary }
//! rules:
//!   "$.body.name": { match: type }
//! expect:
//!   object:
//!     name: { type_match: { scalar: Mary } }
//! warnings: []
//! ```

use crate::{merge_capturing_at, Outcome};
use matchmerge::{ConcretePath, Node};
use serde::Deserialize;
use serde_json::Value;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub description: String,
    /// The example body.
    pub example: Value,
    /// The rule-set document. Absent means no rules.
    #[serde(default)]
    pub rules: Value,
    /// Walk root, `$.body` when absent.
    #[serde(default)]
    pub root: Option<String>,
    /// The merged tree, in the serialized form of [`Node`].
    #[serde(default)]
    pub expect: Option<Value>,
    /// One entry per expected warning: substrings that warning must contain.
    /// `None` skips the check; `Some([])` means no warnings.
    #[serde(default)]
    pub warnings: Option<Vec<Vec<String>>>,
    /// Substrings no warning may contain.
    #[serde(default)]
    pub absent: Vec<String>,
    /// The merge must fail with an error containing this substring.
    #[serde(default)]
    pub error: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running one fixture
#[derive(Debug)]
pub struct FixtureResult {
    pub name: String,
    pub failures: Vec<String>,
    pub outcome: Option<Outcome>,
}

impl FixtureResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// The walk root this fixture merges at.
    pub fn root(&self) -> Result<ConcretePath, String> {
        match &self.root {
            Some(root) => ConcretePath::parse(root).map_err(|e| e.to_string()),
            None => Ok(ConcretePath::body()),
        }
    }

    /// Run the fixture and collect every mismatch
    pub fn run(&self) -> FixtureResult {
        let mut failures = Vec::new();
        let outcome = match self.root() {
            Ok(root) => self.merge(root, &mut failures),
            Err(e) => {
                failures.push(format!("bad root: {e}"));
                None
            }
        };
        if let Some(outcome) = &outcome {
            self.check_tree(outcome, &mut failures);
            self.check_warnings(outcome, &mut failures);
        }
        FixtureResult {
            name: self.name.clone(),
            failures,
            outcome,
        }
    }

    /// Run the fixture and panic on the first mismatch
    pub fn run_and_assert(&self) {
        let result = self.run();
        assert!(
            result.passed(),
            "Fixture '{}' failed:\n  {}\nwarnings: {:#?}",
            self.name,
            result.failures.join("\n  "),
            result.outcome.map(|o| o.warnings)
        );
    }

    fn merge(&self, root: ConcretePath, failures: &mut Vec<String>) -> Option<Outcome> {
        match (merge_capturing_at(&self.example, &self.rules, root), &self.error) {
            (Ok(outcome), None) => Some(outcome),
            (Ok(_), Some(expected)) => {
                failures.push(format!("expected an error containing {expected:?}, merge succeeded"));
                None
            }
            (Err(e), Some(expected)) => {
                if !e.to_string().contains(expected.as_str()) {
                    failures.push(format!("expected an error containing {expected:?}, got {e}"));
                }
                None
            }
            (Err(e), None) => {
                failures.push(format!("unexpected error: {e}"));
                None
            }
        }
    }

    fn check_tree(&self, outcome: &Outcome, failures: &mut Vec<String>) {
        let Some(expect) = &self.expect else { return };
        match serde_json::from_value::<Node>(expect.clone()) {
            Ok(expected) if expected == outcome.tree => {}
            Ok(expected) => failures.push(format!(
                "tree mismatch\n  expected: {}\n  actual:   {}",
                serde_json::to_string(&expected).unwrap_or_default(),
                serde_json::to_string(&outcome.tree).unwrap_or_default()
            )),
            Err(e) => failures.push(format!("bad expect: {e}")),
        }
    }

    fn check_warnings(&self, outcome: &Outcome, failures: &mut Vec<String>) {
        for needle in &self.absent {
            if let Some(w) = outcome.warnings.iter().find(|w| w.contains(needle.as_str())) {
                failures.push(format!("warning contains forbidden {needle:?}: {w}"));
            }
        }

        let Some(expected) = &self.warnings else { return };
        if expected.len() != outcome.warnings.len() {
            failures.push(format!(
                "expected {} warning(s), got {}",
                expected.len(),
                outcome.warnings.len()
            ));
            return;
        }
        // Each expected entry claims a distinct warning, in any order.
        let mut unclaimed: Vec<&String> = outcome.warnings.iter().collect();
        for needles in expected {
            let hit = unclaimed
                .iter()
                .position(|w| needles.iter().all(|n| w.contains(n.as_str())));
            match hit {
                Some(i) => {
                    unclaimed.swap_remove(i);
                }
                None => failures.push(format!("no warning contains all of {needles:?}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: collapse
description: min collapses the array
example:
  tags: [red, blue]
rules:
  "$.body.tags": { min: 1 }
expect:
  object:
    tags:
      collection:
        contents: { scalar: red }
        min: 1
warnings:
  - ["Only the first item", "1 ignored"]
---
name: bad_key
description: malformed keys fail
example: {}
rules:
  "$.body[": { match: type }
error: unbalanced
"#;

    #[test]
    fn parses_and_runs_multi_document_yaml() {
        let fixtures = Fixture::from_yaml_multi(YAML).unwrap();
        assert_eq!(fixtures.len(), 2);
        for fixture in &fixtures {
            fixture.run_and_assert();
        }
    }

    #[test]
    fn reports_tree_mismatch() {
        let mut fixture = Fixture::from_yaml_multi(YAML).unwrap().remove(0);
        fixture.expect = Some(serde_json::json!({ "scalar": 1 }));
        let result = fixture.run();
        assert!(!result.passed());
        assert!(result.failures[0].contains("tree mismatch"));
    }

    #[test]
    fn reports_missing_warning() {
        let mut fixture = Fixture::from_yaml_multi(YAML).unwrap().remove(0);
        fixture.warnings = Some(vec![vec!["never said".to_owned()]]);
        assert!(!fixture.run().passed());
    }
}
