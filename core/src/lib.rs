//! matchmerge - merges path-addressed matching rules into example bodies
//!
//! Given an example message body (a `serde_json::Value`) and a set of matching
//! rules keyed by JSONPath-like strings, [`merge`] produces a [`Node`] tree in
//! which the addressed values are replaced by matcher nodes.
//!
//! # Architecture
//!
//! - [`RulePath`] / [`ConcretePath`] — Parsed rule addresses vs. walk positions
//! - [`Rule`] / [`RuleSet`] — Directives (`match`, `regex`, `min`) parsed once at load time
//! - [`Node`] — Closed output tree: plain values plus `TypeMatch`, `PatternMatch`, `Collection`
//! - [`Merge`] — Depth-first walk combining the two
//! - [`DiagnosticSink`] — Where non-fatal warnings go (stderr by default)
//! - [`reify`] / [`extract`] — Back from a tree to an example body, and to the rules that rebuild it
//!
//! # Key Design Insights
//!
//! 1. **Parse once**: rule keys become typed segment vectors when the [`RuleSet`] is
//!    built. A malformed key fails there, so a merge never starts half-configured.
//!
//! 2. **Unknown never changes shape**: unrecognized attributes and unsupported `match`
//!    values are reported through the sink and otherwise ignored.
//!
//! 3. **`min` collapses arrays**: only a cardinality rule turns an array into a
//!    single-representative [`Node::Collection`].
//!
//! # Example
//!
//! ```
//! use matchmerge::prelude::*;
//! use serde_json::json;
//!
//! let rules = RuleSet::from_json_value(&json!({
//!     "$.body.alligators": { "min": 1 },
//!     "$.body.alligators[*].*": { "match": "type" }
//! }))
//! .unwrap();
//!
//! let sink = CapturingSink::new();
//! let tree = Merge::new(Some(&rules))
//!     .with_sink(&sink)
//!     .merge(&json!({ "alligators": [{ "name": "Mary" }] }));
//!
//! let alligators = tree.get("alligators").unwrap();
//! assert!(matches!(alligators, Node::Collection { min: 1, .. }));
//! assert!(sink.is_empty());
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod config;
mod diagnostics;
mod extract;
mod merge;
mod node;
mod path;
mod reify;
mod rule;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

pub use config::{RuleConfig, RuleSetConfig};
pub use diagnostics::{CapturingSink, DiagnosticSink, StderrSink, TracingSink, Warning};
pub use extract::{extract, extract_at};
pub use merge::{merge, merge_document, Merge};
pub use node::Node;
pub use path::{ConcretePath, RulePath, Segment, ValueKind};
pub use reify::reify;
pub use rule::{MatchKind, Rule, RuleSet};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use matchmerge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Sinks
        CapturingSink,
        ConcretePath,
        DiagnosticSink,
        // Core types
        MatchKind,
        Merge,
        // Errors
        MergeError,
        Node,
        Rule,
        RulePath,
        RuleSet,
        Segment,
        StderrSink,
        TracingSink,
        // Functions
        extract,
        merge,
        reify,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Key of the message body under `$`, where rule paths and walks start by default.
pub const BODY_KEY: &str = "body";

/// Maximum length for `regex` patterns.
///
/// Longer patterns are reported and the rule is ignored rather than compiled.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from rule-set construction.
///
/// These are configuration errors caught before any merge runs. Everything that
/// can go wrong during the walk itself is a warning, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// A rule key is not a valid path.
    PathSyntax {
        /// The rule key as written.
        path: String,
        /// Byte offset where parsing stopped.
        position: usize,
        /// What the parser expected.
        reason: String,
    },
    /// The rule-set document is not a mapping of path to attribute mapping.
    InvalidConfig {
        /// The underlying error message.
        source: String,
    },
}

impl MergeError {
    pub(crate) fn path_syntax(path: &str, position: usize, reason: impl Into<String>) -> Self {
        Self::PathSyntax {
            path: path.to_owned(),
            position,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathSyntax {
                path,
                position,
                reason,
            } => {
                write!(
                    f,
                    "invalid rule path \"{path}\" at offset {position}: {reason}"
                )
            }
            Self::InvalidConfig { source } => write!(f, "invalid matching rules: {source}"),
        }
    }
}

impl std::error::Error for MergeError {}
