//! Diagnostics — where merge warnings go
//!
//! The merge walk never fails on a directive it cannot use. It formats a
//! [`Warning`] and hands the text to a [`DiagnosticSink`]. Each warning is one
//! call, so a sink that writes each call atomically never interleaves lines.
//!
//! # Available Sinks
//!
//! - [`StderrSink`]: one locked write per warning to standard error (default)
//! - [`TracingSink`]: `tracing::warn!` under target `matchmerge`
//! - [`CapturingSink`]: keeps warnings in memory

use crate::{ConcretePath, RulePath, ValueKind};
use serde_json::{Map, Value};
use std::fmt::{self, Debug};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Receives formatted warnings.
///
/// # Thread Safety
///
/// Sinks are `Send + Sync` so one sink can serve merges running on several
/// threads. The merge itself holds no shared state.
pub trait DiagnosticSink: Send + Sync + Debug {
    /// Record one warning.
    fn warn(&self, message: &str);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for std::sync::Arc<T> {
    fn warn(&self, message: &str) {
        (**self).warn(message);
    }
}

/// Writes each warning as one line to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn warn(&self, message: &str) {
        let line = format!("{message}\n");
        // A closed stderr leaves nowhere to report to.
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }
}

/// Forwards each warning to `tracing::warn!` under target `matchmerge`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "matchmerge", "{message}");
    }
}

/// Keeps warnings in memory.
///
/// # Example
///
/// ```
/// use matchmerge::{CapturingSink, DiagnosticSink};
///
/// let sink = CapturingSink::new();
/// sink.warn("WARN: something");
/// assert_eq!(sink.messages(), vec!["WARN: something".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct CapturingSink {
    messages: Mutex<Vec<String>>,
}

impl CapturingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the warnings so far, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of warnings so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return the warnings so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DiagnosticSink for CapturingSink {
    fn warn(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Warnings
// ═══════════════════════════════════════════════════════════════════════════════

/// Every warning the merge walk emits.
///
/// `Display` produces the line handed to the sink. It always starts with
/// `WARN: ` and names the path in canonical bracket form.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A rule carries attributes other than `match`, `regex` and `min`.
    UnrecognizedAttributes {
        /// The rule's path.
        path: RulePath,
        /// The attributes, verbatim.
        attributes: Map<String, Value>,
    },
    /// A rule's `match` is neither `type` nor `regex`. The rule is inert.
    UnsupportedMatch {
        /// The rule's path.
        path: RulePath,
        /// The `match` value as written.
        value: String,
    },
    /// A directive that cannot apply to the kind of value it addresses.
    Inapplicable {
        /// The rule's path.
        path: RulePath,
        /// The directive (`"regex"`, `"min"`).
        directive: &'static str,
        /// What the rule actually addressed.
        kind: ValueKind,
    },
    /// `match: regex` without a `regex` pattern.
    MissingPattern {
        /// The rule's path.
        path: RulePath,
    },
    /// The pattern was rejected by the regex engine.
    InvalidPattern {
        /// The rule's path.
        path: RulePath,
        /// The pattern as written.
        pattern: String,
        /// The engine's complaint.
        source: String,
    },
    /// `match: type` on an array whose elements have their own rules.
    ParentTypeIgnored {
        /// The rule's path.
        path: RulePath,
    },
    /// A collection example has more than one element.
    ExtraCollectionItems {
        /// Where the array is.
        path: ConcretePath,
        /// How many elements were dropped.
        ignored: usize,
    },
    /// A `min` rule addresses an empty array, so there is no representative.
    EmptyCollection {
        /// Where the array is.
        path: ConcretePath,
    },
}

fn write_attributes(f: &mut fmt::Formatter<'_>, attributes: &Map<String, Value>) -> fmt::Result {
    f.write_str("{")?;
    for (i, (name, value)) in attributes.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {value}", Value::from(name.as_str()))?;
    }
    f.write_str("}")
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WARN: ")?;
        match self {
            Self::UnrecognizedAttributes { path, attributes } => {
                f.write_str("Ignoring unsupported matching rules ")?;
                write_attributes(f, attributes)?;
                write!(f, " for path {path}")
            }
            Self::UnsupportedMatch { path, value } => write!(
                f,
                "Ignoring unsupported match type {} for path {path}, the value is used as is",
                Value::from(value.as_str())
            ),
            Self::Inapplicable {
                path,
                directive,
                kind,
            } => write!(
                f,
                "Ignoring {directive} rule for path {path}, it cannot be applied to {} {}",
                article(kind.name()),
                kind.name()
            ),
            Self::MissingPattern { path } => write!(
                f,
                "Ignoring pattern rule for path {path}, no pattern was given"
            ),
            Self::InvalidPattern {
                path,
                pattern,
                source,
            } => write!(
                f,
                "Ignoring pattern {} for path {path}: {source}",
                Value::from(pattern.as_str())
            ),
            Self::ParentTypeIgnored { path } => write!(
                f,
                "Ignoring type rule for path {path}, its elements have their own rules; \
                 add a min to match the array as a collection"
            ),
            Self::ExtraCollectionItems { path, ignored } => write!(
                f,
                "Only the first item will be used to match against for the collection; \
                 the other items will be ignored. ({ignored} ignored at {path})"
            ),
            Self::EmptyCollection { path } => write!(
                f,
                "No example item for the collection at {path}, it is used as a plain array"
            ),
        }
    }
}

fn article(word: &str) -> &'static str {
    if word.starts_with(['a', 'e', 'i', 'o', 'u']) {
        "an"
    } else {
        "a"
    }
}
