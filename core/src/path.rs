//! Paths — rule addresses and walk positions
//!
//! Rule keys are written in a small JSONPath dialect:
//!
//! ```text
//! path     := "$" segment*
//! segment  := "." identifier | "." "*" | "[" (integer | "*" | quoted) "]"
//! quoted   := "'" (escape | anychar)* "'" | "\"" (escape | anychar)* "\""
//! escape   := "\\" (quote | "\\")
//! ```
//!
//! Keys containing `.`, `@`, `$`, `[`, `]`, `*`, quotes or whitespace must use the
//! bracket-quoted form (`$.body['first.name']`). Inside quotes, a backslash escapes
//! the enclosing quote or another backslash. Any other backslash is literal.
//!
//! # Two path types
//!
//! - [`RulePath`] = parsed from a rule key, may contain [`Segment::Wildcard`]
//! - [`ConcretePath`] = where the merge walk currently is
//!
//! A rule path matches a concrete path of the same length when every segment
//! matches. A rule wildcard matches any key or index. While walking the
//! representative element of a collapsed array the concrete path holds a
//! wildcard too, and only a rule wildcard matches that position.

use crate::{MergeError, BODY_KEY};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
    /// Any key or any index (`*`).
    Wildcard,
}

impl Segment {
    /// Does this rule segment accept the given walk segment?
    fn accepts(&self, concrete: &Segment) -> bool {
        match (self, concrete) {
            (Self::Wildcard, _) => true,
            (Self::Key(a), Self::Key(b)) => a == b,
            (Self::Index(a), Self::Index(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) if k.contains('\'') && !k.contains(['"', '\\']) => {
                write!(f, "[\"{k}\"]")
            }
            Self::Key(k) => {
                f.write_str("['")?;
                for c in k.chars() {
                    if matches!(c, '\'' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("']")
            }
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Wildcard => f.write_str("[*]"),
        }
    }
}

/// Shape of a JSON value, as far as the merge walk cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `null`, booleans, numbers and strings.
    Scalar,
    /// JSON object.
    Object,
    /// JSON array.
    Sequence,
}

impl ValueKind {
    /// Classify a value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Sequence,
            _ => Self::Scalar,
        }
    }

    /// Lowercase name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object => "object",
            Self::Sequence => "array",
        }
    }
}

fn write_path(f: &mut fmt::Formatter<'_>, segments: &[Segment]) -> fmt::Result {
    f.write_str("$")?;
    for segment in segments {
        write!(f, "{segment}")?;
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// RulePath
// ═══════════════════════════════════════════════════════════════════════════════

/// A parsed rule key.
///
/// `Display` renders the canonical bracket form, e.g. `$['body']['name'][*]`,
/// which parses back to the same path.
///
/// # Example
///
/// ```
/// use matchmerge::{RulePath, Segment};
///
/// let path = RulePath::parse("$.body['first.name']").unwrap();
/// assert_eq!(path.segments()[1], Segment::Key("first.name".into()));
/// assert_eq!(path.to_string(), "$['body']['first.name']");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RulePath {
    segments: Vec<Segment>,
}

impl RulePath {
    /// Parse a rule key.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::PathSyntax`] for a missing `$` root, unbalanced
    /// brackets, unterminated quotes, empty keys, reserved characters in a
    /// dotted key, or a non-numeric index.
    pub fn parse(input: &str) -> Result<Self, MergeError> {
        Ok(Self {
            segments: parse_segments(input)?,
        })
    }

    /// The bare root, `$`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// The message body, `$.body`.
    #[must_use]
    pub fn body() -> Self {
        Self {
            segments: vec![Segment::Key(BODY_KEY.to_owned())],
        }
    }

    /// The segments after `$`.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of wildcard segments. Fewer wildcards means a more specific rule.
    #[must_use]
    pub fn wildcards(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Wildcard))
            .count()
    }

    /// Does this rule address the given walk position?
    #[must_use]
    pub fn matches(&self, path: &ConcretePath) -> bool {
        self.segments.len() == path.segments.len()
            && self
                .segments
                .iter()
                .zip(&path.segments)
                .all(|(rule, concrete)| rule.accepts(concrete))
    }

    /// This path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }
}

impl FromStr for RulePath {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_path(f, &self.segments)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ConcretePath
// ═══════════════════════════════════════════════════════════════════════════════

/// A position in the example being walked.
///
/// Built from keys and indices only. The merge walk appends a wildcard when it
/// descends into the representative element of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcretePath {
    segments: Vec<Segment>,
}

impl ConcretePath {
    /// Parse a walk root such as `$.body` or `$.request.body`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::PathSyntax`] if the path is malformed or contains a wildcard.
    pub fn parse(input: &str) -> Result<Self, MergeError> {
        let segments = parse_segments(input)?;
        if segments.iter().any(|s| matches!(s, Segment::Wildcard)) {
            return Err(MergeError::path_syntax(
                input,
                0,
                "a walk root cannot contain a wildcard",
            ));
        }
        Ok(Self { segments })
    }

    /// The bare root, `$`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// The message body, `$.body`.
    #[must_use]
    pub fn body() -> Self {
        Self {
            segments: vec![Segment::Key(BODY_KEY.to_owned())],
        }
    }

    /// The segments after `$`.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Address of every element of the array at this path.
    ///
    /// - [`ValueKind::Object`] → `path[*].*` (any key of any element)
    /// - otherwise → `path[*]`
    #[must_use]
    pub fn child_wildcard(&self, kind: ValueKind) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Wildcard);
        if kind == ValueKind::Object {
            segments.push(Segment::Wildcard);
        }
        Self { segments }
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.segments.pop();
    }
}

impl FromStr for ConcretePath {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConcretePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_path(f, &self.segments)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parser
// ═══════════════════════════════════════════════════════════════════════════════

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, reason: impl Into<String>) -> MergeError {
        MergeError::path_syntax(self.input, self.pos, reason)
    }

    fn dotted(&mut self) -> Result<Segment, MergeError> {
        if self.eat('*') {
            return Ok(Segment::Wildcard);
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' {
                break;
            }
            if is_reserved(c) {
                return Err(self.error(format!(
                    "`{c}` is not allowed in a dotted key, use the ['...'] form"
                )));
            }
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected a key after `.`"));
        }
        Ok(Segment::Key(self.input[start..self.pos].to_owned()))
    }

    fn bracketed(&mut self) -> Result<Segment, MergeError> {
        let segment = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                let open = self.pos;
                self.bump();
                let mut key = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some('\\') if self.peek().is_some_and(|c| c == quote || c == '\\') => {
                            key.extend(self.bump());
                        }
                        Some(c) => key.push(c),
                        None => {
                            return Err(MergeError::path_syntax(
                                self.input,
                                open,
                                "unterminated quoted key",
                            ))
                        }
                    }
                }
                Segment::Key(key)
            }
            Some('*') => {
                self.bump();
                Segment::Wildcard
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
                let digits = &self.input[start..self.pos];
                let index = digits.parse::<usize>().map_err(|_| {
                    MergeError::path_syntax(self.input, start, "index is out of range")
                })?;
                Segment::Index(index)
            }
            Some(_) => return Err(self.error("expected an index, `*` or a quoted key")),
            None => return Err(self.error("unbalanced `[`")),
        };
        if !self.eat(']') {
            let reason = if self.peek().is_none() {
                "unbalanced `[`"
            } else {
                "expected `]`"
            };
            return Err(self.error(reason));
        }
        Ok(segment)
    }
}

fn is_reserved(c: char) -> bool {
    matches!(c, '@' | '$' | ']' | '*' | '\'' | '"') || c.is_whitespace()
}

fn parse_segments(input: &str) -> Result<Vec<Segment>, MergeError> {
    let mut cursor = Cursor { input, pos: 0 };
    match cursor.bump() {
        Some('$') => {}
        Some(_) => return Err(MergeError::path_syntax(input, 0, "path must start with `$`")),
        None => return Err(MergeError::path_syntax(input, 0, "path is empty")),
    }

    let mut segments = Vec::new();
    while let Some(c) = cursor.peek() {
        let at = cursor.pos;
        cursor.bump();
        let segment = match c {
            '.' => cursor.dotted()?,
            '[' => cursor.bracketed()?,
            ']' => return Err(MergeError::path_syntax(input, at, "unbalanced `]`")),
            other => {
                return Err(MergeError::path_syntax(
                    input,
                    at,
                    format!("unexpected `{other}`, expected `.` or `[`"),
                ))
            }
        };
        segments.push(segment);
    }
    Ok(segments)
}
