//! Config types for rule-set construction.
//!
//! These types mirror [`RuleSet`] but keep rule keys as raw strings, so they
//! deserialize from any serde format. Loading into a [`RuleSet`] parses every
//! key once and fails on the first malformed one.
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type | Loader method |
//! |-------------|-------------|---------------|
//! | [`RuleSetConfig`] | [`RuleSet`] | `RuleSet::from_config()` |
//! | [`RuleConfig`] | [`Rule`] | `Rule::from_attributes()` |
//! | JSON value / text | [`RuleSet`] | `RuleSet::from_json_value()`, `RuleSet::from_json_str()` |
//! | YAML text | [`RuleSet`] | `RuleSet::from_yaml_str()` (feature = `"yaml"`) |

use crate::{MergeError, Rule, RulePath, RuleSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Rule-set configuration: rule key → attribute mapping.
///
/// ```json
/// {
///   "$.body.alligators": { "min": 2 },
///   "$.body.alligators[*].*": { "match": "type" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RuleSetConfig {
    /// Rules by their key as written.
    pub rules: BTreeMap<String, RuleConfig>,
}

/// Attribute mapping for one rule, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RuleConfig {
    /// Attribute name → value.
    pub attributes: Map<String, Value>,
}

impl RuleSet {
    /// Build a rule set from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::PathSyntax`] for the first malformed key.
    pub fn from_config(config: RuleSetConfig) -> Result<Self, MergeError> {
        let mut set = Self::new();
        for (key, rule) in config.rules {
            let path = RulePath::parse(&key)?;
            set.insert(path, Rule::from_attributes(&rule.attributes));
        }
        Ok(set)
    }

    /// Build a rule set from a JSON value.
    ///
    /// `null` is the absent rule set and yields an empty one.
    ///
    /// # Errors
    ///
    /// - [`MergeError::InvalidConfig`] if the value is not an object of objects
    /// - [`MergeError::PathSyntax`] for the first malformed key
    pub fn from_json_value(value: &Value) -> Result<Self, MergeError> {
        if value.is_null() {
            return Ok(Self::new());
        }
        let config: RuleSetConfig =
            serde_json::from_value(value.clone()).map_err(|e| MergeError::InvalidConfig {
                source: e.to_string(),
            })?;
        Self::from_config(config)
    }

    /// Build a rule set from JSON text.
    ///
    /// # Errors
    ///
    /// Same as [`from_json_value`](Self::from_json_value), plus
    /// [`MergeError::InvalidConfig`] if the text is not JSON.
    pub fn from_json_str(json: &str) -> Result<Self, MergeError> {
        let value: Value = serde_json::from_str(json).map_err(|e| MergeError::InvalidConfig {
            source: format!("JSON parse error: {e}"),
        })?;
        Self::from_json_value(&value)
    }

    /// Build a rule set from YAML text.
    ///
    /// # Errors
    ///
    /// Same as [`from_json_value`](Self::from_json_value), plus
    /// [`MergeError::InvalidConfig`] if the text is not YAML.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, MergeError> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| MergeError::InvalidConfig {
            source: format!("YAML parse error: {e}"),
        })?;
        Self::from_json_value(&value)
    }
}
