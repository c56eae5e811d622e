//! Per-field comparison configuration.
//!
//! Every field of a record schema carries a [`FieldConfig`] that controls
//! how its values are scored and classified:
//!
//! - `comparator`: registry name of the similarity function (resolved by
//!   declared type when unset)
//! - `threshold`: classification cutoff in `[0, 1]`
//! - `weight`: contribution to the parent's weighted similarity score
//! - `clip_under_threshold`: zero the threshold-applied score for scores
//!   below the cutoff (primitive and nested-record fields only; list
//!   scores are never clipped)
//! - `include_in_aggregate`: whether a top-level field's subtree
//!   participates in the root aggregate rollup
//!
//! `FieldConfig` is serde-friendly so field metadata can travel inside
//! JSON Schema documents (see the crate-level docs for the `x-*` keys).

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Comparison configuration attached to a single schema field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldConfig {
    /// Registry name of the similarity function. `None` selects the
    /// per-type default (string → `levenshtein`, number → `numeric`,
    /// boolean → `exact`).
    #[serde(default)]
    pub comparator: Option<String>,
    /// Classification cutoff: a raw score at or above this value is a
    /// match (TP), below it a false discovery (FD).
    #[serde(default = "FieldConfig::default_threshold")]
    pub threshold: f64,
    /// Relative importance of this field in the parent's weighted score.
    #[serde(default = "FieldConfig::default_weight")]
    pub weight: f64,
    /// When true, a raw score below `threshold` contributes 0.0 to the
    /// parent score instead of the raw value.
    #[serde(default)]
    pub clip_under_threshold: bool,
    /// When false on a top-level field, the field's subtree is excluded
    /// from the root aggregate rollup (its own node counts are kept).
    #[serde(default = "FieldConfig::default_include_in_aggregate")]
    pub include_in_aggregate: bool,
}

impl FieldConfig {
    pub(crate) fn default_threshold() -> f64 {
        0.5
    }

    /// Booleans default to exact matching, so their cutoff is 1.0.
    pub(crate) fn default_boolean_threshold() -> f64 {
        1.0
    }

    pub(crate) fn default_weight() -> f64 {
        1.0
    }

    pub(crate) fn default_include_in_aggregate() -> bool {
        true
    }

    /// Configuration for a boolean field (threshold 1.0, otherwise defaults).
    pub fn for_boolean() -> Self {
        Self {
            threshold: Self::default_boolean_threshold(),
            ..Self::default()
        }
    }

    /// Validate ranges: threshold in `[0, 1]`, weight finite and positive.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(SchemaError::InvalidConfig(format!(
                "threshold must be within [0.0, 1.0], got {}",
                self.threshold
            )));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(SchemaError::InvalidConfig(format!(
                "weight must be a positive finite number, got {}",
                self.weight
            )));
        }
        Ok(())
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            comparator: None,
            threshold: Self::default_threshold(),
            weight: Self::default_weight(),
            clip_under_threshold: false,
            include_in_aggregate: Self::default_include_in_aggregate(),
        }
    }
}
