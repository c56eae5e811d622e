//! Non-match records.
//!
//! When requested, the engine attaches a flat list of non-matches to the
//! report: every FD, FN and FA in the tree, with a dotted (and
//! list-indexed) field path, the values involved (stringified and
//! truncated for display), the similarity where one was computed, and a
//! human-readable reason. Entries appear in depth-first declared-field
//! order; inside a list node, FDs precede FNs precede FAs.

use std::collections::BTreeMap;

use schema::Value;
use serde::Serialize;

/// Kind of a non-match record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NonMatchKind {
    /// Both sides present, score below threshold.
    Fd,
    /// Ground truth present, prediction missing.
    Fn,
    /// Prediction present, ground truth missing.
    Fa,
}

/// One documented non-match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NonMatch {
    /// Dotted path from the root, with `[index]` segments for list items.
    pub field_path: String,
    pub kind: NonMatchKind,
    /// Ground-truth value, stringified for display (possibly truncated).
    pub gt_value: Option<String>,
    /// Prediction value, stringified for display (possibly truncated).
    pub pred_value: Option<String>,
    /// Similarity of the pair, when one was computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// Free-form details; always carries a `reason` entry.
    pub details: BTreeMap<String, String>,
}

impl NonMatch {
    pub(crate) fn new(
        kind: NonMatchKind,
        gt: Option<&Value>,
        pred: Option<&Value>,
        similarity: Option<f64>,
        reason: String,
    ) -> Self {
        let mut details = BTreeMap::new();
        details.insert("reason".to_string(), reason);
        Self {
            field_path: String::new(),
            kind,
            gt_value: gt.map(Value::display_truncated),
            pred_value: pred.map(Value::display_truncated),
            similarity,
            details,
        }
    }

    /// Below-threshold pair at a leaf or list element.
    pub(crate) fn below_threshold(
        gt: &Value,
        pred: &Value,
        similarity: f64,
        threshold: f64,
    ) -> Self {
        Self::new(
            NonMatchKind::Fd,
            Some(gt),
            Some(pred),
            Some(similarity),
            format!("below threshold ({similarity:.3} < {threshold})"),
        )
    }

    /// Assignment pair gated out of recursion by the record match
    /// threshold.
    pub(crate) fn below_match_threshold(
        gt: &Value,
        pred: &Value,
        similarity: f64,
        match_threshold: f64,
    ) -> Self {
        Self::new(
            NonMatchKind::Fd,
            Some(gt),
            Some(pred),
            Some(similarity),
            format!("below match threshold ({similarity:.3} < {match_threshold})"),
        )
    }

    /// Ground truth present, prediction null or unmatched.
    pub(crate) fn missing_in_prediction(gt: &Value) -> Self {
        Self::new(
            NonMatchKind::Fn,
            Some(gt),
            None,
            None,
            "missing in prediction".to_string(),
        )
    }

    /// Prediction present, ground truth null or unmatched.
    pub(crate) fn extra_in_prediction(pred: &Value) -> Self {
        Self::new(
            NonMatchKind::Fa,
            None,
            Some(pred),
            None,
            "extra in prediction".to_string(),
        )
    }

    /// Runtime value shape disagrees with the declared type.
    pub(crate) fn type_mismatch(gt: &Value, pred: &Value) -> Self {
        Self::new(
            NonMatchKind::Fd,
            Some(gt),
            Some(pred),
            Some(0.0),
            "type mismatch".to_string(),
        )
    }

    pub fn reason(&self) -> &str {
        self.details.get("reason").map_or("", String::as_str)
    }
}

/// Prefix a relative path onto a child path: `""` → `prefix`, `"[2]"` →
/// `prefix[2]`, `"name"` → `prefix.name`.
pub(crate) fn prefix_path(prefix: &str, path: &str) -> String {
    if path.is_empty() {
        prefix.to_string()
    } else if path.starts_with('[') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}.{path}")
    }
}

/// Rewrite every entry's path under the given prefix.
pub(crate) fn reroot(non_matches: &mut [NonMatch], prefix: &str) {
    for entry in non_matches {
        entry.field_path = prefix_path(prefix, &entry.field_path);
    }
}
