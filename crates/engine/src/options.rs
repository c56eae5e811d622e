use serde::{Deserialize, Serialize};

/// Options recognized by a single comparison.
///
/// Defaults mirror the minimal call: only the scalar score and the
/// all-fields-matched flag are produced unless a section is requested.
/// `CompareOptions` is cheap to clone and serde-friendly so it can be
/// embedded in higher-level configs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompareOptions {
    /// Include the hierarchical counts tree in the report.
    #[serde(default)]
    pub include_confusion_matrix: bool,
    /// Include the flat non-match list in the report.
    #[serde(default)]
    pub document_non_matches: bool,
    /// Reshape the top level as precision/recall/F1/accuracy (plus
    /// `anls_score`) instead of the counts tree. Exclusive of the standard
    /// shape.
    #[serde(default)]
    pub evaluator_format: bool,
    /// Compute recall as `tp / (tp + fn + fd)` instead of `tp / (tp + fn)`.
    /// Affects only the derived blocks.
    #[serde(default)]
    pub recall_with_fd: bool,
    /// Attach derived metrics to every aggregate block.
    #[serde(default = "CompareOptions::default_add_derived_metrics")]
    pub add_derived_metrics: bool,
}

impl CompareOptions {
    pub(crate) fn default_add_derived_metrics() -> bool {
        true
    }

    /// Options for a full report: counts tree plus non-match list.
    pub fn detailed() -> Self {
        Self {
            include_confusion_matrix: true,
            document_non_matches: true,
            ..Self::default()
        }
    }
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            include_confusion_matrix: false,
            document_non_matches: false,
            evaluator_format: false,
            recall_with_fd: false,
            add_derived_metrics: Self::default_add_derived_metrics(),
        }
    }
}
