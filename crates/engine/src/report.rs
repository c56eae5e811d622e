//! Report assembly.
//!
//! [`ComparisonReport`] is what [`StructuredEvaluator::compare`] returns:
//! the scalar score and all-fields-matched flag always, plus the sections
//! the options requested. The evaluator reshape is a distinct top-level
//! format (derived metrics plus `anls_score`) and is never mixed with the
//! standard counts tree.
//!
//! [`StructuredEvaluator::compare`]: crate::StructuredEvaluator::compare

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::node::{ComparisonNode, Derived};
use crate::non_match::NonMatch;

/// Result of one comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    /// Weighted average similarity of the root record.
    pub overall_score: f64,
    /// True iff every declared root field's raw score cleared its
    /// threshold.
    pub all_fields_matched: bool,
    /// Hierarchical counts tree (`include_confusion_matrix`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confusion_matrix: Option<ComparisonNode>,
    /// Flat non-match list in depth-first order (`document_non_matches`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_matches: Option<Vec<NonMatch>>,
    /// Alternate top-level shape (`evaluator_format`); exclusive of the
    /// tree sections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator: Option<EvaluatorSummary>,
}

/// Top block of the evaluator reshape.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatorOverall {
    #[serde(flatten)]
    pub derived: Derived,
    /// The root's weighted similarity score under its evaluator name.
    pub anls_score: f64,
}

/// Evaluator-format reshape: per-node derived metrics, nothing else.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatorSummary {
    pub overall: EvaluatorOverall,
    /// Derived metrics per top-level field, in declared order.
    #[serde(serialize_with = "serialize_derived_fields")]
    pub fields: Vec<(String, Derived)>,
}

impl EvaluatorSummary {
    /// Derived metrics for a top-level field.
    pub fn field(&self, name: &str) -> Option<&Derived> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, derived)| derived)
    }
}

/// Build the evaluator reshape from a rolled-up tree.
pub(crate) fn evaluator_summary(root: &ComparisonNode, recall_with_fd: bool) -> EvaluatorSummary {
    EvaluatorSummary {
        overall: EvaluatorOverall {
            derived: Derived::from_counts(&root.aggregate.counts, recall_with_fd),
            anls_score: root.overall.similarity_score,
        },
        fields: root
            .fields
            .iter()
            .map(|(name, child)| {
                (
                    name.clone(),
                    Derived::from_counts(&child.aggregate.counts, recall_with_fd),
                )
            })
            .collect(),
    }
}

fn serialize_derived_fields<S: Serializer>(
    fields: &[(String, Derived)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (name, derived) in fields {
        map.serialize_entry(name, derived)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Counts, NodeKind};

    #[test]
    fn evaluator_summary_exposes_anls_and_per_field_derived() {
        let mut root =
            ComparisonNode::leaf(NodeKind::Record, Counts::true_positives(1), 0.9, 0.9, 1.0);
        root.aggregate.counts = Counts::true_positives(1);
        root.fields.push((
            "name".to_string(),
            ComparisonNode::leaf(NodeKind::Leaf, Counts::true_positives(1), 1.0, 1.0, 1.0),
        ));
        root.fields[0].1.aggregate.counts = Counts::true_positives(1);

        let summary = evaluator_summary(&root, false);
        assert_eq!(summary.overall.anls_score, 0.9);
        assert_eq!(summary.overall.derived.precision, 1.0);
        assert_eq!(summary.field("name").unwrap().recall, 1.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["overall"]["anls_score"], 0.9);
        assert_eq!(json["fields"]["name"]["f1"], 1.0);
    }
}
