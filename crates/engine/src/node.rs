//! Result-tree node types.
//!
//! Every level of a comparison result has the same shape: an `overall`
//! block (classification counts at this hierarchical level plus the
//! weighted similarity score), an ordered `fields` map of child nodes, and
//! an `aggregate` block (the component-wise sum of primitive-field counts
//! in the whole subtree, filled by the post-traversal rollup). Leaves also
//! carry their raw and threshold-applied scores and the weight the parent
//! uses for rollup math.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::non_match::NonMatch;

/// Classification counts. `fp` is always `fd + fa`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub tp: u32,
    pub tn: u32,
    pub fd: u32,
    pub fa: u32,
    pub fp: u32,
    #[serde(rename = "fn")]
    pub r#fn: u32,
}

impl Counts {
    pub fn true_positives(n: u32) -> Self {
        Self {
            tp: n,
            ..Self::default()
        }
    }

    pub fn true_negatives(n: u32) -> Self {
        Self {
            tn: n,
            ..Self::default()
        }
    }

    pub fn false_discoveries(n: u32) -> Self {
        Self {
            fd: n,
            fp: n,
            ..Self::default()
        }
    }

    pub fn false_alarms(n: u32) -> Self {
        Self {
            fa: n,
            fp: n,
            ..Self::default()
        }
    }

    pub fn false_negatives(n: u32) -> Self {
        Self {
            r#fn: n,
            ..Self::default()
        }
    }

    /// Component-wise accumulation.
    pub fn add(&mut self, other: &Counts) {
        self.tp += other.tp;
        self.tn += other.tn;
        self.fd += other.fd;
        self.fa += other.fa;
        self.fp += other.fp;
        self.r#fn += other.r#fn;
    }

    /// Count of classifications that are not matches (FD + FA + FN).
    pub fn mismatches(&self) -> u32 {
        self.fd + self.fa + self.r#fn
    }

    pub fn total(&self) -> u32 {
        self.tp + self.tn + self.fd + self.fa + self.r#fn
    }
}

/// Derived metrics computed from a counts block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Derived {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
}

impl Derived {
    /// Compute derived metrics; any zero denominator yields 0.0 for that
    /// metric. `recall_with_fd` switches the recall denominator to
    /// `tp + fn + fd`.
    pub fn from_counts(counts: &Counts, recall_with_fd: bool) -> Self {
        let tp = f64::from(counts.tp);
        let tn = f64::from(counts.tn);
        let fp = f64::from(counts.fp);
        let fn_ = f64::from(counts.r#fn);
        let fd = f64::from(counts.fd);

        let precision = ratio(tp, tp + fp);
        let recall_denominator = if recall_with_fd {
            tp + fn_ + fd
        } else {
            tp + fn_
        };
        let recall = ratio(tp, recall_denominator);
        let f1 = ratio(2.0 * precision * recall, precision + recall);
        let accuracy = ratio(tp + tn, tp + tn + fp + fn_);

        Self {
            precision,
            recall,
            f1,
            accuracy,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Counts at the node's own hierarchical level (objects for record lists),
/// plus the weighted similarity score and the all-fields-matched flag.
#[derive(Debug, Clone, Serialize)]
pub struct Overall {
    #[serde(flatten)]
    pub counts: Counts,
    pub similarity_score: f64,
    pub all_fields_matched: bool,
}

/// Sum of primitive-field counts across the subtree, with optional derived
/// metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregate {
    #[serde(flatten)]
    pub counts: Counts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<Derived>,
}

/// Construction-time classification of a node, used by the rollup pass and
/// the non-match collector. Not part of the serialized result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// Primitive leaf or null-table outcome.
    Leaf,
    /// Nested record with both sides present.
    Record,
    /// Record field where exactly one side is null-equivalent: counts one
    /// object, aggregates zero primitives.
    NullRecord,
    /// Order-irrelevant list of primitives.
    PrimitiveList,
    /// Assignment-matched list of records.
    RecordList,
}

/// One node of the comparison result tree.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonNode {
    pub overall: Overall,
    /// Child nodes in declared schema order.
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<(String, ComparisonNode)>,
    pub aggregate: Aggregate,
    pub raw_similarity_score: f64,
    pub threshold_applied_score: f64,
    pub weight: f64,
    #[serde(skip)]
    pub(crate) kind: NodeKind,
    /// Non-match records for this subtree, with paths relative to this
    /// node. Flattened into the report at the root.
    #[serde(skip)]
    pub(crate) non_matches: Vec<NonMatch>,
}

impl ComparisonNode {
    /// A childless node: primitive leaf, null-table outcome, or list.
    pub(crate) fn leaf(
        kind: NodeKind,
        counts: Counts,
        raw_similarity_score: f64,
        threshold_applied_score: f64,
        weight: f64,
    ) -> Self {
        let all_fields_matched = counts.mismatches() == 0;
        Self {
            overall: Overall {
                counts,
                similarity_score: raw_similarity_score,
                all_fields_matched,
            },
            fields: Vec::new(),
            aggregate: Aggregate::default(),
            raw_similarity_score,
            threshold_applied_score,
            weight,
            kind,
            non_matches: Vec::new(),
        }
    }

    /// Child lookup by field name.
    pub fn field(&self, name: &str) -> Option<&ComparisonNode> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, node)| node)
    }
}

fn serialize_fields<S: Serializer>(
    fields: &[(String, ComparisonNode)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for (name, node) in fields {
        map.serialize_entry(name, node)?;
    }
    map.end()
}
