//! Primitive and nested-record field comparison.

use std::collections::BTreeMap;

use schema::{FieldSchema, RecordSchema, Value};

use crate::error::EngineError;
use crate::node::{ComparisonNode, Counts, NodeKind, Overall};
use crate::non_match::NonMatch;
use crate::traverse::{compare_record, TraversalCtx};

/// Compare a non-null primitive pair with the field's configured
/// comparator. A comparator error degrades to a 0.0 score (and therefore
/// an FD); out-of-range scores are clamped at this boundary.
pub(crate) fn compare_primitive(
    field: &FieldSchema,
    gt: &Value,
    pred: &Value,
    ctx: &TraversalCtx<'_>,
) -> Result<ComparisonNode, EngineError> {
    let comparator = ctx.comparator_for(field)?;
    let raw = comparator
        .compare(gt, pred)
        .map(|score| score.clamp(0.0, 1.0))
        .unwrap_or(0.0);

    let threshold = field.config.threshold;
    let matched = raw >= threshold;
    let counts = if matched {
        Counts::true_positives(1)
    } else {
        Counts::false_discoveries(1)
    };
    let threshold_applied = if matched || !field.config.clip_under_threshold {
        raw
    } else {
        0.0
    };

    let mut node = ComparisonNode::leaf(
        NodeKind::Leaf,
        counts,
        raw,
        threshold_applied,
        field.config.weight,
    );
    if !matched {
        node.non_matches
            .push(NonMatch::below_threshold(gt, pred, raw, threshold));
    }
    Ok(node)
}

/// Compare a nested record pair: recurse over the sub-schema, then convert
/// the subtree's weighted score into a one-object classification against
/// this field's threshold.
pub(crate) fn compare_record_field(
    field: &FieldSchema,
    nested: &RecordSchema,
    gt_record: &BTreeMap<String, Value>,
    pred_record: &BTreeMap<String, Value>,
    ctx: &TraversalCtx<'_>,
) -> Result<ComparisonNode, EngineError> {
    let inner = compare_record(nested, gt_record, pred_record, ctx)?;
    let raw = inner.overall.similarity_score;

    let matched = raw >= field.config.threshold;
    let counts = if matched {
        Counts::true_positives(1)
    } else {
        Counts::false_discoveries(1)
    };
    let threshold_applied = if matched || !field.config.clip_under_threshold {
        raw
    } else {
        0.0
    };

    Ok(ComparisonNode {
        overall: Overall {
            counts,
            similarity_score: raw,
            all_fields_matched: inner.overall.all_fields_matched,
        },
        fields: inner.fields,
        aggregate: Default::default(),
        raw_similarity_score: raw,
        threshold_applied_score: threshold_applied,
        weight: field.config.weight,
        kind: NodeKind::Record,
        non_matches: inner.non_matches,
    })
}
