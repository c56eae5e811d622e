//! Order-irrelevant comparison of primitive lists.
//!
//! Both lists are non-empty by the time this runs (the dispatcher handles
//! null and skew cases). A full element-similarity matrix feeds the
//! assignment solver; matched pairs classify against the element
//! threshold, unmatched ground-truth items are FNs, unmatched prediction
//! items are FAs. The list score is the matched-pair similarity sum scaled
//! by the longer length, so unmatched positions pull it down. List scores
//! are never clipped.

use assignment::solve_assignment;
use schema::{FieldSchema, Value};

use crate::error::EngineError;
use crate::node::{ComparisonNode, Counts, NodeKind};
use crate::non_match::NonMatch;
use crate::traverse::TraversalCtx;

pub(crate) fn compare(
    field: &FieldSchema,
    gt_items: &[Value],
    pred_items: &[Value],
    ctx: &TraversalCtx<'_>,
) -> Result<ComparisonNode, EngineError> {
    let comparator = ctx.comparator_for(field)?;
    let threshold = field.config.threshold;

    let mut matrix = vec![vec![0.0_f64; pred_items.len()]; gt_items.len()];
    for (i, gt_item) in gt_items.iter().enumerate() {
        for (j, pred_item) in pred_items.iter().enumerate() {
            matrix[i][j] = comparator
                .compare(gt_item, pred_item)
                .map(|score| score.clamp(0.0, 1.0))
                .unwrap_or(0.0);
        }
    }

    let assignment = solve_assignment(&matrix);
    let mut counts = Counts::default();
    let mut matched_sum = 0.0;
    let mut non_matches = Vec::new();

    for &(i, j) in &assignment.pairs {
        let score = matrix[i][j];
        matched_sum += score;
        if score >= threshold {
            counts.add(&Counts::true_positives(1));
        } else {
            counts.add(&Counts::false_discoveries(1));
            let mut entry =
                NonMatch::below_threshold(&gt_items[i], &pred_items[j], score, threshold);
            entry.field_path = format!("[{i}]");
            non_matches.push(entry);
        }
    }
    for &i in &assignment.unmatched_rows {
        counts.add(&Counts::false_negatives(1));
        let mut entry = NonMatch::missing_in_prediction(&gt_items[i]);
        entry.field_path = format!("[{i}]");
        non_matches.push(entry);
    }
    for &j in &assignment.unmatched_cols {
        counts.add(&Counts::false_alarms(1));
        let mut entry = NonMatch::extra_in_prediction(&pred_items[j]);
        entry.field_path = format!("[{j}]");
        non_matches.push(entry);
    }

    let coverage = gt_items.len().max(pred_items.len()) as f64;
    let raw = matched_sum / coverage;

    let mut node = ComparisonNode::leaf(
        NodeKind::PrimitiveList,
        counts,
        raw,
        raw,
        field.config.weight,
    );
    node.non_matches = non_matches;
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comparators::ComparatorRegistry;
    use schema::{DeclaredType, FieldConfig, PrimitiveType};

    fn tags_field(threshold: f64) -> FieldSchema {
        FieldSchema::new(
            "tags",
            DeclaredType::PrimitiveList(PrimitiveType::Str),
            FieldConfig {
                threshold,
                ..FieldConfig::default()
            },
        )
    }

    fn strings(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::Str(s.to_string())).collect()
    }

    #[test]
    fn reordered_identical_lists_match_fully() {
        let registry = ComparatorRegistry::with_defaults();
        let ctx = TraversalCtx {
            registry: &registry,
            cancel: None,
        };
        let gt = strings(&["red", "blue", "green"]);
        let pred = strings(&["blue", "green", "red"]);
        let node = compare(&tags_field(0.7), &gt, &pred, &ctx).unwrap();
        assert_eq!(node.overall.counts.tp, 3);
        assert_eq!(node.overall.counts.mismatches(), 0);
        assert_eq!(node.raw_similarity_score, 1.0);
        assert!(node.non_matches.is_empty());
    }

    #[test]
    fn typo_and_substitute_split_into_tp_and_fd() {
        let registry = ComparatorRegistry::with_defaults();
        let ctx = TraversalCtx {
            registry: &registry,
            cancel: None,
        };
        let gt = strings(&["apple", "banana", "cherry"]);
        let pred = strings(&["aple", "banana", "orange"]);
        let node = compare(&tags_field(0.7), &gt, &pred, &ctx).unwrap();
        assert_eq!(node.overall.counts.tp, 2);
        assert_eq!(node.overall.counts.fd, 1);
        assert_eq!(node.overall.counts.fa, 0);
        assert_eq!(node.overall.counts.r#fn, 0);
        // The FD witness is the cherry/orange pair.
        assert_eq!(node.non_matches.len(), 1);
        assert_eq!(node.non_matches[0].gt_value.as_deref(), Some("cherry"));
        assert_eq!(node.non_matches[0].pred_value.as_deref(), Some("orange"));
    }

    #[test]
    fn length_skew_produces_unmatched_counts() {
        let registry = ComparatorRegistry::with_defaults();
        let ctx = TraversalCtx {
            registry: &registry,
            cancel: None,
        };
        let gt = strings(&["a", "b", "c"]);
        let pred = strings(&["a"]);
        let node = compare(&tags_field(0.7), &gt, &pred, &ctx).unwrap();
        assert_eq!(node.overall.counts.tp, 1);
        assert_eq!(node.overall.counts.r#fn, 2);
        // One exact match over coverage three.
        assert!((node.raw_similarity_score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn order_of_witnesses_is_fd_then_fn_then_fa() {
        let registry = ComparatorRegistry::with_defaults();
        let ctx = TraversalCtx {
            registry: &registry,
            cancel: None,
        };
        // gt has an extra item; pred replaces one entirely.
        let gt = strings(&["alpha", "beta", "gamma"]);
        let pred = strings(&["alpha", "zzzzz"]);
        let node = compare(&tags_field(0.7), &gt, &pred, &ctx).unwrap();
        let kinds: Vec<_> = node.non_matches.iter().map(|m| m.kind).collect();
        let mut sorted = kinds.clone();
        sorted.sort_by_key(|k| match k {
            crate::NonMatchKind::Fd => 0,
            crate::NonMatchKind::Fn => 1,
            crate::NonMatchKind::Fa => 2,
        });
        assert_eq!(kinds, sorted);
    }
}
