//! Post-traversal metrics passes.
//!
//! The rollup fills every node's `aggregate` in post-order: a childless
//! node copies its `overall` counts, a node with children sums its
//! children's aggregates, and a null-record node (one side null, the other
//! a populated record) aggregates zero primitives. At the root, top-level
//! fields with `include_in_aggregate = false` are left out of the sum —
//! their own node counts are untouched.
//!
//! The derived pass attaches precision/recall/F1/accuracy to every
//! aggregate block.

use schema::RecordSchema;

use crate::node::{ComparisonNode, Counts, Derived, NodeKind};

/// Fill aggregates through the whole tree, honoring the root-level
/// `include_in_aggregate` toggles.
pub(crate) fn rollup_root(root: &mut ComparisonNode, schema: &RecordSchema) {
    for (_, child) in &mut root.fields {
        rollup(child);
    }
    root.aggregate.counts = if root.fields.is_empty() {
        root.overall.counts
    } else {
        let mut counts = Counts::default();
        for (name, child) in &root.fields {
            let include = schema
                .field(name)
                .map_or(true, |field| field.config.include_in_aggregate);
            if include {
                counts.add(&child.aggregate.counts);
            }
        }
        counts
    };
}

fn rollup(node: &mut ComparisonNode) {
    for (_, child) in &mut node.fields {
        rollup(child);
    }
    node.aggregate.counts = match node.kind {
        NodeKind::NullRecord => Counts::default(),
        _ if node.fields.is_empty() => node.overall.counts,
        _ => {
            let mut counts = Counts::default();
            for (_, child) in &node.fields {
                counts.add(&child.aggregate.counts);
            }
            counts
        }
    };
}

/// Attach derived metrics to every aggregate block.
pub(crate) fn attach_derived(node: &mut ComparisonNode, recall_with_fd: bool) {
    node.aggregate.derived = Some(Derived::from_counts(&node.aggregate.counts, recall_with_fd));
    for (_, child) in &mut node.fields {
        attach_derived(child, recall_with_fd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Aggregate, Overall};

    fn leaf(counts: Counts) -> ComparisonNode {
        ComparisonNode::leaf(NodeKind::Leaf, counts, 1.0, 1.0, 1.0)
    }

    fn parent(children: Vec<(String, ComparisonNode)>, counts: Counts) -> ComparisonNode {
        ComparisonNode {
            overall: Overall {
                counts,
                similarity_score: 1.0,
                all_fields_matched: true,
            },
            fields: children,
            aggregate: Aggregate::default(),
            raw_similarity_score: 1.0,
            threshold_applied_score: 1.0,
            weight: 1.0,
            kind: NodeKind::Record,
            non_matches: Vec::new(),
        }
    }

    #[test]
    fn leaf_aggregate_copies_overall() {
        let schema = RecordSchema::new("Empty");
        let mut node = leaf(Counts::true_positives(2));
        rollup_root(&mut node, &schema);
        assert_eq!(node.aggregate.counts, node.overall.counts);
    }

    #[test]
    fn parent_aggregate_sums_children() {
        let schema = RecordSchema::new("Doc");
        let children = vec![
            ("a".to_string(), leaf(Counts::true_positives(1))),
            ("b".to_string(), leaf(Counts::false_negatives(2))),
        ];
        let mut node = parent(children, Counts::true_positives(1));
        rollup_root(&mut node, &schema);
        assert_eq!(node.aggregate.counts.tp, 1);
        assert_eq!(node.aggregate.counts.r#fn, 2);
    }

    #[test]
    fn null_record_node_aggregates_zero() {
        let schema = RecordSchema::new("Doc");
        let null_record =
            ComparisonNode::leaf(NodeKind::NullRecord, Counts::false_alarms(1), 0.0, 0.0, 1.0);
        let mut node = parent(
            vec![("address".to_string(), null_record)],
            Counts::false_alarms(1),
        );
        rollup_root(&mut node, &schema);
        // The object-level FA stays in overall; the aggregate sees no
        // primitives behind the null side.
        assert_eq!(node.overall.counts.fa, 1);
        assert_eq!(node.aggregate.counts, Counts::default());
    }

    #[test]
    fn derived_attached_at_every_level() {
        let schema = RecordSchema::new("Doc");
        let children = vec![("a".to_string(), leaf(Counts::true_positives(1)))];
        let mut node = parent(children, Counts::true_positives(1));
        rollup_root(&mut node, &schema);
        attach_derived(&mut node, false);
        assert!(node.aggregate.derived.is_some());
        assert!(node.fields[0].1.aggregate.derived.is_some());
        assert_eq!(node.aggregate.derived.unwrap().precision, 1.0);
    }
}
