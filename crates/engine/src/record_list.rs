//! Assignment-matched comparison of record lists with threshold-gated
//! recursion.
//!
//! Every ground-truth/prediction pair gets a full recursive compare; the
//! resulting subtree is cached so the similarity matrix, the gating
//! decision, and the merged per-field children all reuse one traversal per
//! pair. Matrix rows are evaluated in parallel — entries are independent
//! and the assignment runs on the completed matrix, so parallelism cannot
//! change the outcome.
//!
//! Object-level counts live at this node's `overall`: a matched pair is TP
//! when its similarity clears the element schema's `match_threshold`
//! (within a small epsilon for boundary equality), otherwise an atomic FD
//! with no recursion into its fields. Unmatched ground-truth items are
//! FNs, unmatched prediction items FAs.
//!
//! Field-level children under `fields[*]` merge the recursive results of
//! the gated-in pairs only. Unmatched items still contribute atomic counts
//! per sub-field: FN where the ground-truth value is present, TN where it
//! is null-equivalent, FA for present prediction values.

use rayon::prelude::*;

use assignment::solve_assignment;
use schema::{FieldSchema, RecordSchema, Value};

use crate::error::EngineError;
use crate::node::{Aggregate, ComparisonNode, Counts, NodeKind, Overall};
use crate::non_match::{reroot, NonMatch};
use crate::traverse::{compare_record, TraversalCtx};

/// Boundary tolerance for the match-threshold gate: a pair whose score is
/// within this of the threshold counts as clearing it.
const MATCH_EPSILON: f64 = 1e-10;

struct PairCell {
    score: f64,
    node: Option<ComparisonNode>,
}

pub(crate) fn compare(
    field: &FieldSchema,
    element: &RecordSchema,
    gt_items: &[Value],
    pred_items: &[Value],
    ctx: &TraversalCtx<'_>,
) -> Result<ComparisonNode, EngineError> {
    let match_threshold = element.match_threshold;

    // Full recursive compare per pair, cached for gating and child merging.
    let cells: Vec<Vec<PairCell>> = gt_items
        .par_iter()
        .map(|gt_item| -> Result<Vec<PairCell>, EngineError> {
            pred_items
                .iter()
                .map(|pred_item| {
                    ctx.check_cancelled()?;
                    match (gt_item.as_record(), pred_item.as_record()) {
                        (Some(gt_record), Some(pred_record)) => {
                            let node = compare_record(element, gt_record, pred_record, ctx)?;
                            Ok(PairCell {
                                score: node.overall.similarity_score,
                                node: Some(node),
                            })
                        }
                        // A non-record element cannot be recursed into; it
                        // pairs with similarity zero.
                        _ => Ok(PairCell {
                            score: 0.0,
                            node: None,
                        }),
                    }
                })
                .collect()
        })
        .collect::<Result<_, _>>()?;

    let matrix: Vec<Vec<f64>> = cells
        .iter()
        .map(|row| row.iter().map(|cell| cell.score).collect())
        .collect();
    let pairing = solve_assignment(&matrix);

    let mut counts = Counts::default();
    let mut matched_sum = 0.0;
    let mut gated_in: Vec<(usize, usize)> = Vec::new();
    let mut gated_out: Vec<(usize, usize, f64)> = Vec::new();

    for &(i, j) in &pairing.pairs {
        let score = matrix[i][j];
        matched_sum += score;
        if score >= match_threshold - MATCH_EPSILON {
            counts.add(&Counts::true_positives(1));
            gated_in.push((i, j));
        } else {
            counts.add(&Counts::false_discoveries(1));
            gated_out.push((i, j, score));
        }
    }
    counts.add(&Counts::false_negatives(pairing.unmatched_rows.len() as u32));
    counts.add(&Counts::false_alarms(pairing.unmatched_cols.len() as u32));

    let coverage = gt_items.len().max(pred_items.len()) as f64;
    let raw = matched_sum / coverage;

    let has_unmatched = !pairing.unmatched_rows.is_empty() || !pairing.unmatched_cols.is_empty();
    let mut fields = Vec::new();
    if !gated_in.is_empty() || has_unmatched {
        for sub_field in &element.fields {
            let mut acc = MergeAcc::default();
            for &(i, j) in &gated_in {
                if let Some(node) = &cells[i][j].node {
                    if let Some(child) = node.field(&sub_field.name) {
                        acc.merge(child);
                    }
                }
            }
            for &i in &pairing.unmatched_rows {
                if sub_value_is_null(&gt_items[i], &sub_field.name) {
                    acc.add_atomic(Counts::true_negatives(1));
                } else {
                    acc.add_atomic(Counts::false_negatives(1));
                }
            }
            for &j in &pairing.unmatched_cols {
                if !sub_value_is_null(&pred_items[j], &sub_field.name) {
                    acc.add_atomic(Counts::false_alarms(1));
                }
            }
            fields.push((sub_field.name.clone(), acc.into_node(sub_field.config.weight)));
        }
    }

    // Non-matches: nested entries from gated-in pairs keep DFS order, then
    // object-level FDs, FNs, FAs.
    let mut non_matches = Vec::new();
    for &(i, j) in &gated_in {
        if let Some(node) = &cells[i][j].node {
            let mut inner = node.non_matches.clone();
            reroot(&mut inner, &format!("[{i}]"));
            non_matches.extend(inner);
        }
    }
    for &(i, j, score) in &gated_out {
        let mut entry = NonMatch::below_match_threshold(
            &gt_items[i],
            &pred_items[j],
            score,
            match_threshold,
        );
        entry.field_path = format!("[{i}]");
        non_matches.push(entry);
    }
    for &i in &pairing.unmatched_rows {
        let mut entry = NonMatch::missing_in_prediction(&gt_items[i]);
        entry.field_path = format!("[{i}]");
        non_matches.push(entry);
    }
    for &j in &pairing.unmatched_cols {
        let mut entry = NonMatch::extra_in_prediction(&pred_items[j]);
        entry.field_path = format!("[{j}]");
        non_matches.push(entry);
    }

    Ok(ComparisonNode {
        overall: Overall {
            all_fields_matched: counts.mismatches() == 0,
            similarity_score: raw,
            counts,
        },
        fields,
        aggregate: Aggregate::default(),
        raw_similarity_score: raw,
        // List scores are never clipped.
        threshold_applied_score: raw,
        weight: field.config.weight,
        kind: NodeKind::RecordList,
        non_matches,
    })
}

fn sub_value_is_null(item: &Value, sub_field: &str) -> bool {
    item.as_record()
        .and_then(|record| record.get(sub_field))
        .map_or(true, Value::is_null_equivalent)
}

/// Accumulator that merges the same sub-field node across gated-in pairs,
/// recursively for arbitrary nesting depth.
#[derive(Default)]
struct MergeAcc {
    counts: Counts,
    children: Vec<(String, MergeAcc)>,
    raw_sum: f64,
    raw_count: u32,
    kind: Option<NodeKind>,
    atomic_contrib: bool,
}

impl MergeAcc {
    fn merge(&mut self, node: &ComparisonNode) {
        self.counts.add(&node.overall.counts);
        self.raw_sum += node.raw_similarity_score;
        self.raw_count += 1;
        self.kind = match (self.kind, node.kind) {
            (None, kind) => Some(kind),
            // A null-record source zeroes the aggregate; any non-null
            // source restores normal rollup for the merged node.
            (Some(NodeKind::NullRecord), kind) if kind != NodeKind::NullRecord => Some(kind),
            (current, _) => current,
        };
        for (name, child) in &node.fields {
            match self.children.iter_mut().find(|(n, _)| n == name) {
                Some((_, acc)) => acc.merge(child),
                None => {
                    let mut acc = MergeAcc::default();
                    acc.merge(child);
                    self.children.push((name.clone(), acc));
                }
            }
        }
    }

    /// Atomic contribution from an unmatched item (no subtree behind it).
    fn add_atomic(&mut self, counts: Counts) {
        self.counts.add(&counts);
        self.atomic_contrib = true;
    }

    fn into_node(self, weight: f64) -> ComparisonNode {
        let raw = if self.raw_count > 0 {
            self.raw_sum / f64::from(self.raw_count)
        } else {
            0.0
        };
        let kind = match self.kind {
            Some(NodeKind::NullRecord) if !self.atomic_contrib => NodeKind::NullRecord,
            Some(NodeKind::NullRecord) | None => NodeKind::Leaf,
            Some(kind) => kind,
        };
        ComparisonNode {
            overall: Overall {
                all_fields_matched: self.counts.mismatches() == 0,
                similarity_score: raw,
                counts: self.counts,
            },
            fields: self
                .children
                .into_iter()
                .map(|(name, acc)| (name, acc.into_node(1.0)))
                .collect(),
            aggregate: Aggregate::default(),
            raw_similarity_score: raw,
            threshold_applied_score: raw,
            weight,
            kind,
            non_matches: Vec::new(),
        }
    }
}
