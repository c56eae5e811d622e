//! Field dispatch.
//!
//! Deterministic routing of one field pair by declared type and null
//! state:
//!
//! 1. declared list + either side null-equivalent → empty/skew handling,
//!    no element comparison
//! 2. primitive → 4-way null table, then the configured comparator
//! 3. record → null table (one-sided null counts one object), then
//!    recursion
//! 4. primitive list / record list → the specialized comparators
//! 5. runtime shape disagrees with the declared type → FD with score 0.0,
//!    weight honored, no partial recursion

use schema::{DeclaredType, FieldSchema, Value};

use crate::error::EngineError;
use crate::node::{ComparisonNode, Counts, NodeKind};
use crate::non_match::NonMatch;
use crate::traverse::TraversalCtx;
use crate::{field, primitive_list, record_list};

pub(crate) fn dispatch_field(
    field_schema: &FieldSchema,
    gt: &Value,
    pred: &Value,
    ctx: &TraversalCtx<'_>,
) -> Result<ComparisonNode, EngineError> {
    let weight = field_schema.config.weight;

    match field_schema.declared.base() {
        DeclaredType::PrimitiveList(_) | DeclaredType::RecordList(_) => {
            if gt.is_null_equivalent() || pred.is_null_equivalent() {
                return Ok(list_null_case(gt, pred, weight));
            }
            match (gt.as_list(), pred.as_list()) {
                (Some(gt_items), Some(pred_items)) => match field_schema.declared.base() {
                    DeclaredType::PrimitiveList(_) => {
                        primitive_list::compare(field_schema, gt_items, pred_items, ctx)
                    }
                    DeclaredType::RecordList(element) => {
                        record_list::compare(field_schema, element, gt_items, pred_items, ctx)
                    }
                    _ => unreachable!("outer match guarantees a list type"),
                },
                _ => Ok(mismatch_leaf(gt, pred, weight)),
            }
        }
        DeclaredType::Primitive(_) => {
            match (gt.is_null_equivalent(), pred.is_null_equivalent()) {
                (true, true) => Ok(ComparisonNode::leaf(
                    NodeKind::Leaf,
                    Counts::true_negatives(1),
                    1.0,
                    1.0,
                    weight,
                )),
                (true, false) => {
                    let mut node = ComparisonNode::leaf(
                        NodeKind::Leaf,
                        Counts::false_alarms(1),
                        0.0,
                        0.0,
                        weight,
                    );
                    node.non_matches.push(NonMatch::extra_in_prediction(pred));
                    Ok(node)
                }
                (false, true) => {
                    let mut node = ComparisonNode::leaf(
                        NodeKind::Leaf,
                        Counts::false_negatives(1),
                        0.0,
                        0.0,
                        weight,
                    );
                    node.non_matches.push(NonMatch::missing_in_prediction(gt));
                    Ok(node)
                }
                (false, false) => {
                    if is_primitive_shaped(gt) && is_primitive_shaped(pred) {
                        field::compare_primitive(field_schema, gt, pred, ctx)
                    } else {
                        Ok(mismatch_leaf(gt, pred, weight))
                    }
                }
            }
        }
        DeclaredType::Record(nested) => {
            match (gt.is_null_equivalent(), pred.is_null_equivalent()) {
                (true, true) => Ok(ComparisonNode::leaf(
                    NodeKind::Leaf,
                    Counts::true_negatives(1),
                    1.0,
                    1.0,
                    weight,
                )),
                // One-sided null counts one object; the rollup aggregates
                // zero primitives for it (no recursion into the null side).
                (true, false) => {
                    let mut node = ComparisonNode::leaf(
                        NodeKind::NullRecord,
                        Counts::false_alarms(1),
                        0.0,
                        0.0,
                        weight,
                    );
                    node.non_matches.push(NonMatch::extra_in_prediction(pred));
                    Ok(node)
                }
                (false, true) => {
                    let mut node = ComparisonNode::leaf(
                        NodeKind::NullRecord,
                        Counts::false_negatives(1),
                        0.0,
                        0.0,
                        weight,
                    );
                    node.non_matches.push(NonMatch::missing_in_prediction(gt));
                    Ok(node)
                }
                (false, false) => match (gt.as_record(), pred.as_record()) {
                    (Some(gt_record), Some(pred_record)) => {
                        field::compare_record_field(field_schema, nested, gt_record, pred_record, ctx)
                    }
                    _ => Ok(mismatch_leaf(gt, pred, weight)),
                },
            }
        }
        DeclaredType::Optional(_) => unreachable!("base() strips Optional"),
    }
}

/// Empty/skew handling for declared-list fields where at least one side is
/// null-equivalent.
fn list_null_case(gt: &Value, pred: &Value, weight: f64) -> ComparisonNode {
    match (gt.is_null_equivalent(), pred.is_null_equivalent()) {
        (true, true) => ComparisonNode::leaf(
            NodeKind::Leaf,
            Counts::true_negatives(1),
            1.0,
            1.0,
            weight,
        ),
        (true, false) => match pred.as_list() {
            Some(items) => {
                let mut node = ComparisonNode::leaf(
                    NodeKind::Leaf,
                    Counts::false_alarms(items.len() as u32),
                    0.0,
                    0.0,
                    weight,
                );
                for (index, item) in items.iter().enumerate() {
                    let mut entry = NonMatch::extra_in_prediction(item);
                    entry.field_path = format!("[{index}]");
                    node.non_matches.push(entry);
                }
                node
            }
            None => mismatch_leaf(gt, pred, weight),
        },
        (false, true) => match gt.as_list() {
            Some(items) => {
                let mut node = ComparisonNode::leaf(
                    NodeKind::Leaf,
                    Counts::false_negatives(items.len() as u32),
                    0.0,
                    0.0,
                    weight,
                );
                for (index, item) in items.iter().enumerate() {
                    let mut entry = NonMatch::missing_in_prediction(item);
                    entry.field_path = format!("[{index}]");
                    node.non_matches.push(entry);
                }
                node
            }
            None => mismatch_leaf(gt, pred, weight),
        },
        (false, false) => unreachable!("caller checked at least one null side"),
    }
}

/// Runtime shape disagrees with the declared type: FD, score 0.0, no
/// partial recursion.
fn mismatch_leaf(gt: &Value, pred: &Value, weight: f64) -> ComparisonNode {
    let mut node = ComparisonNode::leaf(
        NodeKind::Leaf,
        Counts::false_discoveries(1),
        0.0,
        0.0,
        weight,
    );
    node.non_matches.push(NonMatch::type_mismatch(gt, pred));
    node
}

fn is_primitive_shaped(value: &Value) -> bool {
    matches!(
        value,
        Value::Str(_) | Value::Int(_) | Value::Float(_) | Value::Bool(_)
    )
}
