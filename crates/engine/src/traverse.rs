//! Record traversal.
//!
//! One comparison is a single recursive walk over the shared schema. For
//! each declared field the dispatcher produces a child node; the record
//! node sums child counts into its own `overall`, accumulates the
//! weighted score, tracks the all-fields-matched flag, and re-roots child
//! non-match paths under the field name. Node state advances
//! `Pending → FieldsBuilt → Rolled → DerivedAttached → Emitted`; the
//! rollup and derived passes live in [`crate::metrics`] and callers only
//! ever observe emitted trees.

use std::collections::BTreeMap;
use std::sync::Arc;

use comparators::{Comparator, ComparatorRegistry};
use schema::{FieldSchema, RecordSchema, Value};

use crate::cancel::CancelToken;
use crate::dispatch;
use crate::error::EngineError;
use crate::node::{ComparisonNode, Counts, NodeKind, Overall};
use crate::non_match::reroot;

/// Read-only state threaded through one traversal.
pub(crate) struct TraversalCtx<'a> {
    pub registry: &'a ComparatorRegistry,
    pub cancel: Option<&'a CancelToken>,
}

impl TraversalCtx<'_> {
    pub(crate) fn check_cancelled(&self) -> Result<(), EngineError> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(EngineError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Resolve the comparator a field uses. Registry coverage is validated
    /// at evaluator construction, so a miss here means the schema was
    /// swapped out from under us — surfaced as the same typed error.
    pub(crate) fn comparator_for(
        &self,
        field: &FieldSchema,
    ) -> Result<Arc<dyn Comparator>, EngineError> {
        let name = field.resolved_comparator().ok_or_else(|| {
            EngineError::UnknownComparator(format!("<none for field '{}'>", field.name))
        })?;
        self.registry
            .get(name)
            .ok_or_else(|| EngineError::UnknownComparator(name.to_string()))
    }
}

/// Compare two records under a shared schema, producing the node for this
/// level with `overall` and `fields` populated. Aggregates are filled by
/// the post-traversal rollup.
pub(crate) fn compare_record(
    schema: &RecordSchema,
    gt_fields: &BTreeMap<String, Value>,
    pred_fields: &BTreeMap<String, Value>,
    ctx: &TraversalCtx<'_>,
) -> Result<ComparisonNode, EngineError> {
    let mut fields = Vec::with_capacity(schema.fields.len());
    let mut counts = Counts::default();
    let mut total_score = 0.0;
    let mut total_weight = 0.0;
    let mut all_fields_matched = true;
    let mut non_matches = Vec::new();

    for field in &schema.fields {
        ctx.check_cancelled()?;
        let gt_value = gt_fields.get(&field.name).unwrap_or(&Value::Null);
        let pred_value = pred_fields.get(&field.name).unwrap_or(&Value::Null);

        let mut child = dispatch::dispatch_field(field, gt_value, pred_value, ctx)?;

        counts.add(&child.overall.counts);
        total_score += child.threshold_applied_score * field.config.weight;
        total_weight += field.config.weight;
        if child.raw_similarity_score < field.config.threshold {
            all_fields_matched = false;
        }

        let mut child_non_matches = std::mem::take(&mut child.non_matches);
        reroot(&mut child_non_matches, &field.name);
        non_matches.extend(child_non_matches);
        fields.push((field.name.clone(), child));
    }

    let similarity_score = if total_weight > 0.0 {
        total_score / total_weight
    } else if gt_fields.is_empty() && pred_fields.is_empty() {
        1.0
    } else {
        0.0
    };

    Ok(ComparisonNode {
        overall: Overall {
            counts,
            similarity_score,
            all_fields_matched,
        },
        fields,
        aggregate: Default::default(),
        raw_similarity_score: similarity_score,
        threshold_applied_score: similarity_score,
        weight: 1.0,
        kind: NodeKind::Record,
        non_matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{DeclaredType, FieldConfig, PrimitiveType};

    fn two_field_schema() -> RecordSchema {
        RecordSchema::new("Contact")
            .with_field(FieldSchema::new(
                "name",
                DeclaredType::Primitive(PrimitiveType::Str),
                FieldConfig::default(),
            ))
            .with_field(FieldSchema::new(
                "phone",
                DeclaredType::Primitive(PrimitiveType::Str),
                FieldConfig {
                    weight: 3.0,
                    ..FieldConfig::default()
                },
            ))
    }

    fn record(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn weighted_average_respects_field_weights() {
        let schema = two_field_schema();
        let registry = ComparatorRegistry::with_defaults();
        let ctx = TraversalCtx {
            registry: &registry,
            cancel: None,
        };
        let gt = record(&[
            ("name", Value::Str("John".into())),
            ("phone", Value::Str("555-1".into())),
        ]);
        let pred = record(&[
            ("name", Value::Str("John".into())),
            ("phone", Value::Null),
        ]);

        let node = compare_record(&schema, &gt, &pred, &ctx).unwrap();
        // name scores 1.0 with weight 1, phone 0.0 with weight 3.
        assert!((node.overall.similarity_score - 0.25).abs() < 1e-9);
        assert!(!node.overall.all_fields_matched);
        assert_eq!(node.overall.counts.tp, 1);
        assert_eq!(node.overall.counts.r#fn, 1);
    }

    #[test]
    fn children_preserve_declared_order() {
        let schema = two_field_schema();
        let registry = ComparatorRegistry::with_defaults();
        let ctx = TraversalCtx {
            registry: &registry,
            cancel: None,
        };
        let gt = record(&[("phone", Value::Str("1".into()))]);
        let node = compare_record(&schema, &gt, &gt, &ctx).unwrap();
        let names: Vec<_> = node.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["name", "phone"]);
    }

    #[test]
    fn non_match_paths_are_rerooted_under_field_names() {
        let schema = two_field_schema();
        let registry = ComparatorRegistry::with_defaults();
        let ctx = TraversalCtx {
            registry: &registry,
            cancel: None,
        };
        let gt = record(&[("phone", Value::Str("555-1".into()))]);
        let pred = record(&[]);
        let node = compare_record(&schema, &gt, &pred, &ctx).unwrap();
        assert_eq!(node.non_matches.len(), 1);
        assert_eq!(node.non_matches[0].field_path, "phone");
    }

    #[test]
    fn cancellation_aborts_between_fields() {
        let schema = two_field_schema();
        let registry = ComparatorRegistry::with_defaults();
        let token = CancelToken::new();
        token.cancel();
        let ctx = TraversalCtx {
            registry: &registry,
            cancel: Some(&token),
        };
        let gt = record(&[("name", Value::Str("x".into()))]);
        let err = compare_record(&schema, &gt, &gt, &ctx).unwrap_err();
        assert_eq!(err, EngineError::Cancelled);
    }
}
