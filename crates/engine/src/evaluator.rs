//! The comparison engine's public entry point.

use std::sync::Arc;

use comparators::ComparatorRegistry;
use schema::{DeclaredType, RecordSchema, Value};

use crate::cancel::CancelToken;
use crate::error::EngineError;
use crate::metrics::{attach_derived, rollup_root};
use crate::options::CompareOptions;
use crate::report::{evaluator_summary, ComparisonReport};
use crate::traverse::{compare_record, TraversalCtx};

/// Compares schema-bound record pairs.
///
/// An evaluator owns its schema by shared reference (`Arc`) and borrows
/// the caller's comparator registry. Construction validates the schema and
/// checks that every referenced comparator resolves, so a traversal can
/// never fail halfway through on a missing registry entry. The evaluator
/// holds no mutable state: independent comparisons may run concurrently on
/// the same instance.
///
/// # Example
///
/// ```rust
/// use comparators::ComparatorRegistry;
/// use engine::{CompareOptions, StructuredEvaluator};
/// use schema::record_schema_from_json;
///
/// let schema = record_schema_from_json(&serde_json::json!({
///     "type": "object",
///     "title": "Contact",
///     "properties": {"name": {"type": "string"}},
/// })).unwrap();
/// let registry = ComparatorRegistry::with_defaults();
/// let evaluator = StructuredEvaluator::new(schema.clone(), &registry).unwrap();
///
/// let gt = schema.record_from_json(&serde_json::json!({"name": "Ada"})).unwrap();
/// let report = evaluator.compare(&gt, &gt, &CompareOptions::default()).unwrap();
/// assert_eq!(report.overall_score, 1.0);
/// assert!(report.all_fields_matched);
/// ```
pub struct StructuredEvaluator<'a> {
    schema: Arc<RecordSchema>,
    registry: &'a ComparatorRegistry,
    cancel: Option<CancelToken>,
}

impl<'a> StructuredEvaluator<'a> {
    /// Build an evaluator, rejecting invalid schemas and unresolvable
    /// comparator names up front.
    pub fn new(
        schema: Arc<RecordSchema>,
        registry: &'a ComparatorRegistry,
    ) -> Result<Self, EngineError> {
        schema.validate()?;
        validate_comparators(&schema, registry)?;
        Ok(Self {
            schema,
            registry,
            cancel: None,
        })
    }

    /// Attach a cooperative cancellation token, checked between top-level
    /// fields and before each record-list matrix entry.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Compare a ground-truth/prediction pair in a single traversal.
    ///
    /// Both values must be records; anything else is a precondition
    /// failure. Data-level disagreements below the root never error.
    pub fn compare(
        &self,
        gt: &Value,
        pred: &Value,
        opts: &CompareOptions,
    ) -> Result<ComparisonReport, EngineError> {
        let gt_fields = gt.as_record().ok_or_else(|| {
            EngineError::TypeMismatch(format!(
                "ground truth must be a record, got {}",
                gt.type_name()
            ))
        })?;
        let pred_fields = pred.as_record().ok_or_else(|| {
            EngineError::TypeMismatch(format!(
                "prediction must be a record, got {}",
                pred.type_name()
            ))
        })?;

        let ctx = TraversalCtx {
            registry: self.registry,
            cancel: self.cancel.as_ref(),
        };
        let mut root = compare_record(&self.schema, gt_fields, pred_fields, &ctx)?;
        rollup_root(&mut root, &self.schema);
        if opts.add_derived_metrics {
            attach_derived(&mut root, opts.recall_with_fd);
        }

        let overall_score = root.overall.similarity_score;
        let all_fields_matched = root.overall.all_fields_matched;

        if opts.evaluator_format {
            return Ok(ComparisonReport {
                overall_score,
                all_fields_matched,
                confusion_matrix: None,
                non_matches: None,
                evaluator: Some(evaluator_summary(&root, opts.recall_with_fd)),
            });
        }

        let non_matches = opts
            .document_non_matches
            .then(|| std::mem::take(&mut root.non_matches));
        let confusion_matrix = opts.include_confusion_matrix.then_some(root);

        Ok(ComparisonReport {
            overall_score,
            all_fields_matched,
            confusion_matrix,
            non_matches,
            evaluator: None,
        })
    }
}

fn validate_comparators(
    schema: &RecordSchema,
    registry: &ComparatorRegistry,
) -> Result<(), EngineError> {
    for field in &schema.fields {
        if let Some(name) = field.resolved_comparator() {
            if !registry.contains(name) {
                return Err(EngineError::UnknownComparator(name.to_string()));
            }
        }
        match field.declared.base() {
            DeclaredType::Record(nested) | DeclaredType::RecordList(nested) => {
                validate_comparators(nested, registry)?;
            }
            _ => {}
        }
    }
    Ok(())
}
