use schema::Value;

use crate::error::ComparatorError;
use crate::{null_short_circuit, Comparator};

/// Exact-match comparison: 1.0 for equal values, 0.0 otherwise.
///
/// Numbers compare numerically (`1` equals `1.0`); everything else
/// compares on its canonical display form, so `Value::Int(5)` and
/// `Value::Str("5")` are considered equal. This is the default comparator
/// for boolean fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactComparator;

impl ExactComparator {
    pub fn new() -> Self {
        Self
    }
}

impl Comparator for ExactComparator {
    fn compare(&self, gt: &Value, pred: &Value) -> Result<f64, ComparatorError> {
        if let Some(score) = null_short_circuit(gt, pred) {
            return Ok(score);
        }
        if let (Some(a), Some(b)) = (as_number(gt), as_number(pred)) {
            return Ok(if a == b { 1.0 } else { 0.0 });
        }
        Ok(if gt.to_string() == pred.to_string() {
            1.0
        } else {
            0.0
        })
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}
