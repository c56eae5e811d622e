use schema::Value;
use serde::{Deserialize, Serialize};

use crate::error::ComparatorError;
use crate::{null_short_circuit, Comparator};

/// Tolerance-based numeric comparison: 1.0 within tolerance, 0.0 outside.
///
/// Values are parsed leniently — `"$1,247.50"`, `" 1247.50 "`, `1247.5`
/// and `Value::Int(1247)` are all numeric input. A pair matches when the
/// difference is within the absolute tolerance OR the relative tolerance
/// (relative to the ground-truth magnitude). Both tolerances default to
/// zero, i.e. exact numeric equality. Non-numeric input scores 0.0. This
/// is the default comparator for integer and number fields.
///
/// The engine never interprets the tolerances; they live entirely on the
/// comparator instance registered by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NumericComparator {
    /// Maximum absolute difference that still counts as a match.
    #[serde(default)]
    pub absolute_tolerance: f64,
    /// Maximum difference relative to the ground-truth magnitude.
    #[serde(default)]
    pub relative_tolerance: f64,
}

impl NumericComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_absolute_tolerance(absolute_tolerance: f64) -> Self {
        Self {
            absolute_tolerance,
            ..Self::default()
        }
    }

    pub fn with_relative_tolerance(relative_tolerance: f64) -> Self {
        Self {
            relative_tolerance,
            ..Self::default()
        }
    }

    fn within_tolerance(&self, gt: f64, pred: f64) -> bool {
        if gt == pred {
            return true;
        }
        let diff = (gt - pred).abs();
        if diff <= self.absolute_tolerance {
            return true;
        }
        if self.relative_tolerance > 0.0 {
            // Against a zero ground truth the relative bound applies to the
            // prediction magnitude directly.
            if gt == 0.0 {
                return pred.abs() <= self.relative_tolerance;
            }
            return (diff / gt.abs()) <= self.relative_tolerance;
        }
        false
    }
}

impl Default for NumericComparator {
    fn default() -> Self {
        Self {
            absolute_tolerance: 0.0,
            relative_tolerance: 0.0,
        }
    }
}

impl Comparator for NumericComparator {
    fn compare(&self, gt: &Value, pred: &Value) -> Result<f64, ComparatorError> {
        if !self.absolute_tolerance.is_finite() || !self.relative_tolerance.is_finite() {
            return Err(ComparatorError::InvalidConfig(
                "numeric tolerances must be finite".into(),
            ));
        }
        if let Some(score) = null_short_circuit(gt, pred) {
            return Ok(score);
        }
        match (parse_numeric(gt), parse_numeric(pred)) {
            (Some(a), Some(b)) => Ok(if self.within_tolerance(a, b) { 1.0 } else { 0.0 }),
            _ => Ok(0.0),
        }
    }
}

/// Lenient numeric parsing: native numbers pass through, strings are
/// trimmed and stripped of currency signs and thousands separators.
fn parse_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => f.is_finite().then_some(*f),
        Value::Str(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> Value {
        Value::Float(v)
    }

    #[test]
    fn exact_match_scores_one() {
        let cmp = NumericComparator::new();
        assert_eq!(cmp.compare(&num(123.0), &num(123.0)).unwrap(), 1.0);
        assert_eq!(cmp.compare(&Value::Int(456), &Value::Int(456)).unwrap(), 1.0);
    }

    #[test]
    fn formatting_variants_parse() {
        let cmp = NumericComparator::new();
        assert_eq!(
            cmp.compare(&Value::Str("$123".into()), &Value::Int(123))
                .unwrap(),
            1.0
        );
        assert_eq!(
            cmp.compare(&Value::Str("123,456".into()), &Value::Int(123_456))
                .unwrap(),
            1.0
        );
        assert_eq!(
            cmp.compare(&Value::Str("789.0".into()), &Value::Int(789))
                .unwrap(),
            1.0
        );
    }

    #[test]
    fn non_matching_numbers_score_zero() {
        let cmp = NumericComparator::new();
        assert_eq!(cmp.compare(&num(1.23), &num(1.24)).unwrap(), 0.0);
    }

    #[test]
    fn non_numeric_input_scores_zero() {
        let cmp = NumericComparator::new();
        assert_eq!(
            cmp.compare(&Value::Str("abc".into()), &Value::Int(123))
                .unwrap(),
            0.0
        );
        assert_eq!(
            cmp.compare(&Value::Int(30), &Value::Str("thirty".into()))
                .unwrap(),
            0.0
        );
    }

    #[test]
    fn relative_tolerance_bounds_match() {
        let cmp = NumericComparator::with_relative_tolerance(0.1);
        assert_eq!(cmp.compare(&num(100.0), &num(109.0)).unwrap(), 1.0);
        assert_eq!(cmp.compare(&num(100.0), &num(91.0)).unwrap(), 1.0);
        assert_eq!(cmp.compare(&num(100.0), &num(111.0)).unwrap(), 0.0);
        // Zero ground truth bounds the prediction magnitude directly.
        assert_eq!(cmp.compare(&num(0.0), &num(0.05)).unwrap(), 1.0);
        assert_eq!(cmp.compare(&num(0.0), &num(0.5)).unwrap(), 0.0);
    }

    #[test]
    fn absolute_tolerance_bounds_match() {
        let cmp = NumericComparator::with_absolute_tolerance(5.0);
        assert_eq!(cmp.compare(&num(100.0), &num(104.0)).unwrap(), 1.0);
        assert_eq!(cmp.compare(&num(100.0), &num(96.0)).unwrap(), 1.0);
        assert_eq!(cmp.compare(&num(100.0), &num(106.0)).unwrap(), 0.0);
        assert_eq!(cmp.compare(&num(0.0), &num(-4.0)).unwrap(), 1.0);
    }

    #[test]
    fn combined_tolerances_accept_either_bound() {
        let cmp = NumericComparator {
            absolute_tolerance: 5.0,
            relative_tolerance: 0.1,
        };
        assert_eq!(cmp.compare(&num(10.0), &num(14.0)).unwrap(), 1.0);
        assert_eq!(cmp.compare(&num(100.0), &num(109.0)).unwrap(), 1.0);
        assert_eq!(cmp.compare(&num(100.0), &num(116.0)).unwrap(), 0.0);
    }

    #[test]
    fn null_pair_scores_one() {
        let cmp = NumericComparator::new();
        assert_eq!(cmp.compare(&Value::Null, &Value::Null).unwrap(), 1.0);
        assert_eq!(cmp.compare(&Value::Int(123), &Value::Null).unwrap(), 0.0);
    }

    #[test]
    fn non_finite_tolerance_is_a_config_error() {
        let cmp = NumericComparator::with_absolute_tolerance(f64::NAN);
        assert!(cmp.compare(&num(1.0), &num(1.0)).is_err());
    }
}
