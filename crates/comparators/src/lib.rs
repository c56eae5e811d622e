//! Similarity functions for structured-output evaluation.
//!
//! A comparator scores a ground-truth/prediction value pair in `[0, 1]`
//! (1.0 ≡ identical, 0.0 ≡ wholly dissimilar). Comparators are looked up
//! by name through a [`ComparatorRegistry`] owned by the caller; the
//! engine never hard-codes a similarity function.
//!
//! Built-ins:
//!
//! - [`ExactComparator`] (`"exact"`) — equality on canonical forms;
//!   default for booleans
//! - [`LevenshteinComparator`] (`"levenshtein"`) — edit-distance
//!   similarity; default for strings
//! - [`NumericComparator`] (`"numeric"`) — tolerance-gated numeric
//!   equality with lenient parsing; default for integers and numbers
//!
//! Expensive external comparators (embedding, LLM) are deliberately not
//! part of this crate; implement [`Comparator`] and register the instance
//! under a name your schema references.
//!
//! # Scoring contract
//!
//! - Both inputs null-equivalent → 1.0; exactly one null-equivalent → 0.0.
//! - Unparseable or cross-typed input → 0.0, not an error.
//! - Errors are reserved for misconfiguration; the engine degrades them to
//!   a 0.0 score and a false discovery.

mod error;
mod exact;
mod levenshtein;
mod numeric;
mod registry;

use schema::Value;

pub use crate::error::ComparatorError;
pub use crate::exact::ExactComparator;
pub use crate::levenshtein::{levenshtein_similarity, LevenshteinComparator};
pub use crate::numeric::NumericComparator;
pub use crate::registry::{ComparatorRegistry, EXACT, LEVENSHTEIN, NUMERIC};

/// A similarity function over value pairs.
///
/// Implementations must be thread-safe: the engine may evaluate record-list
/// similarity matrices in parallel.
pub trait Comparator: Send + Sync {
    /// Score the pair in `[0, 1]`. The engine clamps out-of-range results
    /// defensively at its boundary.
    fn compare(&self, gt: &Value, pred: &Value) -> Result<f64, ComparatorError>;
}

/// Shared null handling: both null-equivalent → `Some(1.0)`, exactly one →
/// `Some(0.0)`, neither → `None` (comparator-specific scoring applies).
pub fn null_short_circuit(gt: &Value, pred: &Value) -> Option<f64> {
    match (gt.is_null_equivalent(), pred.is_null_equivalent()) {
        (true, true) => Some(1.0),
        (true, false) | (false, true) => Some(0.0),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_short_circuit_table() {
        let empty = Value::Str(String::new());
        let full = Value::Str("x".into());
        assert_eq!(null_short_circuit(&Value::Null, &empty), Some(1.0));
        assert_eq!(null_short_circuit(&Value::Null, &full), Some(0.0));
        assert_eq!(null_short_circuit(&full, &Value::Null), Some(0.0));
        assert_eq!(null_short_circuit(&full, &full), None);
    }
}
