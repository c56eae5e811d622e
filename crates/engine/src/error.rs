use schema::SchemaError;
use thiserror::Error;

/// Errors produced by the comparison engine.
///
/// These are all precondition failures: nothing is emitted when one
/// occurs. Data-level disagreements (missing values, type-wrong values,
/// below-threshold pairs) are classification outcomes in the result tree,
/// never errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Schema failed validation or could not be loaded.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Inputs violate the engine contract (e.g. a non-record root).
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// The schema references a comparator the registry cannot resolve.
    #[error("unknown comparator '{0}' referenced by schema")]
    UnknownComparator(String),
    /// The comparison was cancelled cooperatively; no partial result is
    /// emitted.
    #[error("comparison cancelled")]
    Cancelled,
}
