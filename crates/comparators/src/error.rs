use thiserror::Error;

/// Errors produced by similarity functions.
///
/// Comparators prefer returning 0.0 over failing: unparseable or
/// cross-typed input scores as wholly dissimilar. An error is reserved for
/// conditions the caller should know about (bad comparator configuration);
/// the engine degrades any comparator error to a 0.0 score and a false
/// discovery rather than aborting the traversal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComparatorError {
    #[error("invalid comparator configuration: {0}")]
    InvalidConfig(String),
    #[error("comparator cannot score value: {0}")]
    Unsupported(String),
}
