use thiserror::Error;

/// Errors that can occur while building or validating a record schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid schema configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported declared type '{kind}' at '{path}'")]
    UnsupportedType { path: String, kind: String },
    #[error("unresolvable schema reference '{reference}' at '{path}'")]
    UnknownReference { path: String, reference: String },
    #[error("schema root must be a JSON object with 'properties'")]
    NotAnObject,
    #[error("duplicate field '{0}' in record schema")]
    DuplicateField(String),
    #[error("document for schema '{schema}' must be a JSON object, got {kind}")]
    NotARecord { schema: String, kind: String },
}
