//! JSON Schema ingestion.
//!
//! Record schemas are exchanged as JSON-Schema-like object envelopes with a
//! namespaced vendor-extension convention for comparison metadata:
//!
//! | Key | Type | Default | Meaning |
//! |---|---|---|---|
//! | `x-comparator` | string | by type | Registry name of the similarity function |
//! | `x-threshold` | number in `[0,1]` | 0.5 (bool: 1.0) | Classification cutoff |
//! | `x-weight` | number > 0 | 1.0 | Contribution to parent score |
//! | `x-clip-under-threshold` | bool | false | Zero the applied score when below cutoff |
//! | `x-aggregate` | bool | true | Participate in the root aggregate rollup |
//! | `x-match-threshold` | number in `[0,1]` | 0.7 | Pairing cutoff for record lists of this type |
//!
//! Supported envelope features: `type: "object"` with `properties`, nested
//! objects, arrays of primitives and objects, `required` (parsed, not
//! enforced — a missing value is a classification outcome, not an error),
//! `title` for record type names, nullable unions (`"type": ["string",
//! "null"]`), and `$ref` into `#/$defs/...` or `#/definitions/...`.
//!
//! # Example
//!
//! ```rust
//! let schema = schema::record_schema_from_json(&serde_json::json!({
//!     "type": "object",
//!     "title": "Product",
//!     "x-match-threshold": 0.8,
//!     "properties": {
//!         "name": {"type": "string", "x-threshold": 0.7, "x-weight": 2.0},
//!         "price": {"type": "number", "x-comparator": "numeric"},
//!     },
//! })).unwrap();
//! assert_eq!(schema.name, "Product");
//! assert_eq!(schema.match_threshold, 0.8);
//! assert_eq!(schema.fields.len(), 2);
//! ```

use std::sync::Arc;

use tracing::{debug, span, warn, Level};

use crate::config::FieldConfig;
use crate::error::SchemaError;
use crate::model::{DeclaredType, FieldSchema, PrimitiveType, RecordSchema};

/// Default record type name when the envelope carries no `title`.
const DEFAULT_MODEL_NAME: &str = "Document";

/// Vendor-extension keys recognized on fields and record envelopes.
const KNOWN_EXTENSIONS: &[&str] = &[
    "x-comparator",
    "x-threshold",
    "x-weight",
    "x-clip-under-threshold",
    "x-aggregate",
    "x-match-threshold",
];

/// Parse a JSON-Schema-like object envelope into a validated [`RecordSchema`].
///
/// Unknown declared types, malformed extension values, out-of-range
/// thresholds or weights, and dangling `$ref`s are rejected with a
/// [`SchemaError`] naming the offending field path.
pub fn record_schema_from_json(schema: &serde_json::Value) -> Result<Arc<RecordSchema>, SchemaError> {
    let root = schema.as_object().ok_or(SchemaError::NotAnObject)?;
    let name = root
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_MODEL_NAME);

    let load_span = span!(Level::DEBUG, "schema_load", schema = %name);
    let _guard = load_span.enter();

    let parser = Parser { root };
    let record = parser.parse_record(root, name, "")?;
    record.validate()?;
    debug!(
        schema = %record.name,
        fields = record.fields.len(),
        match_threshold = record.match_threshold,
        "record schema loaded"
    );
    Ok(Arc::new(record))
}

struct Parser<'a> {
    root: &'a serde_json::Map<String, serde_json::Value>,
}

impl<'a> Parser<'a> {
    fn parse_record(
        &self,
        object: &'a serde_json::Map<String, serde_json::Value>,
        name: &str,
        path: &str,
    ) -> Result<RecordSchema, SchemaError> {
        let properties = object
            .get("properties")
            .and_then(|v| v.as_object())
            .ok_or(SchemaError::NotAnObject)?;

        let match_threshold = match object.get("x-match-threshold") {
            Some(v) => parse_unit_interval(v, path, "x-match-threshold")?,
            None => RecordSchema::DEFAULT_MATCH_THRESHOLD,
        };

        let mut record = RecordSchema::new(name).with_match_threshold(match_threshold);
        for (field_name, field_schema) in properties {
            let field_path = join_path(path, field_name);
            let field_object = field_schema
                .as_object()
                .ok_or_else(|| SchemaError::UnsupportedType {
                    path: field_path.clone(),
                    kind: "non-object field schema".into(),
                })?;
            let resolved = self.resolve_ref(field_object, &field_path)?;
            let declared = self.parse_type(resolved, field_name, &field_path)?;
            let config = parse_field_config(resolved, &declared, &field_path)?;
            warn_unknown_extensions(resolved, &field_path);
            record = record.with_field(FieldSchema::new(field_name.clone(), declared, config));
        }
        Ok(record)
    }

    /// Follow a `$ref` into `#/$defs/...` or `#/definitions/...`.
    fn resolve_ref(
        &self,
        object: &'a serde_json::Map<String, serde_json::Value>,
        path: &str,
    ) -> Result<&'a serde_json::Map<String, serde_json::Value>, SchemaError> {
        let Some(reference) = object.get("$ref").and_then(|v| v.as_str()) else {
            return Ok(object);
        };
        let target = reference
            .strip_prefix("#/$defs/")
            .or_else(|| reference.strip_prefix("#/definitions/"))
            .and_then(|key| {
                self.root
                    .get("$defs")
                    .or_else(|| self.root.get("definitions"))
                    .and_then(|defs| defs.get(key))
            })
            .and_then(|v| v.as_object());
        target.ok_or_else(|| SchemaError::UnknownReference {
            path: path.to_string(),
            reference: reference.to_string(),
        })
    }

    fn parse_type(
        &self,
        object: &'a serde_json::Map<String, serde_json::Value>,
        field_name: &str,
        path: &str,
    ) -> Result<DeclaredType, SchemaError> {
        let (type_name, nullable) = declared_type_name(object, path)?;
        let declared = match type_name.as_str() {
            "string" => DeclaredType::Primitive(PrimitiveType::Str),
            "integer" => DeclaredType::Primitive(PrimitiveType::Int),
            "number" => DeclaredType::Primitive(PrimitiveType::Float),
            "boolean" => DeclaredType::Primitive(PrimitiveType::Bool),
            "object" => {
                let nested_name = object
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or(field_name);
                let nested = self.parse_record(object, nested_name, path)?;
                DeclaredType::Record(Arc::new(nested))
            }
            "array" => {
                let items = object
                    .get("items")
                    .and_then(|v| v.as_object())
                    .ok_or_else(|| SchemaError::UnsupportedType {
                        path: path.to_string(),
                        kind: "array without 'items'".into(),
                    })?;
                let items = self.resolve_ref(items, path)?;
                let (item_type, _) = declared_type_name(items, path)?;
                match item_type.as_str() {
                    "string" => DeclaredType::PrimitiveList(PrimitiveType::Str),
                    "integer" => DeclaredType::PrimitiveList(PrimitiveType::Int),
                    "number" => DeclaredType::PrimitiveList(PrimitiveType::Float),
                    "boolean" => DeclaredType::PrimitiveList(PrimitiveType::Bool),
                    "object" => {
                        let nested_name = items
                            .get("title")
                            .and_then(|v| v.as_str())
                            .unwrap_or(field_name);
                        let nested = self.parse_record(items, nested_name, path)?;
                        DeclaredType::RecordList(Arc::new(nested))
                    }
                    other => {
                        return Err(SchemaError::UnsupportedType {
                            path: path.to_string(),
                            kind: format!("array<{other}>"),
                        })
                    }
                }
            }
            other => {
                return Err(SchemaError::UnsupportedType {
                    path: path.to_string(),
                    kind: other.to_string(),
                })
            }
        };
        Ok(if nullable {
            DeclaredType::Optional(Box::new(declared))
        } else {
            declared
        })
    }
}

/// Extract the declared type name, accepting `"type": "string"` and the
/// nullable union form `"type": ["string", "null"]`.
fn declared_type_name(
    object: &serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Result<(String, bool), SchemaError> {
    match object.get("type") {
        Some(serde_json::Value::String(s)) => Ok((s.clone(), false)),
        Some(serde_json::Value::Array(variants)) => {
            let mut name = None;
            let mut nullable = false;
            for variant in variants {
                match variant.as_str() {
                    Some("null") => nullable = true,
                    Some(other) if name.is_none() => name = Some(other.to_string()),
                    _ => {
                        return Err(SchemaError::UnsupportedType {
                            path: path.to_string(),
                            kind: format!("type union {variants:?}"),
                        })
                    }
                }
            }
            match name {
                Some(name) => Ok((name, nullable)),
                None => Err(SchemaError::UnsupportedType {
                    path: path.to_string(),
                    kind: "type union with only 'null'".into(),
                }),
            }
        }
        // Objects are allowed to omit "type" when "properties" is present.
        None if object.contains_key("properties") => Ok(("object".into(), false)),
        _ => Err(SchemaError::UnsupportedType {
            path: path.to_string(),
            kind: "missing 'type'".into(),
        }),
    }
}

fn parse_field_config(
    object: &serde_json::Map<String, serde_json::Value>,
    declared: &DeclaredType,
    path: &str,
) -> Result<FieldConfig, SchemaError> {
    let default_threshold = match declared.base() {
        DeclaredType::Primitive(p) | DeclaredType::PrimitiveList(p) => p.default_threshold(),
        _ => FieldConfig::default_threshold(),
    };

    let comparator = match object.get("x-comparator") {
        Some(serde_json::Value::String(name)) => Some(name.clone()),
        Some(other) => {
            return Err(SchemaError::InvalidConfig(format!(
                "'{path}': x-comparator must be a string, got {other}"
            )))
        }
        None => None,
    };
    let threshold = match object.get("x-threshold") {
        Some(v) => parse_unit_interval(v, path, "x-threshold")?,
        None => default_threshold,
    };
    let weight = match object.get("x-weight") {
        Some(v) => v.as_f64().ok_or_else(|| {
            SchemaError::InvalidConfig(format!("'{path}': x-weight must be a number, got {v}"))
        })?,
        None => FieldConfig::default_weight(),
    };
    let clip_under_threshold = match object.get("x-clip-under-threshold") {
        Some(v) => v.as_bool().ok_or_else(|| {
            SchemaError::InvalidConfig(format!(
                "'{path}': x-clip-under-threshold must be a boolean, got {v}"
            ))
        })?,
        None => false,
    };
    let include_in_aggregate = match object.get("x-aggregate") {
        Some(v) => v.as_bool().ok_or_else(|| {
            SchemaError::InvalidConfig(format!(
                "'{path}': x-aggregate must be a boolean, got {v}"
            ))
        })?,
        None => FieldConfig::default_include_in_aggregate(),
    };

    let config = FieldConfig {
        comparator,
        threshold,
        weight,
        clip_under_threshold,
        include_in_aggregate,
    };
    config
        .validate()
        .map_err(|err| SchemaError::InvalidConfig(format!("'{path}': {err}")))?;
    Ok(config)
}

fn parse_unit_interval(
    value: &serde_json::Value,
    path: &str,
    key: &str,
) -> Result<f64, SchemaError> {
    let number = value.as_f64().ok_or_else(|| {
        SchemaError::InvalidConfig(format!("'{path}': {key} must be a number, got {value}"))
    })?;
    if !(0.0..=1.0).contains(&number) {
        return Err(SchemaError::InvalidConfig(format!(
            "'{path}': {key} must be within [0.0, 1.0], got {number}"
        )));
    }
    Ok(number)
}

fn warn_unknown_extensions(object: &serde_json::Map<String, serde_json::Value>, path: &str) {
    for key in object.keys() {
        if key.starts_with("x-") && !KNOWN_EXTENSIONS.contains(&key.as_str()) {
            warn!(field = %path, extension = %key, "ignoring unrecognized vendor extension");
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}.{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_object_schema() {
        let schema = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "title": "Person",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"},
                "active": {"type": "boolean"},
            },
        }))
        .expect("valid schema");

        assert_eq!(schema.name, "Person");
        assert_eq!(schema.fields.len(), 3);
        assert_eq!(
            schema.field("name").unwrap().declared,
            DeclaredType::Primitive(PrimitiveType::Str)
        );
        // Booleans default to an exact-match cutoff.
        assert_eq!(schema.field("active").unwrap().config.threshold, 1.0);
        assert_eq!(schema.field("age").unwrap().config.threshold, 0.5);
    }

    #[test]
    fn field_order_follows_declaration_order() {
        let schema = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "properties": {
                "zeta": {"type": "string"},
                "alpha": {"type": "string"},
                "mid": {"type": "string"},
            },
        }))
        .expect("valid schema");
        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn vendor_extensions_are_applied() {
        let schema = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "title": "Product",
            "x-match-threshold": 0.8,
            "properties": {
                "name": {
                    "type": "string",
                    "x-comparator": "levenshtein",
                    "x-threshold": 0.9,
                    "x-weight": 2.5,
                    "x-clip-under-threshold": true,
                    "x-aggregate": false,
                },
            },
        }))
        .expect("valid schema");

        assert_eq!(schema.match_threshold, 0.8);
        let field = schema.field("name").unwrap();
        assert_eq!(field.config.comparator.as_deref(), Some("levenshtein"));
        assert_eq!(field.config.threshold, 0.9);
        assert_eq!(field.config.weight, 2.5);
        assert!(field.config.clip_under_threshold);
        assert!(!field.config.include_in_aggregate);
    }

    #[test]
    fn nested_objects_and_arrays_parse() {
        let schema = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "title": "Invoice",
            "properties": {
                "vendor": {
                    "type": "object",
                    "title": "Vendor",
                    "properties": {"name": {"type": "string"}},
                },
                "tags": {"type": "array", "items": {"type": "string"}},
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "title": "LineItem",
                        "x-match-threshold": 0.6,
                        "properties": {"sku": {"type": "string"}},
                    },
                },
            },
        }))
        .expect("valid schema");

        match &schema.field("vendor").unwrap().declared {
            DeclaredType::Record(nested) => assert_eq!(nested.name, "Vendor"),
            other => panic!("expected nested record, got {other:?}"),
        }
        assert_eq!(
            schema.field("tags").unwrap().declared,
            DeclaredType::PrimitiveList(PrimitiveType::Str)
        );
        match &schema.field("items").unwrap().declared {
            DeclaredType::RecordList(nested) => {
                assert_eq!(nested.name, "LineItem");
                assert_eq!(nested.match_threshold, 0.6);
            }
            other => panic!("expected record list, got {other:?}"),
        }
    }

    #[test]
    fn refs_resolve_into_defs() {
        let schema = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "properties": {
                "shipping": {"$ref": "#/$defs/Address"},
                "billing": {"$ref": "#/$defs/Address"},
            },
            "$defs": {
                "Address": {
                    "type": "object",
                    "title": "Address",
                    "properties": {"city": {"type": "string"}},
                },
            },
        }))
        .expect("valid schema");

        for field in ["shipping", "billing"] {
            match &schema.field(field).unwrap().declared {
                DeclaredType::Record(nested) => assert_eq!(nested.name, "Address"),
                other => panic!("expected record, got {other:?}"),
            }
        }
    }

    #[test]
    fn dangling_ref_rejected() {
        let err = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "properties": {"a": {"$ref": "#/$defs/Missing"}},
        }))
        .expect_err("dangling ref");
        assert!(matches!(err, SchemaError::UnknownReference { .. }));
    }

    #[test]
    fn unknown_type_rejected() {
        let err = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "properties": {"blob": {"type": "binary"}},
        }))
        .expect_err("unknown type");
        assert!(matches!(err, SchemaError::UnsupportedType { kind, .. } if kind == "binary"));
    }

    #[test]
    fn out_of_range_extension_rejected() {
        let err = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "properties": {"a": {"type": "string", "x-threshold": 1.5}},
        }))
        .expect_err("bad threshold");
        assert!(matches!(err, SchemaError::InvalidConfig(_)));
    }

    #[test]
    fn nullable_union_becomes_optional() {
        let schema = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "properties": {"note": {"type": ["string", "null"]}},
        }))
        .expect("valid schema");
        match &schema.field("note").unwrap().declared {
            DeclaredType::Optional(inner) => {
                assert_eq!(**inner, DeclaredType::Primitive(PrimitiveType::Str));
            }
            other => panic!("expected optional, got {other:?}"),
        }
    }
}
