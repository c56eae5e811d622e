//! Record schema model.
//!
//! A [`RecordSchema`] is a named record type with ordered field
//! descriptors. Nested record schemas are shared via [`Arc`], which keeps
//! the schema tree cheap to clone and free of lifetime questions: callers
//! hold schemas by shared ownership and the engine borrows them for the
//! duration of a comparison.
//!
//! # Declared types
//!
//! ```text
//! DeclaredType
//! ├── Primitive(Str | Int | Float | Bool)
//! ├── Record(Arc<RecordSchema>)          # nested record
//! ├── PrimitiveList(PrimitiveType)       # order-irrelevant list of primitives
//! ├── RecordList(Arc<RecordSchema>)      # list of records, assignment-matched
//! └── Optional(DeclaredType)             # nullability wrapper
//! ```
//!
//! # Example
//!
//! ```rust
//! use schema::{DeclaredType, FieldConfig, FieldSchema, PrimitiveType, RecordSchema};
//!
//! let schema = RecordSchema::new("Contact")
//!     .with_field(FieldSchema::new(
//!         "name",
//!         DeclaredType::Primitive(PrimitiveType::Str),
//!         FieldConfig::default(),
//!     ))
//!     .with_field(FieldSchema::new(
//!         "phone",
//!         DeclaredType::Primitive(PrimitiveType::Str),
//!         FieldConfig { weight: 2.0, ..FieldConfig::default() },
//!     ));
//! assert!(schema.validate().is_ok());
//! assert_eq!(schema.field("phone").unwrap().config.weight, 2.0);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::FieldConfig;
use crate::error::SchemaError;
use crate::value::Value;

/// The four primitive kinds a field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Str,
    Int,
    Float,
    Bool,
}

impl PrimitiveType {
    /// Registry name of the default comparator for this primitive kind.
    pub fn default_comparator(&self) -> &'static str {
        match self {
            PrimitiveType::Str => "levenshtein",
            PrimitiveType::Int | PrimitiveType::Float => "numeric",
            PrimitiveType::Bool => "exact",
        }
    }

    /// Default classification threshold (booleans require exact matches).
    pub fn default_threshold(&self) -> f64 {
        match self {
            PrimitiveType::Bool => FieldConfig::default_boolean_threshold(),
            _ => FieldConfig::default_threshold(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Str => "string",
            PrimitiveType::Int => "integer",
            PrimitiveType::Float => "number",
            PrimitiveType::Bool => "boolean",
        }
    }
}

/// Declared type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    Primitive(PrimitiveType),
    Record(Arc<RecordSchema>),
    PrimitiveList(PrimitiveType),
    RecordList(Arc<RecordSchema>),
    Optional(Box<DeclaredType>),
}

impl DeclaredType {
    /// Strip `Optional` wrappers; the engine treats nullability uniformly.
    pub fn base(&self) -> &DeclaredType {
        match self {
            DeclaredType::Optional(inner) => inner.base(),
            other => other,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self.base(),
            DeclaredType::PrimitiveList(_) | DeclaredType::RecordList(_)
        )
    }

    pub fn describe(&self) -> String {
        match self {
            DeclaredType::Primitive(p) => p.name().to_string(),
            DeclaredType::Record(schema) => format!("record<{}>", schema.name),
            DeclaredType::PrimitiveList(p) => format!("list<{}>", p.name()),
            DeclaredType::RecordList(schema) => format!("list<record<{}>>", schema.name),
            DeclaredType::Optional(inner) => format!("optional<{}>", inner.describe()),
        }
    }
}

/// One field of a record schema: name, declared type, comparison config.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub declared: DeclaredType,
    pub config: FieldConfig,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, declared: DeclaredType, config: FieldConfig) -> Self {
        Self {
            name: name.into(),
            declared,
            config,
        }
    }

    /// Name of the comparator this field resolves to, if the field kind
    /// uses one. Record and record-list fields compare structurally and
    /// return `None`.
    pub fn resolved_comparator(&self) -> Option<&str> {
        if let Some(name) = self.config.comparator.as_deref() {
            return Some(name);
        }
        match self.declared.base() {
            DeclaredType::Primitive(p) | DeclaredType::PrimitiveList(p) => {
                Some(p.default_comparator())
            }
            DeclaredType::Record(_) | DeclaredType::RecordList(_) => None,
            DeclaredType::Optional(_) => None,
        }
    }
}

/// A named record type with ordered field descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    /// Record type name, used in errors and reports.
    pub name: String,
    /// Pairing cutoff for lists of this record type: an assignment pair
    /// whose recursive similarity clears this value is recursed into,
    /// anything below is an atomic false discovery.
    pub match_threshold: f64,
    /// Declared fields, in order. Result trees preserve this order.
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    /// Default pairing cutoff for record lists.
    pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            match_threshold: Self::DEFAULT_MATCH_THRESHOLD,
            fields: Vec::new(),
        }
    }

    pub fn with_match_threshold(mut self, match_threshold: f64) -> Self {
        self.match_threshold = match_threshold;
        self
    }

    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate the schema tree: name present, thresholds in range,
    /// weights positive, field names unique. Nested record schemas are
    /// validated recursively.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::InvalidConfig(
                "record schema requires a non-empty name".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(SchemaError::InvalidConfig(format!(
                "match_threshold must be within [0.0, 1.0], got {}",
                self.match_threshold
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SchemaError::InvalidConfig(format!(
                    "record schema '{}' has a field with an empty name",
                    self.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            field.config.validate()?;
            match field.declared.base() {
                DeclaredType::Record(nested) | DeclaredType::RecordList(nested) => {
                    nested.validate()?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Bind a JSON object to this schema, producing a [`Value::Record`].
    ///
    /// Missing declared fields become `Value::Null`. Declared-integer
    /// fields accept integral JSON floats. Extra keys are preserved in the
    /// record value; the engine ignores them.
    pub fn record_from_json(&self, json: &serde_json::Value) -> Result<Value, SchemaError> {
        let object = json.as_object().ok_or_else(|| SchemaError::NotARecord {
            schema: self.name.clone(),
            kind: json_kind(json),
        })?;

        let mut bound = BTreeMap::new();
        for field in &self.fields {
            let raw = object.get(&field.name).unwrap_or(&serde_json::Value::Null);
            bound.insert(field.name.clone(), self.bind_value(&field.declared, raw)?);
        }
        for (key, raw) in object {
            if self.field(key).is_none() {
                bound.insert(key.clone(), Value::from_json(raw));
            }
        }
        Ok(Value::Record(bound))
    }

    fn bind_value(
        &self,
        declared: &DeclaredType,
        raw: &serde_json::Value,
    ) -> Result<Value, SchemaError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        match declared.base() {
            DeclaredType::Primitive(p) => Ok(bind_primitive(*p, raw)),
            DeclaredType::Record(nested) => match raw {
                serde_json::Value::Object(_) => nested.record_from_json(raw),
                other => Ok(Value::from_json(other)),
            },
            DeclaredType::PrimitiveList(p) => match raw {
                serde_json::Value::Array(items) => Ok(Value::List(
                    items.iter().map(|item| bind_primitive(*p, item)).collect(),
                )),
                other => Ok(Value::from_json(other)),
            },
            DeclaredType::RecordList(nested) => match raw {
                serde_json::Value::Array(items) => {
                    let mut bound = Vec::with_capacity(items.len());
                    for item in items {
                        bound.push(match item {
                            serde_json::Value::Object(_) => nested.record_from_json(item)?,
                            other => Value::from_json(other),
                        });
                    }
                    Ok(Value::List(bound))
                }
                other => Ok(Value::from_json(other)),
            },
            DeclaredType::Optional(_) => unreachable!("base() strips Optional"),
        }
    }
}

fn bind_primitive(kind: PrimitiveType, raw: &serde_json::Value) -> Value {
    match (kind, raw) {
        // Integral floats conform to a declared integer field.
        (PrimitiveType::Int, serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Value::Int(f as i64)
                } else {
                    Value::Float(f)
                }
            } else {
                Value::Null
            }
        }
        (PrimitiveType::Float, serde_json::Value::Number(n)) => {
            Value::Float(n.as_f64().unwrap_or(f64::NAN))
        }
        _ => Value::from_json(raw),
    }
}

fn json_kind(json: &serde_json::Value) -> String {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_schema() -> RecordSchema {
        RecordSchema::new("Contact")
            .with_field(FieldSchema::new(
                "name",
                DeclaredType::Primitive(PrimitiveType::Str),
                FieldConfig::default(),
            ))
            .with_field(FieldSchema::new(
                "age",
                DeclaredType::Primitive(PrimitiveType::Int),
                FieldConfig::default(),
            ))
    }

    #[test]
    fn valid_schema_passes_validation() {
        assert!(contact_schema().validate().is_ok());
    }

    #[test]
    fn duplicate_field_names_rejected() {
        let schema = contact_schema().with_field(FieldSchema::new(
            "name",
            DeclaredType::Primitive(PrimitiveType::Str),
            FieldConfig::default(),
        ));
        assert_eq!(
            schema.validate(),
            Err(SchemaError::DuplicateField("name".into()))
        );
    }

    #[test]
    fn nested_schema_validated_recursively() {
        let bad_nested = Arc::new(RecordSchema::new("Inner").with_field(FieldSchema::new(
            "x",
            DeclaredType::Primitive(PrimitiveType::Str),
            FieldConfig {
                threshold: 2.0,
                ..FieldConfig::default()
            },
        )));
        let schema = RecordSchema::new("Outer").with_field(FieldSchema::new(
            "inner",
            DeclaredType::Record(bad_nested),
            FieldConfig::default(),
        ));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn default_comparators_resolve_by_type() {
        let string_field = FieldSchema::new(
            "s",
            DeclaredType::Primitive(PrimitiveType::Str),
            FieldConfig::default(),
        );
        assert_eq!(string_field.resolved_comparator(), Some("levenshtein"));

        let bool_field = FieldSchema::new(
            "b",
            DeclaredType::Primitive(PrimitiveType::Bool),
            FieldConfig::for_boolean(),
        );
        assert_eq!(bool_field.resolved_comparator(), Some("exact"));

        let explicit = FieldSchema::new(
            "n",
            DeclaredType::Primitive(PrimitiveType::Float),
            FieldConfig {
                comparator: Some("my_numeric".into()),
                ..FieldConfig::default()
            },
        );
        assert_eq!(explicit.resolved_comparator(), Some("my_numeric"));
    }

    #[test]
    fn record_from_json_binds_missing_fields_to_null() {
        let schema = contact_schema();
        let record = schema
            .record_from_json(&serde_json::json!({"name": "Ada"}))
            .expect("binds");
        let fields = record.as_record().expect("record value");
        assert_eq!(fields["name"], Value::Str("Ada".into()));
        assert_eq!(fields["age"], Value::Null);
    }

    #[test]
    fn record_from_json_accepts_integral_floats_for_ints() {
        let schema = contact_schema();
        let record = schema
            .record_from_json(&serde_json::json!({"name": "Ada", "age": 30.0}))
            .expect("binds");
        assert_eq!(record.as_record().unwrap()["age"], Value::Int(30));
    }

    #[test]
    fn record_from_json_rejects_non_objects() {
        let schema = contact_schema();
        let err = schema
            .record_from_json(&serde_json::json!([1, 2, 3]))
            .expect_err("arrays are not records");
        assert!(matches!(err, SchemaError::NotARecord { .. }));
    }

    #[test]
    fn record_from_json_preserves_extra_keys() {
        let schema = contact_schema();
        let record = schema
            .record_from_json(&serde_json::json!({"name": "Ada", "nickname": "A"}))
            .expect("binds");
        assert!(record.as_record().unwrap().contains_key("nickname"));
    }
}
