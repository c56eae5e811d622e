//! Typed values for records under comparison.
//!
//! [`Value`] is the runtime representation of ground-truth and prediction
//! data. It mirrors JSON with one important semantic addition: the engine
//! treats null, the empty string, the empty list, and the empty record as
//! the *same* absent state ([`Value::is_null_equivalent`]). Classification
//! never distinguishes between them.
//!
//! # Examples
//!
//! ```rust
//! use schema::Value;
//!
//! let v = Value::from_json(&serde_json::json!({"name": "Ada", "tags": []}));
//! let record = v.as_record().unwrap();
//! assert!(record["tags"].is_null_equivalent());
//! assert!(!record["name"].is_null_equivalent());
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Maximum rendered length used when a value is stringified for reporting.
const DISPLAY_TRUNCATE_CHARS: usize = 120;

/// A runtime value bound to a record schema during comparison.
///
/// The engine never mutates values; they are read-only inputs. Conversion
/// from and to [`serde_json::Value`] is lossless except that JSON numbers
/// become [`Value::Int`] when they fit in `i64` and [`Value::Float`]
/// otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// True when this value is semantically absent: null, `""`, `[]`, `{}`.
    ///
    /// The engine relies on this equivalence for every TN/FA/FN decision.
    pub fn is_null_equivalent(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Record(fields) => fields.is_empty(),
            _ => false,
        }
    }

    /// Short name of the runtime type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Str(_) => "string",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Convert a `serde_json::Value` into a typed [`Value`].
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render this value back as a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Compact display form for non-match reporting, truncated so a single
    /// pathological value cannot dominate a report.
    pub fn display_truncated(&self) -> String {
        let rendered = match self {
            Value::Str(s) => s.clone(),
            other => other.to_json().to_string(),
        };
        if rendered.chars().count() <= DISPLAY_TRUNCATE_CHARS {
            rendered
        } else {
            let mut out: String = rendered.chars().take(DISPLAY_TRUNCATE_CHARS).collect();
            out.push('…');
            out
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_equivalence_covers_all_empty_shapes() {
        assert!(Value::Null.is_null_equivalent());
        assert!(Value::Str(String::new()).is_null_equivalent());
        assert!(Value::List(Vec::new()).is_null_equivalent());
        assert!(Value::Record(BTreeMap::new()).is_null_equivalent());

        assert!(!Value::Str("x".into()).is_null_equivalent());
        assert!(!Value::Int(0).is_null_equivalent());
        assert!(!Value::Float(0.0).is_null_equivalent());
        assert!(!Value::Bool(false).is_null_equivalent());
        assert!(!Value::List(vec![Value::Null]).is_null_equivalent());
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let json = serde_json::json!({
            "name": "Widget",
            "price": 29.99,
            "qty": 3,
            "tags": ["a", "b"],
            "meta": {"origin": "scan"},
            "missing": null,
        });
        let value = Value::from_json(&json);
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn integral_json_numbers_become_ints() {
        let value = Value::from_json(&serde_json::json!(42));
        assert_eq!(value, Value::Int(42));
        let value = Value::from_json(&serde_json::json!(42.5));
        assert_eq!(value, Value::Float(42.5));
    }

    #[test]
    fn display_truncates_long_values() {
        let long = "x".repeat(500);
        let shown = Value::Str(long).display_truncated();
        assert!(shown.chars().count() <= DISPLAY_TRUNCATE_CHARS + 1);
        assert!(shown.ends_with('…'));
    }
}
