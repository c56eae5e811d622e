//! Record schemas and typed values for structured-output evaluation.
//!
//! This crate is the input contract of the evaluation engine. It defines:
//!
//! - **Schemas**: [`RecordSchema`] — a named record type with ordered
//!   [`FieldSchema`] descriptors, each carrying a [`DeclaredType`] and a
//!   [`FieldConfig`] (comparator name, threshold, weight, clip and
//!   aggregate flags). Nested record schemas are shared via `Arc`.
//! - **Values**: [`Value`] — the runtime representation of ground-truth
//!   and prediction records, with the null-equivalence rule (null, `""`,
//!   `[]`, `{}` are the same absent state) the engine's classification
//!   depends on.
//! - **JSON Schema ingestion**: [`record_schema_from_json`] — parse a
//!   JSON-Schema-like envelope with `x-*` vendor extensions into a
//!   validated schema, and [`RecordSchema::record_from_json`] to bind raw
//!   JSON documents to it.
//!
//! # Core guarantee
//!
//! Schemas are immutable after construction and validated before use:
//! thresholds in `[0, 1]`, weights positive, field names unique,
//! declared types recognized. A schema that loads is a schema the engine
//! can traverse.
//!
//! # Quick start
//!
//! ```rust
//! use schema::record_schema_from_json;
//!
//! let schema = record_schema_from_json(&serde_json::json!({
//!     "type": "object",
//!     "title": "Contact",
//!     "properties": {
//!         "name": {"type": "string", "x-weight": 2.0},
//!         "phone": {"type": "string"},
//!     },
//! })).unwrap();
//!
//! let record = schema.record_from_json(&serde_json::json!({
//!     "name": "Ada Lovelace",
//! })).unwrap();
//!
//! // Missing declared fields bind to null.
//! assert!(record.as_record().unwrap()["phone"].is_null_equivalent());
//! ```

mod config;
mod error;
mod json;
mod model;
mod value;

pub use crate::config::FieldConfig;
pub use crate::error::SchemaError;
pub use crate::json::record_schema_from_json;
pub use crate::model::{DeclaredType, FieldSchema, PrimitiveType, RecordSchema};
pub use crate::value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_and_record_round_trip() {
        let schema = record_schema_from_json(&serde_json::json!({
            "type": "object",
            "title": "Order",
            "properties": {
                "order_id": {"type": "string"},
                "total": {"type": "number"},
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "title": "Item",
                        "properties": {
                            "sku": {"type": "string"},
                            "qty": {"type": "integer"},
                        },
                    },
                },
            },
        }))
        .expect("schema loads");

        let record = schema
            .record_from_json(&serde_json::json!({
                "order_id": "ORD-1",
                "total": 100.0,
                "items": [{"sku": "A", "qty": 2}],
            }))
            .expect("record binds");

        let fields = record.as_record().expect("record value");
        assert_eq!(fields["order_id"], Value::Str("ORD-1".into()));
        let items = fields["items"].as_list().expect("list value");
        assert_eq!(items.len(), 1);
        let item = items[0].as_record().expect("item record");
        assert_eq!(item["qty"], Value::Int(2));
    }
}
