pub mod normalize;

pub use normalize::{normalize, Record};

use serde_json::Value;

use crate::api::types::Table;

/// Normalized table as a JSON array, ready for the `data` field
pub fn table_to_json(table: Option<&Table>) -> Value {
    Value::Array(normalize(table).into_iter().map(Value::Object).collect())
}
