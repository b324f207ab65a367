use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Snapshot of a master record resolved from its owning domain.
///
/// Columns are kept as loosely typed JSON values; consumers pick the fields
/// they display (e.g. a unit's `name` or `symbol`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MasterRecord {
    pub id: i64,
    pub fields: Map<String, Value>,
}

impl MasterRecord {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Convenience accessor for text columns.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}
