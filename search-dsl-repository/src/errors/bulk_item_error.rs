//! Per-item bulk failures.

use serde_json::Value;

/// One failed operation within a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemError {
    /// The bulk action, e.g. `index` or `delete`.
    pub action: String,
    /// Document id, when the engine reported one.
    pub id: Option<String>,
    /// HTTP status of the item.
    pub status: Option<u16>,
    /// The engine's error object, unmodified.
    pub error: Value,
}

impl BulkItemError {
    /// Extract the error from one element of a bulk response's `items` array.
    ///
    /// Each element is `{<action>: {_id, status, error?}}`. Returns `None` when
    /// the item has no error.
    pub fn from_item(item: &Value) -> Option<Self> {
        let (action, details) = item.as_object()?.iter().next()?;
        let error = details.get("error")?;
        if error.is_null() {
            return None;
        }

        Some(Self {
            action: action.clone(),
            id: details.get("_id").and_then(|id| match id {
                Value::String(id) => Some(id.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            }),
            status: details
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok()),
            error: error.clone(),
        })
    }
}
