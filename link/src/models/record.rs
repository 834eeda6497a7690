//! Open row payload.

use serde_json::{Map, Value};

/// A single row, exactly as the backend returns it: an open attribute map
/// with whatever columns the table has. No schema is assumed beyond the
/// conventional `id` column used by keyed lookups.
pub type Record = Map<String, Value>;

/// Best-effort extraction of the row's `id` column as text.
///
/// Identifiers come back as numbers or strings depending on the table's
/// key type; both render the same way in URLs and filters.
pub fn id_text(record: &Record) -> Option<String> {
    match record.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
