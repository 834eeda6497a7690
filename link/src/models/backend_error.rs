//! Structured error body returned by the backend's REST surface.

use serde::Deserialize;
use serde_json::Value;

/// The backend's error payload: `{message, code, details, hint}`.
///
/// Every field is optional: error responses vary by layer (gateway,
/// REST engine, database), and anything unparseable falls back to the raw
/// body text at the call site.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendErrorBody {
    pub message: Option<String>,
    pub code: Option<String>,
    pub details: Option<Value>,
    pub hint: Option<Value>,
}
