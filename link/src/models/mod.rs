//! Data models for folio-link.
//!
//! Row payloads, query options, change-feed events, and the backend's
//! structured error body.

pub mod backend_error;
pub mod change_event;
pub mod query_options;
pub mod record;

pub use backend_error::BackendErrorBody;
pub use change_event::ChangeEvent;
pub use query_options::{OrderBy, QueryOptions};
pub use record::{id_text, Record};
