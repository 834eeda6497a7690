//! Data-bound state handles.
//!
//! Each handle owns a small observable state cell published through a
//! [`tokio::sync::watch`] channel: read a snapshot with `state()`, or
//! subscribe with `watch()` to await transitions. Handles spawn their work
//! on the ambient Tokio runtime and never let a failure escape; every
//! failure lands in the state as the backend's message, verbatim.
//!
//! State lives exactly as long as the handle. There is no cross-handle
//! cache or request de-duplication: two handles bound to the same table
//! issue independent requests.

mod insert;
mod query;
mod record;
mod realtime;
mod state;

pub use insert::InsertHandle;
pub use query::QueryHandle;
pub use record::RecordHandle;
pub use realtime::RealtimeHandle;
pub use state::{MutationState, RequestState};
