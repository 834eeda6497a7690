//! Realtime change feeds.
//!
//! One feed per table: a background reader task owns the WebSocket and
//! forwards parsed events through a bounded channel to a [`ChangeFeed`]
//! handle.

mod manager;
mod reader;

pub use manager::ChangeFeed;
