//! Insert mutation handle.

use crate::{
    client::FolioClient,
    error::Result,
    hooks::state::MutationState,
    models::Record,
};
use tokio::sync::watch;

/// Data-bound insert for one table.
///
/// [`submit`](Self::submit) drives the [`MutationState`] through the
/// attempt and also returns the outcome, so a call site can render the
/// state and still branch on the result. `success` is sticky until
/// [`reset`](Self::reset).
///
/// Clones share state; concurrent submits race and the last settlement
/// wins.
#[derive(Clone)]
pub struct InsertHandle {
    client: FolioClient,
    table: String,
    state: watch::Sender<MutationState>,
}

impl InsertHandle {
    /// Bind an insert to `table`. No request is issued until
    /// [`submit`](Self::submit).
    pub fn new(client: &FolioClient, table: impl Into<String>) -> Self {
        let (state, _) = watch::channel(MutationState::default());
        Self {
            client: client.clone(),
            table: table.into(),
            state,
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> MutationState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn watch(&self) -> watch::Receiver<MutationState> {
        self.state.subscribe()
    }

    /// Insert `record`, driving the mutation state through the attempt.
    ///
    /// Failures land in the state *and* come back to the caller.
    pub async fn submit(&self, record: Record) -> Result<Record> {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
            state.success = false;
        });

        match self.client.insert(&self.table, &record).await {
            Ok(inserted) => {
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.success = true;
                });
                Ok(inserted)
            }
            Err(e) => {
                let message = e.message();
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message);
                });
                Err(e)
            }
        }
    }

    /// Clear the mutation state back to its defaults, from any state.
    pub fn reset(&self) {
        self.state.send_modify(|state| *state = MutationState::default());
    }

    /// The table this handle inserts into.
    pub fn table(&self) -> &str {
        &self.table
    }
}
