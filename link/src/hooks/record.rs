//! Single-record handle keyed by table + id.

use crate::{client::FolioClient, hooks::state::RequestState, models::Record};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use tokio::sync::watch;

/// Data-bound single-record lookup.
///
/// An absent or empty id is a recognized idle state: the handle settles
/// immediately with no request, no data, and no error. Call sites bind the
/// id once they have one via [`set_key`](Self::set_key).
///
/// The single-row contract of [`FolioClient::fetch_by_id`] applies, so a
/// missing row and an ambiguous id surface as distinct error messages.
///
/// Requires an ambient Tokio runtime.
#[derive(Clone)]
pub struct RecordHandle {
    inner: Arc<Inner>,
}

struct Inner {
    client: FolioClient,
    /// Current `(table, id)` key. Guarded by a std mutex, never held
    /// across await.
    key: Mutex<(String, Option<String>)>,
    state: watch::Sender<RequestState<Record>>,
    /// Issue counter for in-flight supersession.
    seq: AtomicU64,
}

impl RecordHandle {
    /// Bind a lookup. With `Some(id)` the fetch starts immediately; `None`
    /// or an empty string settles idle without issuing a request.
    pub fn new(client: &FolioClient, table: impl Into<String>, id: Option<&str>) -> Self {
        let key = (table.into(), normalize_id(id));
        let has_id = key.1.is_some();
        let initial = if has_id {
            RequestState::loading()
        } else {
            RequestState::idle()
        };
        let (state, _) = watch::channel(initial);
        let inner = Arc::new(Inner {
            client: client.clone(),
            key: Mutex::new(key),
            state,
            seq: AtomicU64::new(0),
        });
        if has_id {
            spawn_fetch(&inner);
        }
        Self { inner }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<Record> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn watch(&self) -> watch::Receiver<RequestState<Record>> {
        self.inner.state.subscribe()
    }

    /// Re-key the lookup.
    ///
    /// A genuine key change refetches; re-binding an equal key is a no-op;
    /// a change to an absent id settles idle and invalidates any fetch
    /// still in flight for the old key.
    pub fn set_key(&self, table: impl Into<String>, id: Option<&str>) {
        let next = (table.into(), normalize_id(id));
        let action = {
            let mut key = self
                .inner
                .key
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *key == next {
                None
            } else {
                let has_id = next.1.is_some();
                *key = next;
                Some(has_id)
            }
        };
        match action {
            Some(true) => spawn_fetch(&self.inner),
            Some(false) => {
                // Invalidate in-flight settlements for the old key.
                self.inner.seq.fetch_add(1, Ordering::SeqCst);
                self.inner
                    .state
                    .send_modify(|state| *state = RequestState::idle());
            }
            None => {}
        }
    }
}

fn normalize_id(id: Option<&str>) -> Option<String> {
    match id {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => None,
    }
}

fn spawn_fetch(inner: &Arc<Inner>) {
    let inner = Arc::clone(inner);
    tokio::spawn(run_fetch(inner));
}

async fn run_fetch(inner: Arc<Inner>) {
    let issue = inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
    let (table, id) = {
        let key = inner.key.lock().unwrap_or_else(PoisonError::into_inner);
        key.clone()
    };
    // Re-keyed to idle between spawn and run.
    let Some(id) = id else { return };

    // An issue that is no longer the newest stands down without fetching.
    let current = inner.state.send_if_modified(|state| {
        if inner.seq.load(Ordering::SeqCst) != issue {
            return false;
        }
        state.loading = true;
        state.error = None;
        true
    });
    if !current {
        return;
    }

    let result = inner.client.fetch_by_id(&table, &id).await;

    inner.state.send_if_modified(|state| {
        if inner.seq.load(Ordering::SeqCst) != issue {
            log::debug!(
                "[HOOK] Stale record settlement for '{}' id={} discarded (issue {})",
                table,
                id,
                issue
            );
            return false;
        }
        state.loading = false;
        match result {
            Ok(record) => {
                state.data = Some(record);
                state.error = None;
            }
            Err(e) => {
                state.data = None;
                state.error = Some(e.message());
            }
        }
        true
    });
}
