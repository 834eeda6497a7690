//! List-query handle: one table + options, refetchable.

use crate::{
    client::FolioClient,
    hooks::state::RequestState,
    models::{QueryOptions, Record},
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use tokio::sync::watch;

/// Data-bound list query.
///
/// Holds `(table, options)` as its identity and keeps a [`RequestState`]
/// of the matching rows. The initial fetch starts immediately on
/// construction; [`set_query`](Self::set_query) refetches only when the
/// identity genuinely changes. Options are compared structurally, so a
/// rebuilt-but-equal value is a no-op. [`refetch`](Self::refetch) always
/// refetches.
///
/// In-flight requests are not cancelled. Each issue takes a sequence
/// number and only the newest issue may publish its settlement, so a stale
/// response can never overwrite a fresher one.
///
/// Requires an ambient Tokio runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use folio_link::{FolioClient, QueryHandle, QueryOptions};
///
/// # async fn example() -> folio_link::Result<()> {
/// # let client = FolioClient::builder().base_url("https://backend.example.com").build()?;
/// let projects = QueryHandle::new(&client, "projects", QueryOptions::new());
///
/// let mut states = projects.watch();
/// while states.changed().await.is_ok() {
///     let state = states.borrow_and_update().clone();
///     if state.is_settled() {
///         println!("rows: {:?}, error: {:?}", state.data.map(|d| d.len()), state.error);
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryHandle {
    inner: Arc<Inner>,
}

struct Inner {
    client: FolioClient,
    /// Current identity. Guarded by a std mutex, never held across await.
    identity: Mutex<(String, QueryOptions)>,
    state: watch::Sender<RequestState<Vec<Record>>>,
    /// Issue counter for in-flight supersession.
    seq: AtomicU64,
}

impl QueryHandle {
    /// Bind a query and start the initial fetch.
    pub fn new(client: &FolioClient, table: impl Into<String>, options: QueryOptions) -> Self {
        let (state, _) = watch::channel(RequestState::loading());
        let inner = Arc::new(Inner {
            client: client.clone(),
            identity: Mutex::new((table.into(), options)),
            state,
            seq: AtomicU64::new(0),
        });
        spawn_fetch(&inner);
        Self { inner }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState<Vec<Record>> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn watch(&self) -> watch::Receiver<RequestState<Vec<Record>>> {
        self.inner.state.subscribe()
    }

    /// Point the handle at a new `(table, options)` identity.
    ///
    /// Refetches only when the identity differs from the current one;
    /// re-binding an equal identity leaves the state untouched.
    pub fn set_query(&self, table: impl Into<String>, options: QueryOptions) {
        let next = (table.into(), options);
        let changed = {
            let mut identity = self
                .inner
                .identity
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *identity == next {
                false
            } else {
                *identity = next;
                true
            }
        };
        if changed {
            spawn_fetch(&self.inner);
        }
    }

    /// Repeat the fetch for the current identity, unconditionally.
    pub async fn refetch(&self) {
        run_fetch(self.inner.clone()).await;
    }
}

fn spawn_fetch(inner: &Arc<Inner>) {
    let inner = Arc::clone(inner);
    tokio::spawn(run_fetch(inner));
}

async fn run_fetch(inner: Arc<Inner>) {
    let issue = inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
    let (table, options) = {
        let identity = inner
            .identity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        identity.clone()
    };

    // Keep prior data visible through the window; only the flags move.
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

    let result = inner.client.fetch_all(&table, &options).await;

    inner.state.send_if_modified(|state| {
        // A newer issue owns the state now; drop this settlement.
        if inner.seq.load(Ordering::SeqCst) != issue {
            log::debug!(
                "[HOOK] Stale fetch settlement for '{}' discarded (issue {})",
                table,
                issue
            );
            return false;
        }
        state.loading = false;
        match result {
            Ok(rows) => {
                state.data = Some(rows);
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
