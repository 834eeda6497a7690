//! Realtime callback binding.

use crate::{client::FolioClient, models::ChangeEvent};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

type ChangeCallback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Owns a change-feed binding for one table: acquires the feed, pumps
/// every event ([`ChangeEvent::Joined`] included) into the callback, and
/// releases the feed when rebound, unbound, or dropped.
///
/// There is no reconnect: a failed or ended feed logs and leaves the
/// binding inert until [`rebind`](Self::rebind).
///
/// Requires an ambient Tokio runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use folio_link::{ChangeEvent, FolioClient, RealtimeHandle};
///
/// # async fn example() -> folio_link::Result<()> {
/// # let client = FolioClient::builder().base_url("https://backend.example.com").build()?;
/// let _contacts = RealtimeHandle::new(&client, "contacts", |event: ChangeEvent| {
///     println!("{}: {:?}", event.kind(), event.record());
/// });
/// // The binding is released when `_contacts` goes out of scope.
/// # Ok(())
/// # }
/// ```
pub struct RealtimeHandle {
    client: FolioClient,
    /// Dropping this sender stops the active pump task.
    binding: Mutex<Option<oneshot::Sender<()>>>,
}

impl RealtimeHandle {
    /// Bind `callback` to `table`'s change feed.
    pub fn new<F>(client: &FolioClient, table: impl Into<String>, callback: F) -> Self
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let handle = Self {
            client: client.clone(),
            binding: Mutex::new(None),
        };
        handle.spawn_binding(table.into(), Arc::new(callback));
        handle
    }

    /// Tear down the current binding and acquire a new one.
    pub fn rebind<F>(&self, table: impl Into<String>, callback: F)
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        self.spawn_binding(table.into(), Arc::new(callback));
    }

    /// Release the active binding without dropping the handle.
    pub fn unbind(&self) {
        let previous = {
            let mut binding = self
                .binding
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            binding.take()
        };
        drop(previous);
    }

    fn spawn_binding(&self, table: String, callback: ChangeCallback) {
        let (stop_tx, stop_rx) = oneshot::channel();
        {
            let mut binding = self
                .binding
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            // Replacing the sender drops the previous one, which stops the
            // old pump before the new feed is acquired.
            *binding = Some(stop_tx);
        }
        let client = self.client.clone();
        tokio::spawn(feed_pump(client, table, callback, stop_rx));
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.unbind();
    }
}

async fn feed_pump(
    client: FolioClient,
    table: String,
    callback: ChangeCallback,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut feed = match client.subscribe(&table).await {
        Ok(feed) => feed,
        Err(e) => {
            log::warn!(
                "[HOOK] Realtime binding for '{}' failed to connect: {}",
                table,
                e
            );
            return;
        }
    };

    loop {
        tokio::select! {
            biased;

            // Fires on unbind/rebind/drop (sender dropped) as well as on an
            // explicit signal.
            _ = &mut stop_rx => {
                let _ = feed.close().await;
                return;
            }

            event = feed.next() => match event {
                Some(Ok(event)) => callback(event),
                Some(Err(e)) => {
                    log::warn!(
                        "[HOOK] Realtime binding for '{}' errored: {}",
                        table,
                        e.message()
                    );
                    let _ = feed.close().await;
                    return;
                }
                None => {
                    log::debug!("[HOOK] Realtime binding for '{}' ended", table);
                    return;
                }
            }
        }
    }
}
