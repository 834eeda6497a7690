//! `ChangeFeed`: consumer handle for a single table's change stream.

use crate::{
    auth::Credential,
    error::{FolioError, Result},
    feed::reader::{self, ws_reader_loop},
    models::ChangeEvent,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Capacity of the event channel between the reader task and the handle.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Live change stream for one table.
///
/// Events arrive in the order the backend emitted them, payloads untouched.
/// The underlying socket is released exactly once on every exit path:
/// explicitly via [`close`](Self::close), or implicitly when the handle is
/// dropped. A dropped connection ends the feed; there is no automatic
/// reconnect, so open a new feed to resume.
///
/// # Examples
///
/// ```rust,no_run
/// use folio_link::FolioClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FolioClient::builder()
///     .base_url("https://backend.example.com")
///     .anon_key("public-anon-key")
///     .build()?;
///
/// let mut feed = client.subscribe("contacts").await?;
/// while let Some(event) = feed.next().await {
///     match event {
///         Ok(change) => println!("{}: {:?}", change.kind(), change.record()),
///         Err(e) => eprintln!("feed error: {}", e),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChangeFeed {
    table: String,
    feed_id: String,
    /// Receives parsed events from the background reader task.
    event_rx: mpsc::Receiver<Result<ChangeEvent>>,
    /// Signals the background task to initiate graceful shutdown.
    /// `None` after `close()` has been called (or consumed by `Drop`).
    close_tx: Option<oneshot::Sender<()>>,
    /// Handle to the background reader task.
    _reader_handle: JoinHandle<()>,
    closed: bool,
}

impl ChangeFeed {
    /// Connect the WebSocket, join the table's channel, and spawn the
    /// background reader.
    ///
    /// The join acknowledgement is not awaited here: it arrives on the feed
    /// as [`ChangeEvent::Joined`], so a consumer can render "live" state
    /// from the same stream it reads changes from.
    pub(crate) async fn connect(
        base_url: &str,
        table: &str,
        credential: &Credential,
    ) -> Result<Self> {
        let feed_id = format!("feed-{}", uuid::Uuid::new_v4());
        let url = reader::realtime_url(base_url, credential.key())?;

        log::debug!("[FEED] [{}] Connecting for table '{}'", feed_id, table);
        let (mut ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| FolioError::Feed(format!("Connection failed: {}", e)))?;

        reader::send_join(&mut ws_stream, table, &feed_id).await?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (close_tx, close_rx) = oneshot::channel();
        let reader_handle = tokio::spawn(ws_reader_loop(
            ws_stream,
            event_tx,
            close_rx,
            table.to_string(),
            feed_id.clone(),
        ));

        Ok(Self {
            table: table.to_string(),
            feed_id,
            event_rx,
            close_tx: Some(close_tx),
            _reader_handle: reader_handle,
            closed: false,
        })
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the feed has ended, either after
    /// [`close`](Self::close) or when the connection dropped.
    pub async fn next(&mut self) -> Option<Result<ChangeEvent>> {
        if self.closed {
            return None;
        }
        match self.event_rx.recv().await {
            Some(item) => Some(item),
            None => {
                self.closed = true;
                None
            }
        }
    }

    /// The table this feed watches.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Close the feed gracefully.
    ///
    /// Safe to call multiple times; subsequent calls are no-ops.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        log::debug!("[FEED] [{}] Closing feed for '{}'", self.feed_id, self.table);

        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }

        Ok(())
    }

    /// Returns `true` if `close()` has been called or the stream ended.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        // Same release path as close(): the reader leaves the channel and
        // shuts the socket down.
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }
}
