//! Background WebSocket reader task for change feeds.
//!
//! Owns the socket: keeps the realtime gateway's heartbeat cadence,
//! parses frames into [`ChangeEvent`]s, and leaves the channel cleanly on
//! the shutdown signal.

use crate::{
    error::{FolioError, Result},
    models::{ChangeEvent, Record},
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Heartbeat cadence the realtime gateway expects on the `phoenix` topic.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// Frame ref of the join request; its acknowledgement becomes
/// [`ChangeEvent::Joined`].
const JOIN_REF: &str = "1";

/// Derive the realtime WebSocket URL from the project's base URL.
///
/// `http(s)://host` becomes `ws(s)://host/realtime/v1/websocket` with the
/// anon key and protocol version as query parameters.
pub(crate) fn realtime_url(base_url: &str, anon_key: &str) -> Result<String> {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if base_url.starts_with("ws://") || base_url.starts_with("wss://") {
        base_url.to_string()
    } else {
        return Err(FolioError::Configuration(format!(
            "cannot derive realtime URL from '{}'",
            base_url
        )));
    };
    Ok(format!(
        "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
        ws_base.trim_end_matches('/'),
        urlencoding::encode(anon_key)
    ))
}

/// Channel topic for a table's change stream.
pub(crate) fn feed_topic(table: &str) -> String {
    format!("realtime:public:{}", table)
}

fn control_frame(topic: &str, event: &str, payload: Value, frame_ref: &str) -> Option<String> {
    serde_json::to_string(&json!({
        "topic": topic,
        "event": event,
        "payload": payload,
        "ref": frame_ref,
    }))
    .ok()
}

/// Send the channel join frame for `table`, requesting every change kind
/// on the public schema.
pub(crate) async fn send_join(ws_stream: &mut WsStream, table: &str, feed_id: &str) -> Result<()> {
    let topic = feed_topic(table);
    let payload = json!({
        "config": {
            "postgres_changes": [
                { "event": "*", "schema": "public", "table": table }
            ]
        }
    });
    let frame = control_frame(&topic, "phx_join", payload, JOIN_REF)
        .ok_or_else(|| FolioError::Feed("failed to encode join frame".to_string()))?;

    log::debug!("[FEED] [{}] Joining channel '{}'", feed_id, topic);
    ws_stream
        .send(Message::Text(frame.into()))
        .await
        .map_err(|e| FolioError::Feed(format!("Failed to join channel: {}", e)))
}

/// Best-effort channel leave + socket close.
async fn send_leave_and_close(ws_stream: &mut WsStream, table: &str, frame_ref: u64) {
    if let Some(frame) = control_frame(
        &feed_topic(table),
        "phx_leave",
        json!({}),
        &frame_ref.to_string(),
    ) {
        let _ = ws_stream.send(Message::Text(frame.into())).await;
    }
    let _ = ws_stream.close(None).await;
}

/// Background task that owns the WebSocket stream and forwards parsed
/// events through a bounded channel.
///
/// Responsibilities:
/// - Read WS frames and parse them into `ChangeEvent`s
/// - Send periodic heartbeats so the gateway keeps the socket open
/// - Graceful `phx_leave` + close on the shutdown signal
pub(crate) async fn ws_reader_loop(
    mut ws_stream: WsStream,
    event_tx: mpsc::Sender<Result<ChangeEvent>>,
    close_rx: oneshot::Receiver<()>,
    table: String,
    feed_id: String,
) {
    tokio::pin!(close_rx);

    let mut heartbeat = tokio::time::interval_at(
        tokio::time::Instant::now() + HEARTBEAT_INTERVAL,
        HEARTBEAT_INTERVAL,
    );
    // The join frame used ref 1; everything after counts up from there.
    let mut frame_ref: u64 = 1;

    loop {
        tokio::select! {
            biased;

            // Highest priority: graceful shutdown requested by close() / Drop.
            _ = &mut close_rx => {
                log::debug!("[FEED] [{}] Close requested, leaving '{}'", feed_id, table);
                frame_ref += 1;
                send_leave_and_close(&mut ws_stream, &table, frame_ref).await;
                return;
            }

            _ = heartbeat.tick() => {
                frame_ref += 1;
                let Some(frame) =
                    control_frame("phoenix", "heartbeat", json!({}), &frame_ref.to_string())
                else {
                    continue;
                };
                if let Err(e) = ws_stream.send(Message::Text(frame.into())).await {
                    let _ = event_tx
                        .send(Err(FolioError::Feed(format!(
                            "Failed to send heartbeat: {}",
                            e
                        ))))
                        .await;
                    return;
                }
                log::debug!("[FEED] [{}] Heartbeat sent", feed_id);
            }

            msg = ws_stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = parse_frame(text.as_str(), &table) {
                        if event_tx.send(Ok(event)).await.is_err() {
                            // Handle dropped without close(); leave anyway.
                            frame_ref += 1;
                            send_leave_and_close(&mut ws_stream, &table, frame_ref).await;
                            return;
                        }
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    // tokio-tungstenite auto-responds, but be explicit.
                    let _ = ws_stream.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) => {
                    log::debug!("[FEED] [{}] Server closed the connection", feed_id);
                    return;
                }
                Some(Ok(_)) => {} // binary frames are not part of this protocol
                Some(Err(e)) => {
                    let message = e.to_string();
                    log::warn!("[FEED] [{}] WebSocket error: {}", feed_id, message);
                    let _ = event_tx.send(Err(FolioError::Feed(message))).await;
                    return;
                }
                None => {
                    log::debug!("[FEED] [{}] Stream ended", feed_id);
                    return;
                }
            }
        }
    }
}

/// Parse one realtime frame into a [`ChangeEvent`].
///
/// Returns `None` for control frames that do not concern consumers
/// (heartbeat acknowledgements, presence, late leave acks).
///
/// Two data framings are accepted: the current one, where changes arrive
/// as `postgres_changes` events with the row under `payload.data`, and the
/// older flat framing, where the event name is `INSERT`/`UPDATE`/`DELETE`
/// and the row sits directly under `payload`.
pub(crate) fn parse_frame(text: &str, table: &str) -> Option<ChangeEvent> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => {
            return Some(ChangeEvent::Unknown {
                raw: Value::String(text.to_string()),
            })
        }
    };

    let event = value
        .get("event")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let topic = value
        .get("topic")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match event.as_str() {
        "phx_reply" => {
            if topic == "phoenix" {
                return None; // heartbeat acknowledgement
            }
            let status = value
                .pointer("/payload/status")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if status == "ok" {
                let frame_ref = value.get("ref").and_then(Value::as_str).unwrap_or_default();
                if frame_ref == JOIN_REF {
                    return Some(ChangeEvent::Joined {
                        table: table.to_string(),
                    });
                }
                return None; // leave and other control acknowledgements
            }
            let code = value.pointer("/payload/response/code").map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            let message = value
                .pointer("/payload/response/reason")
                .or_else(|| value.pointer("/payload/response/message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    value
                        .pointer("/payload/response")
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "channel join rejected".to_string())
                });
            Some(ChangeEvent::Error { code, message })
        }
        "phx_error" => Some(ChangeEvent::Error {
            code: None,
            message: format!("channel '{}' crashed", topic),
        }),
        "postgres_changes" => {
            let (change_type, record, old_record) = match value.pointer("/payload/data") {
                Some(data) => (
                    data.get("type")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    data.get("record").and_then(as_record),
                    data.get("old_record").and_then(as_record),
                ),
                None => (String::new(), None, None),
            };
            build_change(&change_type, table, record, old_record, value)
        }
        // Legacy flat framing: the event name is the change type.
        "INSERT" | "UPDATE" | "DELETE" => {
            let record = value
                .pointer("/payload/record")
                .or_else(|| value.pointer("/payload/new"))
                .and_then(as_record);
            let old_record = value
                .pointer("/payload/old_record")
                .or_else(|| value.pointer("/payload/old"))
                .and_then(as_record);
            build_change(&event, table, record, old_record, value)
        }
        "system" | "presence_state" | "presence_diff" => None,
        _ => Some(ChangeEvent::Unknown { raw: value }),
    }
}

fn build_change(
    change_type: &str,
    table: &str,
    record: Option<Record>,
    old_record: Option<Record>,
    raw: Value,
) -> Option<ChangeEvent> {
    match (change_type, record, old_record) {
        ("INSERT", Some(record), _) => Some(ChangeEvent::Insert {
            table: table.to_string(),
            record,
        }),
        ("UPDATE", Some(record), old_record) => Some(ChangeEvent::Update {
            table: table.to_string(),
            record,
            old_record,
        }),
        ("DELETE", _, old_record) => Some(ChangeEvent::Delete {
            table: table.to_string(),
            old_record,
        }),
        _ => Some(ChangeEvent::Unknown { raw }),
    }
}

fn as_record(value: &Value) -> Option<Record> {
    value.as_object().cloned()
}
