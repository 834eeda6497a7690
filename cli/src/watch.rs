//! Change feed tailing (`--watch <table>`).
//!
//! Prints one JSON line per event until Ctrl-C or the optional timeout,
//! then leaves the channel gracefully.

use std::time::Duration;

use folio_link::{ChangeEvent, FolioClient};
use serde_json::json;

use crate::error::Result;

pub async fn run(client: &FolioClient, table: &str, timeout_secs: u64) -> Result<()> {
    let mut feed = client.subscribe(table).await?;
    eprintln!("Watching '{}' (Ctrl-C to stop)", table);

    let deadline = (timeout_secs > 0)
        .then(|| tokio::time::Instant::now() + Duration::from_secs(timeout_secs));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Interrupted");
                break;
            }
            _ = sleep_until_deadline(deadline) => {
                eprintln!("Watch timeout reached");
                break;
            }
            event = feed.next() => match event {
                Some(Ok(event)) => print_event(&event),
                Some(Err(e)) => {
                    eprintln!("Feed error: {}", e.message());
                    break;
                }
                None => {
                    eprintln!("Feed closed by the server");
                    break;
                }
            }
        }
    }

    feed.close().await?;
    Ok(())
}

/// Resolves at the deadline, or never when no timeout was requested.
async fn sleep_until_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn print_event(event: &ChangeEvent) {
    let line = match event {
        ChangeEvent::Joined { table } => json!({
            "event": "joined",
            "table": table,
        }),
        ChangeEvent::Insert { table, record } => json!({
            "event": "insert",
            "table": table,
            "record": record,
        }),
        ChangeEvent::Update {
            table,
            record,
            old_record,
        } => json!({
            "event": "update",
            "table": table,
            "record": record,
            "old_record": old_record,
        }),
        ChangeEvent::Delete { table, old_record } => json!({
            "event": "delete",
            "table": table,
            "old_record": old_record,
        }),
        ChangeEvent::Error { code, message } => json!({
            "event": "error",
            "code": code,
            "message": message,
        }),
        ChangeEvent::Unknown { raw } => json!({
            "event": "unknown",
            "raw": raw,
        }),
    };
    println!("{}", line);
}
