//! Change-feed event model.

use crate::models::Record;
use serde_json::Value;

/// One event on a table's change feed.
///
/// Row payloads are passed through exactly as the backend sent them, with
/// no buffering, merging, or replay. Removals carry the prior values only
/// when the backend includes them (typically just the key columns).
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The channel join was acknowledged; events for the table follow.
    Joined { table: String },
    /// A row was inserted.
    Insert { table: String, record: Record },
    /// A row was updated. `old_record` is present when the backend
    /// replicates prior values.
    Update {
        table: String,
        record: Record,
        old_record: Option<Record>,
    },
    /// A row was deleted.
    Delete {
        table: String,
        old_record: Option<Record>,
    },
    /// The server reported an error on the feed.
    Error {
        code: Option<String>,
        message: String,
    },
    /// A frame the client does not recognize, passed through raw.
    Unknown { raw: Value },
}

impl ChangeEvent {
    /// The table the event belongs to, when the frame carries one.
    pub fn table(&self) -> Option<&str> {
        match self {
            ChangeEvent::Joined { table }
            | ChangeEvent::Insert { table, .. }
            | ChangeEvent::Update { table, .. }
            | ChangeEvent::Delete { table, .. } => Some(table),
            ChangeEvent::Error { .. } | ChangeEvent::Unknown { .. } => None,
        }
    }

    /// The row payload: the new row for inserts and updates, the prior row
    /// for deletes.
    pub fn record(&self) -> Option<&Record> {
        match self {
            ChangeEvent::Insert { record, .. } | ChangeEvent::Update { record, .. } => {
                Some(record)
            }
            ChangeEvent::Delete { old_record, .. } => old_record.as_ref(),
            _ => None,
        }
    }

    /// Kind tag for logging and line-oriented output.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Joined { .. } => "joined",
            ChangeEvent::Insert { .. } => "insert",
            ChangeEvent::Update { .. } => "update",
            ChangeEvent::Delete { .. } => "delete",
            ChangeEvent::Error { .. } => "error",
            ChangeEvent::Unknown { .. } => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).expect("record fixture")
    }

    #[test]
    fn test_record_accessor_picks_the_meaningful_payload() {
        let insert = ChangeEvent::Insert {
            table: "contacts".into(),
            record: record(json!({"id": 1})),
        };
        assert_eq!(insert.record().and_then(|r| r.get("id")), Some(&json!(1)));

        let delete = ChangeEvent::Delete {
            table: "contacts".into(),
            old_record: Some(record(json!({"id": 2}))),
        };
        assert_eq!(delete.record().and_then(|r| r.get("id")), Some(&json!(2)));

        let bare_delete = ChangeEvent::Delete {
            table: "contacts".into(),
            old_record: None,
        };
        assert!(bare_delete.record().is_none());
    }

    #[test]
    fn test_kind_and_table_tags() {
        let event = ChangeEvent::Joined {
            table: "projects".into(),
        };
        assert_eq!(event.kind(), "joined");
        assert_eq!(event.table(), Some("projects"));

        let error = ChangeEvent::Error {
            code: None,
            message: "boom".into(),
        };
        assert_eq!(error.kind(), "error");
        assert_eq!(error.table(), None);
    }
}
