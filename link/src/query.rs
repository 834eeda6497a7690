//! Table operations over the backend's REST surface.
//!
//! One HTTP round trip per operation. Failures are normalized to
//! [`FolioError::Backend`] with the remote message intact, logged, and
//! propagated. No retries, no local validation.

use crate::{
    auth::Credential,
    error::{FolioError, Result},
    models::{BackendErrorBody, QueryOptions, Record},
};
use log::{debug, warn};
use reqwest::{RequestBuilder, StatusCode};
use std::time::Instant;

/// Executes table operations via HTTP.
#[derive(Clone)]
pub(crate) struct TableExecutor {
    base_url: String,
    http_client: reqwest::Client,
    credential: Credential,
}

impl TableExecutor {
    pub(crate) fn new(
        base_url: String,
        http_client: reqwest::Client,
        credential: Credential,
    ) -> Self {
        Self {
            base_url,
            http_client,
            credential,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url,
            urlencoding::encode(table)
        )
    }

    /// GET every row of `table`, shaped by `options`.
    pub(crate) async fn fetch_all(
        &self,
        table: &str,
        options: &QueryOptions,
    ) -> Result<Vec<Record>> {
        let params = build_params(options);
        debug!("[REST] fetch_all '{}' params={:?}", table, params);
        let req = self.http_client.get(self.table_url(table)).query(&params);
        let body = self.dispatch("fetch_all", table, req).await?;
        decode_rows(table, &body)
    }

    /// GET the single row of `table` with the conventional `id` key.
    pub(crate) async fn fetch_by_id(&self, table: &str, id: &str) -> Result<Record> {
        let params = [
            ("select", "*".to_string()),
            ("id", format!("eq.{}", id)),
        ];
        let req = self.http_client.get(self.table_url(table)).query(&params);
        let body = self.dispatch("fetch_by_id", table, req).await?;
        let rows = decode_rows(table, &body)?;
        expect_single("fetch_by_id", table, id, rows)
    }

    /// POST a new row and return the stored representation.
    pub(crate) async fn insert(&self, table: &str, record: &Record) -> Result<Record> {
        let req = self
            .http_client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(record);
        let body = self.dispatch("insert", table, req).await?;
        let mut rows = decode_rows(table, &body)?;
        if rows.is_empty() {
            return Err(FolioError::Decode(format!(
                "insert into '{}' returned no representation",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    /// PATCH the row with `id` and return the stored representation.
    pub(crate) async fn update(&self, table: &str, id: &str, changes: &Record) -> Result<Record> {
        let params = [("id", format!("eq.{}", id))];
        let req = self
            .http_client
            .patch(self.table_url(table))
            .query(&params)
            .header("Prefer", "return=representation")
            .json(changes);
        let body = self.dispatch("update", table, req).await?;
        let rows = decode_rows(table, &body)?;
        expect_single("update", table, id, rows)
    }

    /// DELETE the row with `id`. Success carries no payload.
    pub(crate) async fn remove(&self, table: &str, id: &str) -> Result<bool> {
        let params = [("id", format!("eq.{}", id))];
        let req = self
            .http_client
            .delete(self.table_url(table))
            .query(&params);
        self.dispatch("remove", table, req).await?;
        Ok(true)
    }

    /// One round trip: apply the credential, send, normalize failures, and
    /// hand back the raw body text.
    async fn dispatch(&self, op: &str, table: &str, req: RequestBuilder) -> Result<String> {
        let req = self.credential.apply_to_request(req);
        let start = Instant::now();

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = e.to_string();
                warn!(
                    "[REST] {} '{}' transport failure: {} duration_ms={}",
                    op,
                    table,
                    message,
                    start.elapsed().as_millis()
                );
                return Err(FolioError::Backend {
                    table: table.to_string(),
                    code: None,
                    message,
                });
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let message = e.to_string();
                warn!("[REST] {} '{}' unreadable response body: {}", op, table, message);
                return Err(FolioError::Backend {
                    table: table.to_string(),
                    code: None,
                    message,
                });
            }
        };

        if status.is_success() {
            debug!(
                "[REST] {} '{}' ok status={} duration_ms={}",
                op,
                table,
                status.as_u16(),
                start.elapsed().as_millis()
            );
            return Ok(body);
        }

        let (code, message) = parse_error_body(&body, status);
        warn!(
            "[REST] {} '{}' failed: status={} code={:?} message=\"{}\" duration_ms={}",
            op,
            table,
            status.as_u16(),
            code,
            message,
            start.elapsed().as_millis()
        );
        Err(FolioError::Backend {
            table: table.to_string(),
            code,
            message,
        })
    }
}

/// Translate [`QueryOptions`] into the REST surface's query parameters.
///
/// The sort direction defaults to descending when `ascending` is unset.
fn build_params(options: &QueryOptions) -> Vec<(String, String)> {
    let mut params = vec![(
        "select".to_string(),
        options.select.clone().unwrap_or_else(|| "*".to_string()),
    )];
    if let Some(order) = &options.order {
        let direction = if order.ascending.unwrap_or(false) {
            "asc"
        } else {
            "desc"
        };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = options.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// Extract `(code, message)` from the backend's error JSON, falling back to
/// the raw body (or the bare HTTP status) when it is not the structured
/// shape.
fn parse_error_body(body: &str, status: StatusCode) -> (Option<String>, String) {
    match serde_json::from_str::<BackendErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed
                .message
                .unwrap_or_else(|| fallback_message(body, status));
            (parsed.code, message)
        }
        Err(_) => (None, fallback_message(body, status)),
    }
}

fn fallback_message(body: &str, status: StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed.to_string()
    }
}

/// Rows come back as a JSON array; a bare object (single-object responses)
/// is accepted too.
fn decode_rows(table: &str, body: &str) -> Result<Vec<Record>> {
    if let Ok(rows) = serde_json::from_str::<Vec<Record>>(body) {
        return Ok(rows);
    }
    match serde_json::from_str::<Record>(body) {
        Ok(row) => Ok(vec![row]),
        Err(e) => Err(FolioError::Decode(format!(
            "unexpected row payload from '{}': {}",
            table, e
        ))),
    }
}

/// Enforce the single-row contract of keyed lookups client-side, keeping
/// "nothing matched" distinguishable from "the key is ambiguous".
fn expect_single(op: &str, table: &str, id: &str, mut rows: Vec<Record>) -> Result<Record> {
    match rows.len() {
        0 => {
            warn!("[REST] {} '{}' id={} matched no rows", op, table, id);
            Err(FolioError::RowNotFound {
                table: table.to_string(),
                id: id.to_string(),
            })
        }
        1 => Ok(rows.remove(0)),
        n => {
            warn!(
                "[REST] {} '{}' id={} matched {} rows, expected one",
                op, table, id, n
            );
            Err(FolioError::RowConflict {
                table: table.to_string(),
                id: id.to_string(),
                count: n,
            })
        }
    }
}
