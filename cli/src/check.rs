//! Backend connectivity check: configuration report, connection probe,
//! and per-table access probes.
//!
//! The check is informational. It prints what it finds and always exits
//! cleanly so it can run in provisioning scripts without guarding.

use std::time::Instant;

use folio_link::auth::PLACEHOLDER_URL_MARKER;
use folio_link::{Credential, FolioClient, FolioError, QueryOptions, Record};

use crate::error::Result;

/// Tables the portfolio schema is expected to carry.
const EXPECTED_TABLES: [&str; 6] = [
    "contacts",
    "projects",
    "skills",
    "experience",
    "blog_posts",
    "testimonials",
];

/// Backend code for "relation does not exist".
const MISSING_TABLE_CODE: &str = "42P01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeOutcome {
    Pass,
    Warn,
    Fail,
}

impl ProbeOutcome {
    fn label(self) -> &'static str {
        match self {
            ProbeOutcome::Pass => "[PASS]",
            ProbeOutcome::Warn => "[WARN]",
            ProbeOutcome::Fail => "[FAIL]",
        }
    }
}

pub async fn run(client: &FolioClient) -> Result<()> {
    println!("folio backend check");
    println!();

    let (url_ok, url_report) = url_summary(client.base_url());
    let (key_ok, key_report) = key_summary(client.credential());
    println!("Configuration");
    println!("  BACKEND_URL       {}", url_report);
    println!("  BACKEND_ANON_KEY  {}", key_report);

    if !url_ok || !key_ok {
        println!();
        println!("Result: error (backend is not configured)");
        println!("Set BACKEND_URL and BACKEND_ANON_KEY, then re-run.");
        return Ok(());
    }

    println!();
    println!("Connection");
    let probe_options = QueryOptions::new().with_limit(1);
    let started = Instant::now();
    let connection = client.fetch_all("projects", &probe_options).await;
    let elapsed_ms = started.elapsed().as_millis();

    let (outcome, detail) = probe_outcome(connection);
    match outcome {
        ProbeOutcome::Pass => {
            println!("  {} backend reachable ({} ms)", outcome.label(), elapsed_ms);
        }
        ProbeOutcome::Warn => {
            // The probe table is missing but the backend answered, so the
            // connection itself works.
            println!(
                "  {} backend reachable, probe table missing ({} ms)",
                outcome.label(),
                elapsed_ms
            );
        }
        ProbeOutcome::Fail => {
            println!(
                "  {} {}",
                outcome.label(),
                detail.unwrap_or_else(|| "request failed".to_string())
            );
            println!();
            println!("Result: error");
            return Ok(());
        }
    }

    println!();
    println!("Tables");
    let mut outcomes = Vec::with_capacity(EXPECTED_TABLES.len());
    for table in EXPECTED_TABLES {
        // Same request shape as the connection probe: one row, all columns.
        let result = client.fetch_all(table, &probe_options).await;
        let (outcome, detail) = probe_outcome(result);
        match &detail {
            Some(detail) => println!("  {} {} ({})", outcome.label(), table, detail),
            None => println!("  {} {}", outcome.label(), table),
        }
        outcomes.push(outcome);
    }

    println!();
    println!("Result: {}", verdict(&outcomes));
    Ok(())
}

fn url_summary(base_url: &str) -> (bool, String) {
    if base_url.is_empty() {
        (false, "missing".to_string())
    } else if base_url.contains(PLACEHOLDER_URL_MARKER) {
        (false, format!("placeholder value ({})", base_url))
    } else {
        (true, format!("set ({})", base_url))
    }
}

fn key_summary(credential: &Credential) -> (bool, String) {
    if credential.is_placeholder() {
        (false, "placeholder value".to_string())
    } else if credential.is_configured() {
        (true, "set".to_string())
    } else {
        (false, "missing".to_string())
    }
}

/// Classify one probe result. `42P01` means the backend answered but the
/// relation is absent, which is a warning rather than a failure.
fn probe_outcome(
    result: std::result::Result<Vec<Record>, FolioError>,
) -> (ProbeOutcome, Option<String>) {
    match result {
        Ok(_) => (ProbeOutcome::Pass, None),
        Err(e) if e.backend_code() == Some(MISSING_TABLE_CODE) => {
            (ProbeOutcome::Warn, Some("table does not exist".to_string()))
        }
        Err(e) => (ProbeOutcome::Fail, Some(e.message())),
    }
}

fn verdict(outcomes: &[ProbeOutcome]) -> &'static str {
    if outcomes.contains(&ProbeOutcome::Fail) {
        "error"
    } else if outcomes.contains(&ProbeOutcome::Warn) {
        "warning"
    } else {
        "success"
    }
}
