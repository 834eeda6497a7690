//! Folio CLI - connectivity diagnostics for the portfolio backend.
//!
//! # Usage
//!
//! ```bash
//! # Configuration + table check (flags or environment)
//! folio --url https://project.supabase.co --anon-key <KEY>
//! BACKEND_URL=... BACKEND_ANON_KEY=... folio
//!
//! # Tail a table's change feed for 60 seconds
//! folio --watch projects --watch-timeout 60
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use folio_link::FolioClient;

mod args;
mod check;
mod error;
mod watch;

use args::Cli;
use error::Result;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli)?;
    match &cli.watch {
        Some(table) => {
            let table = table.trim();
            if table.is_empty() {
                return Err(error::CliError::Usage(
                    "--watch requires a table name".into(),
                ));
            }
            watch::run(&client, table, cli.watch_timeout).await
        }
        None => check::run(&client).await,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Build the client from flags (or their environment fallbacks). Missing
/// values become empty strings so the check can still report them.
fn build_client(cli: &Cli) -> Result<FolioClient> {
    log::debug!(
        "[CLI] timeout={}s connection_timeout={}s",
        cli.timeout,
        cli.connection_timeout
    );
    let client = FolioClient::builder()
        .base_url(cli.url.clone().unwrap_or_default())
        .anon_key(cli.anon_key.clone().unwrap_or_default())
        .timeout(Duration::from_secs(cli.timeout))
        .connect_timeout(Duration::from_secs(cli.connection_timeout))
        .build()?;
    Ok(client)
}
