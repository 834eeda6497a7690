use clap::Parser;

/// Folio CLI - Connectivity diagnostics for the portfolio backend
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Check backend configuration and table access", long_about = None)]
pub struct Cli {
    /// Backend project URL (e.g., https://project.supabase.co)
    #[arg(short = 'u', long = "url", env = "BACKEND_URL")]
    pub url: Option<String>,

    /// Publishable anon key for the backend
    #[arg(long = "anon-key", env = "BACKEND_ANON_KEY", hide_env_values = true)]
    pub anon_key: Option<String>,

    /// Tail a table's change feed instead of running the check
    #[arg(short = 'w', long = "watch", value_name = "TABLE")]
    pub watch: Option<String>,

    /// Watch duration in seconds (0 = until Ctrl-C, default: 0)
    #[arg(
        long = "watch-timeout",
        value_name = "SECONDS",
        default_value_t = 0,
        requires = "watch"
    )]
    pub watch_timeout: u64,

    /// HTTP request timeout in seconds (default: 30)
    #[arg(long = "timeout", value_name = "SECONDS", default_value_t = 30)]
    pub timeout: u64,

    /// Connection timeout in seconds (TCP + TLS handshake, default: 10)
    #[arg(
        long = "connection-timeout",
        value_name = "SECONDS",
        default_value_t = 10
    )]
    pub connection_timeout: u64,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
