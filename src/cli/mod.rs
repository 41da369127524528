pub mod client;

use clap::{Parser, Subcommand};

/// Markdown Batch Converter - batch document to Markdown conversion daemon
#[derive(Parser, Debug)]
#[command(
    name = "mbc",
    version,
    about = "Markdown Batch Converter - batch document to Markdown conversion daemon"
)]
pub struct Cli {
    /// Daemon host
    #[arg(long, default_value = "127.0.0.1", global = true)]
    pub host: String,

    /// Daemon port
    #[arg(long, default_value_t = 5555, global = true)]
    pub port: u16,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the conversion daemon
    Serve {
        /// Path to configuration file
        #[arg(short = 'c', long = "config")]
        config: Option<String>,

        /// Number of conversion workers (overrides config; 0 = auto)
        #[arg(short = 'w', long)]
        workers: Option<usize>,

        /// Per-job timeout in seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Submit file patterns for conversion
    Submit {
        /// File paths or glob patterns (*, ?, ** supported)
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Show conversion status for all jobs
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear all job records
    Clear,
}

/// Build the base URL for the daemon HTTP API.
pub fn base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

/// Format a connection error message for when the daemon is not reachable.
pub fn connection_error_message(host: &str, port: u16) -> String {
    format!(
        "Could not connect to daemon at {}:{}. Is it running? (try: mbc serve)",
        host, port
    )
}

/// Dispatch the CLI command to the appropriate handler.
pub async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Serve {
            config,
            workers,
            timeout,
        }) => {
            crate::daemon::start_daemon(
                config.as_deref().map(std::path::Path::new),
                Some(&cli.host),
                Some(cli.port),
                *workers,
                *timeout,
            )
            .await
        }
        Some(Commands::Submit { patterns }) => {
            client::cmd_submit(&cli.host, cli.port, patterns).await
        }
        Some(Commands::Status { json }) => client::cmd_status(&cli.host, cli.port, *json).await,
        Some(Commands::Clear) => client::cmd_clear(&cli.host, cli.port).await,
        None => {
            // No subcommand provided -- print help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
