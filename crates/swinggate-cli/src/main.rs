mod cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "swinggate",
    about = "Dual-leaf swing gate controller running on simulated hardware",
    version,
    propagate_version = true
)]
struct Cli {
    /// Gate configuration file (JSON). Defaults apply when omitted.
    #[arg(long, global = true, env = "SWINGGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Print snapshots as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the gate interactively from stdin
    Simulate,

    /// Scan cards through a simulated reader, runner and admin network
    RelayDemo {
        /// Cards on the admin's allow list
        #[arg(long = "allow", value_name = "UID")]
        allowed: Vec<String>,

        /// Cards to scan, in order
        #[arg(value_name = "UID", required = true)]
        scans: Vec<String>,

        /// Relay network configuration (JSON). Built-in addresses when omitted.
        #[arg(long, value_name = "PATH")]
        relay_config: Option<PathBuf>,

        /// Override the reader response timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Validate the configuration and print it with defaults filled in
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Simulate => cmd::simulate::run(cli.config.as_deref(), cli.json).await,
        Commands::RelayDemo {
            allowed,
            scans,
            relay_config,
            timeout_ms,
        } => {
            let options = cmd::relay_demo::DemoOptions {
                relay_config,
                timeout_ms,
                allowed,
                scans,
            };
            cmd::relay_demo::run(cli.config.as_deref(), options).await
        }
        Commands::CheckConfig => cmd::config::check(cli.config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
