use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use parley_bridge::{Config, Daemon};

/// Parley - voice conference bridge for AI assistants
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/parley/config.toml)
    #[arg(short, long, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Conference server address (overrides the config file)
    #[arg(short, long, env = "PARLEY_SERVER")]
    server: Option<String>,

    /// Control-surface port (overrides the config file)
    #[arg(long, env = "PARLEY_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley_bridge=info",
        1 => "info,parley_bridge=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server = server;
    }
    if let Some(port) = cli.port {
        config.api_port = port;
    }

    tracing::info!(
        server = %config.server,
        api_port = config.api_port,
        "starting parley bridge"
    );

    Daemon::new(config).run().await?;
    Ok(())
}
