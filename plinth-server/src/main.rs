//! Plinth server binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use plinth_config::{CONFIG_FILE_NAME, Config};
use plinth_server::{HandlerRegistry, init_tracing, run_server};
use tracing::error;

/// HTTP application scaffold over a document store.
#[derive(Parser, Debug)]
#[command(name = "plinth", version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load {}: {}", args.config.display(), err);
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.log.level);

    // Handlers referenced by the route table register here.
    let registry = HandlerRegistry::new();

    if let Err(err) = run_server(config, registry).await {
        error!("server failed: {}", err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
