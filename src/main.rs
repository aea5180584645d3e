use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use chunkvec::cli::commands::{
    handle_collection, handle_config, handle_generate, handle_mcp, handle_status,
    handle_validate, handle_vectorize, handle_visualize,
};
use chunkvec::cli::{Cli, Commands};
use chunkvec::error::ConfigError;
use chunkvec::models::{Config, OutputFormat, ResolvedConfig};

/// Logs go to stderr so stdout carries only command output (and the MCP
/// stdio transport).
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tokio::select! {
        result = run(cli) => match result {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, cleaning up...");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            ExitCode::from(130)
        }
    }
}

/// Run the selected command. `Ok(false)` means the command completed but
/// reported failure (validation failed, collection command error).
async fn run(cli: Cli) -> Result<bool> {
    let loaded = Config::load();
    let format: OutputFormat = cli.format.unwrap_or_else(|| {
        loaded
            .as_ref()
            .map(|resolved| resolved.config.output.default_format)
            .unwrap_or_default()
    });

    // Local-only commands still work when the configuration is broken.
    match cli.command {
        Commands::Generate(args) => handle_generate(args, format).await,
        Commands::Validate(args) => handle_validate(args, format).await,
        Commands::Config(cmd) => handle_config(cmd, format).await.map(|()| true),
        Commands::Vectorize(args) => {
            let config = resolve_config(loaded, cli.db.clone())?;
            handle_vectorize(args, config, cli.db.as_deref(), format)
                .await
                .map(|()| true)
        }
        Commands::Visualize(args) => {
            let config = resolve_config(loaded, cli.db)?;
            handle_visualize(args, &config, format).await.map(|()| true)
        }
        Commands::Collection(cmd) => {
            let config = resolve_config(loaded, cli.db)?;
            handle_collection(cmd, &config, format).await
        }
        Commands::Mcp(args) => {
            let config = resolve_config(loaded, cli.db)?;
            handle_mcp(args, &config).await.map(|()| true)
        }
        Commands::Status => {
            let config = resolve_config(loaded, cli.db)?;
            handle_status(&config, format).await.map(|()| true)
        }
    }
}

fn resolve_config(
    loaded: Result<ResolvedConfig, ConfigError>,
    db: Option<String>,
) -> Result<Config> {
    let mut config = loaded?.config;
    if let Some(db) = db {
        config.vector_store.url = db;
    }
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
