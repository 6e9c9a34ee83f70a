use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use playstyle_core::{PlaystyleConfig, SqliteAnalyzer, analysis::Analyzer, schema};
use playstyle_server::Service;
use playstyle_server::cli::{Arguments, Command};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let arguments = Arguments::parse();

    let config = match load_config(&arguments) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("playstyle-server: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let result = match arguments.command() {
        Command::Serve => serve(&config).await,
        Command::Analyze { json } => analyze(&config, json),
        Command::InitDb => init_db(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(arguments: &Arguments) -> anyhow::Result<PlaystyleConfig> {
    match &arguments.config {
        Some(path) => PlaystyleConfig::from_file(path)
            .with_context(|| format!("Unable to load configuration file {}", path.display())),
        None => Ok(PlaystyleConfig::default()),
    }
}

async fn serve(config: &PlaystyleConfig) -> anyhow::Result<()> {
    tracing::debug!(?config, "Configuration loaded");
    tracing::info!(db = %config.store.db_path.display(), "Starting playstyle service");

    let analyzer = Arc::new(SqliteAnalyzer::new(&config.store.db_path));
    let service = Service::bind(&config.server, analyzer).context("Service startup failed")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Interrupt received, shutting down"),
            Err(e) => tracing::error!(error = %e, "Unable to listen for interrupt, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    service.run(shutdown_rx).await;
    Ok(())
}

fn analyze(config: &PlaystyleConfig, json: bool) -> anyhow::Result<()> {
    let report = SqliteAnalyzer::new(&config.store.db_path).analyze()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

fn init_db(config: &PlaystyleConfig) -> anyhow::Result<()> {
    schema::init_database(&config.store.db_path)
        .with_context(|| format!("Unable to initialize {}", config.store.db_path.display()))
}
