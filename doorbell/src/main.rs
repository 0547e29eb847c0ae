use clap::{Args, Parser};
use collector::endpoint::Endpoint;
use collector::settings::Configuration;
use collector::{AppState, CollectorError};
use config::{Config, ConfigError};
use std::path::PathBuf;
use telemetry::TelemetryError;

mod config;
mod telemetry;

#[derive(Parser)]
#[command(name = "doorbell", about = "Pageview beacon and form collector")]
enum CliCommand {
    /// Serve the beacon and form endpoints
    Run(RunArgs),
    /// Report whether the spreadsheet environment is complete for each endpoint
    CheckConfig(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// YAML service configuration; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Collector(#[from] CollectorError),
    #[error("could not start runtime: {0}")]
    Runtime(std::io::Error),
}

fn main() -> Result<(), CliError> {
    match CliCommand::parse() {
        CliCommand::Run(args) => run(load_config(&args)?),
        CliCommand::CheckConfig(args) => {
            let config = load_config(&args)?;
            let collector_config = config.collector.unwrap_or_default();
            collector_config.validate().map_err(CollectorError::from)?;

            for endpoint in [Endpoint::Beacon, Endpoint::Form] {
                println!(
                    "{}",
                    describe(endpoint, &Configuration::from_env(endpoint))
                );
            }
            Ok(())
        }
    }
}

fn load_config(args: &RunArgs) -> Result<Config, ConfigError> {
    match &args.config {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn run(config: Config) -> Result<(), CliError> {
    let _telemetry = telemetry::init(&config.common)?;
    let collector_config = config.collector.unwrap_or_default();
    let state = AppState::from_env(&collector_config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(collector::run(collector_config, state, shutdown_signal()))?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

/// One status line per endpoint. Only variable names are printed, never values.
fn describe(endpoint: Endpoint, configuration: &Configuration) -> String {
    match configuration {
        Configuration::Complete(settings) => format!(
            "{}: ok (sheet {:?}, apex domain {})",
            endpoint.name(),
            settings.sheet_title,
            settings.apex_domain
        ),
        Configuration::Incomplete(missing) => format!(
            "{}: disabled, missing {}",
            endpoint.name(),
            missing.missing.join(", ")
        ),
    }
}
