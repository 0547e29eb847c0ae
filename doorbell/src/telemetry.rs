use crate::config::{CommonConfig, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const METRICS_PREFIX: &str = "doorbell";

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("could not install tracing subscriber: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
    #[error("could not build statsd exporter: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("could not install metrics recorder: {0}")]
    Recorder(String),
}

/// Keeps the Sentry client alive; events are flushed when this is dropped.
pub struct Telemetry {
    _sentry: Option<sentry::ClientInitGuard>,
}

/// Installs logging, Sentry and the StatsD metrics exporter as configured.
pub fn init(config: &CommonConfig) -> Result<Telemetry, TelemetryError> {
    let sentry = config.logging.as_ref().map(init_sentry);
    init_tracing(sentry.is_some())?;

    match &config.metrics {
        Some(metrics) => init_metrics(metrics)?,
        None => tracing::info!("no metrics sink configured"),
    }

    Ok(Telemetry { _sentry: sentry })
}

fn init_sentry(config: &LoggingConfig) -> sentry::ClientInitGuard {
    sentry::init((
        config.sentry_dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ))
}

/// `RUST_LOG` overrides the default `info` filter.
fn init_tracing(with_sentry: bool) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let sentry_layer = with_sentry.then(|| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(sentry_layer)
        .try_init()?;

    Ok(())
}

fn init_metrics(config: &MetricsConfig) -> Result<(), TelemetryError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(METRICS_PREFIX))?;
    metrics::set_global_recorder(recorder)
        .map_err(|e| TelemetryError::Recorder(e.to_string()))?;

    shared::metrics_defs::describe_all(collector::metrics_defs::ALL_METRICS);
    shared::metrics_defs::describe_all(sheets::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "exporting metrics to statsd"
    );
    Ok(())
}
