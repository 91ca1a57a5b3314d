mod app;
mod config;

use clap::Parser;
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "brreg-proxy", about = "Business registry lookup and settings proxy")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, short)]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build the settings store: {0}")]
    Store(#[from] settings::store::StoreError),
    #[error("could not set up statsd: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed")]
    Recorder,
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> Result<(), StartupError> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let _sentry = init_logging(&config.logging);
    if let Some(metrics) = &config.metrics {
        init_metrics(metrics)?;
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(config))
}

async fn run(config: Config) -> Result<(), StartupError> {
    let app = app::build_app(&config)?;

    tracing::info!(
        registry = %config.registry.base_url,
        "starting brreg-proxy"
    );
    shared::http::run_http_service(&config.listener.host, config.listener.port, app).await?;

    Ok(())
}

/// Console logging filtered by `RUST_LOG` (falling back to the configured
/// level), plus Sentry when a DSN is set. The guard must outlive the server.
fn init_logging(logging: &LoggingConfig) -> Option<sentry::ClientInitGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let guard = logging.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .init();

    guard
}

fn init_metrics(config: &MetricsConfig) -> Result<(), StartupError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some(&config.prefix))?;
    metrics::set_global_recorder(recorder).map_err(|_| StartupError::Recorder)?;

    shared::metrics_defs::describe_all(registry::metrics_defs::ALL_METRICS);
    shared::metrics_defs::describe_all(settings::metrics_defs::ALL_METRICS);
    Ok(())
}
