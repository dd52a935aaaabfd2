use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use hikari_core::config::{AppConfig, LoggingConfig};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("subscriber init failed: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Install the global subscriber.
///
/// Console output goes to stderr so stdout stays clean for results. `RUST_LOG`
/// overrides the configured filter. The returned guard must be held until
/// exit when file logging is on.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<Option<WorkerGuard>, LogError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ if verbose => EnvFilter::try_new("hikari=debug")?,
        _ => EnvFilter::try_new(&config.level)?,
    };

    let console = fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);

    let (file, guard) = if config.file {
        let dir = AppConfig::log_dir();
        std::fs::create_dir_all(&dir)?;
        let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, "hikari.log"));
        let layer = fmt::layer().with_ansi(false).with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    Ok(guard)
}
