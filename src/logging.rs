use anyhow::Context;
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling,
};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config;

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for as long as the bot runs.
pub fn init(config: &config::Logging) -> anyhow::Result<Option<WorkerGuard>> {
    let stdout_layer = Layer::default().with_filter(filter(config)?);

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) => {
            let (writer, guard) = NonBlocking::new(rolling::daily(directory, "cordwork.log"));
            let layer = Layer::default()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer)
                .with_filter(filter(config)?);

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(guard)
}

fn filter(config: &config::Logging) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .with_context(|| format!("invalid log filter `{}`", config.filter)),
    }
}
