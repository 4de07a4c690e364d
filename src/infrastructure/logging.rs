//! Tracing subscriber setup.
//!
//! Grounded on the teacher's `infrastructure/logging/logger.rs`: an
//! `EnvFilter`-gated registry with an optional rotating file layer
//! alongside stdout, condensed to this spec's simpler `LoggingConfig`
//! (string `format`/`rotation` fields instead of the teacher's enums).

use anyhow::{bail, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::domain::models::LoggingConfig;

/// Initializes the global tracing subscriber. The returned guard must be
/// held for the process lifetime — dropping it stops the non-blocking
/// file writer's background flush thread.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let default_level = parse_log_level(&config.level)?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let Some(log_dir) = &config.log_dir else {
        init_stdout_only(config, env_filter);
        return Ok(None);
    };

    let file_appender = match config.rotation.as_str() {
        "hourly" => rolling::hourly(log_dir, "scc-hub.log"),
        "never" => rolling::never(log_dir, "scc-hub.log"),
        _ => rolling::daily(log_dir, "scc-hub.log"),
    };
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true)
        .with_filter(env_filter.clone());

    if config.enable_stdout {
        let stdout_layer = stdout_layer(config, env_filter);
        tracing_subscriber::registry().with(file_layer).with(stdout_layer).init();
    } else {
        tracing_subscriber::registry().with(file_layer).init();
    }

    tracing::info!(level = %config.level, format = %config.format, log_dir = %log_dir, "logger initialized");
    Ok(Some(guard))
}

fn init_stdout_only(config: &LoggingConfig, env_filter: EnvFilter) {
    let stdout_layer = stdout_layer(config, env_filter);
    tracing_subscriber::registry().with(stdout_layer).init();
    tracing::info!(level = %config.level, format = %config.format, "logger initialized");
}

fn stdout_layer(
    config: &LoggingConfig,
    env_filter: EnvFilter,
) -> Box<dyn tracing_subscriber::Layer<tracing_subscriber::Registry> + Send + Sync> {
    use tracing_subscriber::Layer;
    if config.format == "pretty" {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(io::stdout)
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stdout)
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => bail!("invalid log level: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_level_accepts_known_levels() {
        assert!(matches!(parse_log_level("info"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("DEBUG"), Ok(Level::DEBUG)));
        assert!(parse_log_level("verbose").is_err());
    }
}
