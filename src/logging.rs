/*!
 * Logging and tracing initialization
 *
 * The library only emits `tracing` events; embedding applications call
 * [`init_logging`] once to install a subscriber.
 */

use std::fs::File;
use std::path::Path;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::BagitConfig;
use crate::error::{BagitError, Result};

/// Initialize structured logging based on configuration
pub fn init_logging(config: &BagitConfig) -> Result<()> {
    let env_filter = env_filter(config)?;

    if let Some(ref log_path) = config.log_file {
        init_file_logging(log_path, env_filter)
    } else {
        init_stdout_logging(env_filter)
    }
}

/// `RUST_LOG` when set, otherwise `bagit=<level>` from the configuration
fn env_filter(config: &BagitConfig) -> Result<EnvFilter> {
    let log_level = effective_level(config);
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("bagit={}", log_level)))
        .map_err(|e| BagitError::Config(format!("Failed to create log filter: {}", e)))
}

fn effective_level(config: &BagitConfig) -> Level {
    if config.verbose {
        Level::DEBUG
    } else {
        config.log_level.to_tracing_level()
    }
}

fn init_stdout_logging(env_filter: EnvFilter) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| BagitError::Config(format!("Failed to install logger: {}", e)))
}

/// JSON lines to a file, with thread names so verifier workers are distinguishable
fn init_file_logging(log_path: &Path, env_filter: EnvFilter) -> Result<()> {
    let file = File::create(log_path)
        .map_err(|e| BagitError::Config(format!("Failed to create log file: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(file)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| BagitError::Config(format!("Failed to install logger: {}", e)))
}

/// Initialize logging with custom format for testing
#[cfg(test)]
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bagit=debug"));

        let fmt_layer = fmt::layer().with_test_writer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .ok(); // Ignore error if already initialized
    });
}
