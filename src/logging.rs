//! tracing subscriber setup.
//!
//! Console output goes to stderr so command output on stdout stays
//! pipeable. The filter comes from `AETHER_LOG`, then `RUST_LOG`, then the
//! verbosity flag.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE_PREFIX: &str = "aether.log";

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub verbose: bool,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Also write JSON logs to a daily-rolling file in this directory
    pub log_dir: Option<PathBuf>,
}

/// Pick the filter directive: `AETHER_LOG`, else `RUST_LOG`, else a default
/// derived from verbosity.
fn filter_directive(verbose: bool, env: impl Fn(&str) -> Option<String>) -> String {
    env("AETHER_LOG")
        .or_else(|| env("RUST_LOG"))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| if verbose { "debug" } else { "info" }.to_string())
}

fn build_filter(verbose: bool) -> EnvFilter {
    let directive = filter_directive(verbose, |name| std::env::var(name).ok());
    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("aether: invalid log filter '{}': {}", directive, e);
        EnvFilter::new("info")
    })
}

/// Install the global subscriber. Keep the returned guard alive for the life
/// of the process or buffered file output is lost.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let (json_layer, text_layer) = if config.json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(config.verbose)
            .with_writer(std::io::stderr);
        (None, Some(layer))
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create log directory {}", dir.display())
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(config.verbose))
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
