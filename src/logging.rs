//! Tracing setup for the `folio` binary.
//!
//! Events go to journald when it is enabled and reachable, otherwise to a
//! daily-rolling `folio.log` in the configured directory.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Overrides the configured level, in `EnvFilter` syntax.
pub const LOG_ENV: &str = "FOLIO_LOG";

const LOG_FILE_PREFIX: &str = "folio.log";

/// The file writer flushes on drop, so its guard lives as long as the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where log events end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Journald,
    File(PathBuf),
}

/// Build the event filter: `FOLIO_LOG` when set, the configured level
/// otherwise. A bad directive is an error rather than silently `info`.
pub fn build_filter(config: &LoggingConfig, env_override: Option<&str>) -> Result<EnvFilter> {
    let (directives, source) = match env_override {
        Some(env) => (env, LOG_ENV),
        None => (config.level.as_str(), "logging.level"),
    };
    EnvFilter::try_new(directives)
        .with_context(|| format!("Invalid log filter '{}' from {}", directives, source))
}

/// Install the global subscriber. Call once at startup; returns the sink in
/// use so the caller can mention it.
pub fn init(config: &LoggingConfig) -> Result<LogSink> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(config, env.as_deref())?;

    // Without a reachable journal the file sink takes over
    #[cfg(target_os = "linux")]
    if config.journald {
        if let Ok(journald) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(filter)
                .with(journald.with_syslog_identifier("folio".to_string()))
                .try_init()
                .context("A global tracing subscriber is already installed")?;
            return Ok(LogSink::Journald);
        }
    }

    let dir = config.directory.clone();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX));
    let _ = FILE_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    tracing::debug!(dir = %dir.display(), "File logging started");
    Ok(LogSink::File(dir))
}
