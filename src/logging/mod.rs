//! Logging initialization for embedding hosts and tests.
//!
//! The transform pipeline itself only instruments with `tracing::debug!` /
//! `trace!`; errors propagate to the caller and are never recorded here.

use crate::Result;
use anyhow::anyhow;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

const DEFAULT_LEVEL: &str = "info";
const LOG_FILE_PREFIX: &str = "provider-gateway.log";

/// Resolved logging configuration after applying environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub default_level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: default_level(),
            json: false,
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    /// Configuration from `PGW_LOG_LEVEL`, `PGW_LOG_JSON` and `PGW_LOG_DIR`.
    pub fn from_env() -> Self {
        Self {
            default_level: env::var("PGW_LOG_LEVEL").unwrap_or_else(|_| default_level()),
            json: env::var("PGW_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            log_dir: env::var("PGW_LOG_DIR").ok().map(PathBuf::from),
        }
    }
}

/// Keeps the file sink flushing for the lifetime of the host process.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl std::fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingGuard").finish_non_exhaustive()
    }
}

/// Initialize the logging framework once per process.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .map_err(|err| anyhow!("invalid log filter '{}': {}", config.default_level, err))?;

    let (file_layer, file_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = Registry::default().with(filter).with(file_layer);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|err| anyhow!("failed to initialize logging: {}", err))?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|err| anyhow!("failed to initialize logging: {}", err))?;
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
