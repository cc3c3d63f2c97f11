//! Pipeline progress logging.
//!
//! Every pipeline stage reports through the `log_*` helpers below. They emit
//! `tracing` events, so the installed subscriber decides where they go and
//! what is filtered out. The binary installs one with [`init_logging`];
//! library users may install their own or none at all.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Status of a progress message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    /// Marker printed before the message.
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => " ",
            LogLevel::Success => "✓",
            LogLevel::Warning => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    /// `tracing` level the message is emitted at.
    pub fn tracing_level(&self) -> Level {
        match self {
            LogLevel::Info | LogLevel::Success => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn emit(level: LogLevel, message: &str) {
    let prefix = level.prefix();
    match level {
        LogLevel::Error => tracing::error!("{} {}", prefix, message),
        LogLevel::Warning => tracing::warn!("{} {}", prefix, message),
        LogLevel::Info | LogLevel::Success => tracing::info!("{} {}", prefix, message),
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    emit(LogLevel::Info, &msg.into());
}

pub fn log_success(msg: impl Into<String>) {
    emit(LogLevel::Success, &msg.into());
}

pub fn log_warning(msg: impl Into<String>) {
    emit(LogLevel::Warning, &msg.into());
}

pub fn log_error(msg: impl Into<String>) {
    emit(LogLevel::Error, &msg.into());
}

/// Level for a `-v` count: 0 warn, 1 info, 2 debug, 3+ trace.
pub fn level_from_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Build the filter: `RUST_LOG` wins, otherwise `level` for this crate and
/// `warn` for dependencies.
pub fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("warn,icd10cm={level},icd10cm_terms={level}")
}

/// Install a compact stderr subscriber. Call once, at startup.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(verbosity: u8) -> bool {
    let layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(build_env_filter(level_from_verbosity(verbosity)))
        .with(layer)
        .try_init()
        .is_ok()
}
