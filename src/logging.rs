//! Strategy log levels and logger setup
//!
//! Strategies write to the bot log through [`write_log`], which forwards to the
//! `log` facade. Binaries install `env_logger` with [`init`].

use log::{debug, error, info, warn};

/// Log target used for [`LogLevel::Important`] messages
pub const IMPORTANT_TARGET: &str = "strategy::important";

platform_enum! {
    /// Level of a strategy log message
    pub enum LogLevel {
        Debug = 0 => "DEBUG",
        Info = 1 => "INFO",
        /// Noteworthy events, logged at info level under [`IMPORTANT_TARGET`]
        Important = 2 => "IMPORTANT",
        Warning = 3 => "WARNING",
        Error = 4 => "ERROR",
        /// Logged at error level with a `CRITICAL:` prefix
        Critical = 5 => "CRITICAL",
    }
}

impl LogLevel {
    /// Matching level of the `log` facade
    pub fn as_log_level(&self) -> log::Level {
        match self {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info | LogLevel::Important => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error | LogLevel::Critical => log::Level::Error,
        }
    }
}

/// Write a message to the bot log
pub fn write_log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Debug => debug!("{}", message),
        LogLevel::Info => info!("{}", message),
        LogLevel::Important => info!(target: IMPORTANT_TARGET, "{}", message),
        LogLevel::Warning => warn!("{}", message),
        LogLevel::Error => error!("{}", message),
        LogLevel::Critical => error!("CRITICAL: {}", message),
    }
}

/// Install `env_logger`, using `default_level` unless `RUST_LOG` is set
///
/// Safe to call more than once; later calls leave the first logger in place.
pub fn init(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init()
        .ok();
}
