use std::sync::RwLock;

use goldrush_macros::{EnumToString, config_derives};
use serde::{Deserialize, Serialize};

static INTERNAL_LOG_LEVEL: RwLock<Vec<InternalLog>> = RwLock::new(Vec::new());

#[config_derives(tag_content)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Internal(Vec<InternalLog>),
}

impl From<log::LevelFilter> for LogLevel {
    fn from(level: log::LevelFilter) -> Self {
        match level {
            log::LevelFilter::Off => LogLevel::Off,
            log::LevelFilter::Error => LogLevel::Error,
            log::LevelFilter::Warn => LogLevel::Warn,
            log::LevelFilter::Info => LogLevel::Info,
            log::LevelFilter::Debug => LogLevel::Debug,
            log::LevelFilter::Trace => LogLevel::Debug,
        }
    }
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Internal(_) => log::LevelFilter::Debug,
        }
    }
}

/// Detailed debug categories, only printed when listed in [`LogLevel::Internal`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, EnumToString)]
pub enum InternalLog {
    All,
    SetupSteps,
    Vision,
    Motors,
    ClockSync,
    Collection,
}

/// Logging configuration.
///
/// `included_nodes` and `excluded_nodes` filter the output by thread name
/// (`simulator`, `robot-0`, `robot-1`...).
#[config_derives]
pub struct LoggerConfig {
    pub included_nodes: Vec<String>,
    pub excluded_nodes: Vec<String>,
    pub log_level: LogLevel,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            included_nodes: Vec::new(),
            excluded_nodes: Vec::new(),
            log_level: LogLevel::Info,
        }
    }
}

pub fn init_log(config: &LoggerConfig) {
    let mut internals = INTERNAL_LOG_LEVEL.write().unwrap();
    internals.clear();
    if let LogLevel::Internal(v) = &config.log_level {
        internals.clone_from(v);
    }
}

pub fn is_enabled(internal_level: InternalLog) -> bool {
    if let InternalLog::All = internal_level {
        return true;
    }
    let internals = INTERNAL_LOG_LEVEL.read().unwrap();
    internals.contains(&InternalLog::All) || internals.contains(&internal_level)
}
