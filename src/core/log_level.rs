//! Log level definitions

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a record and threshold of a logger.
///
/// `All` and `Off` are thresholds only: a logger at `All` emits everything and
/// a logger at `Off` emits nothing. Records always carry one of
/// `Trace..=Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[repr(u8)]
pub enum LogLevel {
    All = 0,
    Trace = 1,
    Debug = 2,
    #[default]
    Info = 3,
    Warn = 4,
    Error = 5,
    Fatal = 6,
    Off = 7,
}

impl LogLevel {
    /// Three letter tag written into every record
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Trace => "TRC",
            LogLevel::Debug => "DBG",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WRN",
            LogLevel::Error => "ERR",
            LogLevel::Fatal => "FTL",
            LogLevel::Off => "OFF",
        }
    }

    /// Whether a record may carry this level
    #[inline]
    pub fn is_record_level(&self) -> bool {
        !matches!(self, LogLevel::All | LogLevel::Off)
    }

    #[inline]
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::All,
            1 => LogLevel::Trace,
            2 => LogLevel::Debug,
            3 => LogLevel::Info,
            4 => LogLevel::Warn,
            5 => LogLevel::Error,
            6 => LogLevel::Fatal,
            _ => LogLevel::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(LogLevel::All),
            "TRC" | "TRACE" => Ok(LogLevel::Trace),
            "DBG" | "DEBUG" => Ok(LogLevel::Debug),
            "INF" | "INFO" => Ok(LogLevel::Info),
            "WRN" | "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERR" | "ERROR" => Ok(LogLevel::Error),
            "FTL" | "FATAL" => Ok(LogLevel::Fatal),
            "OFF" => Ok(LogLevel::Off),
            _ => Err(LoggerError::unknown_level(s)),
        }
    }
}
