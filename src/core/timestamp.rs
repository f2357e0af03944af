//! Timestamp formatting utilities
//!
//! Provides standardized, configurable timestamp formats for log output.
//! Supports ISO 8601, RFC 3339, Unix timestamps, and custom strftime patterns
//! given through the `t=` option of the format configuration.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_kv_logger::core::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::Iso8601;
/// let timestamp = format.format(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Unix timestamp in microseconds: `1736332245123456`
    UnixMicros,

    /// Custom strftime format, validated by [`TimestampFormat::parse_token`]
    Custom(String),
}

impl TimestampFormat {
    /// Interpret the value of a `t=` option.
    ///
    /// Keywords select a built-in format, anything else must be a valid
    /// strftime pattern.
    pub fn parse_token(token: &str) -> Result<Self> {
        match token.to_ascii_lowercase().as_str() {
            "iso8601" => return Ok(TimestampFormat::Iso8601),
            "iso8601micros" => return Ok(TimestampFormat::Iso8601Micros),
            "rfc3339" => return Ok(TimestampFormat::Rfc3339),
            "unix" => return Ok(TimestampFormat::Unix),
            "unixms" | "unixmillis" => return Ok(TimestampFormat::UnixMillis),
            "unixus" | "unixmicros" => return Ok(TimestampFormat::UnixMicros),
            _ => {}
        }
        if token.is_empty() {
            return Err(LoggerError::config("timestamp", "empty time pattern"));
        }
        if StrftimeItems::new(token).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::config(
                "timestamp",
                format!("invalid time pattern '{}'", token),
            ));
        }
        Ok(TimestampFormat::Custom(token.to_string()))
    }

    /// Format a timestamp according to this format
    ///
    /// A custom pattern that chrono refuses to render falls back to ISO 8601
    /// rather than failing the log call.
    #[must_use]
    pub fn format<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(format_str) => {
                let mut out = String::with_capacity(32);
                if write!(out, "{}", datetime.format(format_str)).is_err() {
                    out.clear();
                    out.push_str(&datetime.to_rfc3339());
                }
                out
            }
        }
    }

    /// Check if this is a Unix-based numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}
