//! Key=value text formatter
//!
//! Example: `t=2025-01-08T10:30:45+0000 n=app l=INF m="Request processed" status=200`

use super::{Fields, Formatter};
use crate::core::keys::{IMBALANCED_PAIRS_KEY, LEVEL_KEY, MESSAGE_KEY, NAME_KEY, TIME_KEY};
use crate::core::{LogLevel, TimestampFormat, Value};
use chrono::Local;

pub const KIND: &str = "text";

const SEPARATOR: &str = " ";

pub struct TextFormatter {
    name: String,
    timestamp: TimestampFormat,
}

impl TextFormatter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: TimestampFormat::Custom("%Y-%m-%dT%H:%M:%S%z".to_string()),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: TimestampFormat) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn set(&self, buf: &mut Vec<u8>, key: &str, value: &str) {
        buf.extend_from_slice(SEPARATOR.as_bytes());
        buf.extend_from_slice(escape_key(key).as_bytes());
        buf.push(b'=');
        buf.extend_from_slice(value.as_bytes());
    }

    fn render_value(value: &Value) -> String {
        match value {
            Value::Str(s) => escape_value(s),
            Value::Error(err) => quote_value(&err.to_string()),
            Value::Bytes(bytes) => escape_value(&String::from_utf8_lossy(bytes)),
            Value::List(_) | Value::Structured(_) => quote_value(&value.to_string()),
            other => other.to_string(),
        }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, buf: &mut Vec<u8>, level: LogLevel, msg: &str, args: &[Value]) {
        buf.extend_from_slice(TIME_KEY.as_bytes());
        buf.push(b'=');
        buf.extend_from_slice(escape_value(&self.timestamp.format(&Local::now())).as_bytes());
        self.set(buf, NAME_KEY, &escape_value(&self.name));
        self.set(buf, LEVEL_KEY, level.to_str());
        self.set(buf, MESSAGE_KEY, &quote_value(msg));

        if !args.is_empty() {
            match Fields::extract(args, KIND) {
                Fields::Pairs(pairs) => {
                    for (key, value) in pairs {
                        self.set(buf, &key, &Self::render_value(value));
                    }
                }
                Fields::Imbalanced(raw) => {
                    let list = Value::List(raw.to_vec());
                    self.set(buf, IMBALANCED_PAIRS_KEY, &quote_value(&list.to_string()));
                }
            }
        }
        buf.push(b'\n');
    }

    fn kind(&self) -> &str {
        KIND
    }
}

/// Keep only characters that are safe in a bare key
fn escape_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect()
}

/// Quote a value when it contains spaces, quotes, `=` or control characters
fn escape_value(value: &str) -> String {
    if value.is_empty() || value.chars().any(|c| c == ' ' || c == '"' || c == '=' || c.is_control()) {
        quote_value(value)
    } else {
        value.to_string()
    }
}

fn quote_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
