//! Machine formatter: one JSON object per line
//!
//! Fields come out in a fixed order: time, level, name, message, then the
//! caller's fields in call order. Values are written by hand from the closed
//! [`Value`] variant set; only structured values go through `serde_json`.

use super::{Fields, Formatter};
use crate::args;
use crate::core::callstack::Frame;
use crate::core::internal::internal_log;
use crate::core::keys::{
    CALLSTACK_KEY, IMBALANCED_PAIRS_KEY, LEVEL_KEY, MESSAGE_KEY, NAME_KEY, TIME_KEY,
};
use crate::core::{LogLevel, TimestampFormat, Value};
use chrono::Local;
use std::io::Write;

pub const KIND: &str = "json";

const HEX: &[u8; 16] = b"0123456789abcdef";

pub struct JsonFormatter {
    name: String,
    timestamp: TimestampFormat,
}

impl JsonFormatter {
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

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format a record into `raw` and decode it again.
    ///
    /// The human formatter renders from this map so that development and
    /// production output always agree on which fields exist. `raw` keeps the
    /// encoded record for when decoding fails.
    pub fn log_entry(
        &self,
        raw: &mut Vec<u8>,
        level: LogLevel,
        msg: &str,
        args: &[Value],
    ) -> serde_json::Result<serde_json::Map<String, serde_json::Value>> {
        self.format(raw, level, msg, args);
        serde_json::from_slice(raw)
    }

    fn write_time(&self, buf: &mut Vec<u8>) {
        let now = Local::now();
        let formatted = self.timestamp.format(&now);
        if self.timestamp.is_numeric() {
            buf.extend_from_slice(formatted.as_bytes());
        } else {
            append_string(buf, &formatted);
        }
    }

    fn set(&self, buf: &mut Vec<u8>, key: &str, value: &Value, stack_written: &mut bool) {
        buf.extend_from_slice(b", ");
        append_string(buf, key);
        buf.push(b':');
        self.append_value(buf, value);

        if !*stack_written {
            if let Some(stack) = value.as_error().and_then(|e| e.stack()) {
                *stack_written = true;
                buf.extend_from_slice(b", ");
                append_string(buf, CALLSTACK_KEY);
                buf.push(b':');
                append_frames(buf, stack);
            }
        }
    }

    fn append_value(&self, buf: &mut Vec<u8>, value: &Value) {
        match value {
            Value::Null => buf.extend_from_slice(b"null"),
            Value::Bool(true) => buf.extend_from_slice(b"true"),
            Value::Bool(false) => buf.extend_from_slice(b"false"),
            Value::Int(i) => {
                let _ = write!(buf, "{}", i);
            }
            Value::Uint(u) => {
                let _ = write!(buf, "{}", u);
            }
            Value::Float(f) => append_float(buf, *f, f.is_finite(), format_args!("{:?}", f)),
            Value::Float32(f) => append_float(buf, *f as f64, f.is_finite(), format_args!("{:?}", f)),
            Value::Str(s) => append_string(buf, s),
            Value::Bytes(bytes) if bytes.is_empty() => buf.extend_from_slice(b"null"),
            Value::Bytes(bytes) => buf.extend_from_slice(bytes),
            Value::Error(err) => append_string(buf, &err.to_string()),
            Value::List(items) => {
                buf.push(b'[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push(b',');
                    }
                    self.append_value(buf, item);
                }
                buf.push(b']');
            }
            Value::Structured(structured) => match structured.to_json() {
                Ok(json) => {
                    if serde_json::to_writer(&mut *buf, &json).is_err() {
                        append_string(buf, &structured.describe());
                    }
                }
                Err(err) => {
                    internal_log().error(
                        "Could not encode value as JSON.",
                        &args!["formatter", KIND, "err", err.to_string()],
                    );
                    append_string(buf, &structured.describe());
                }
            },
        }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, buf: &mut Vec<u8>, level: LogLevel, msg: &str, args: &[Value]) {
        buf.extend_from_slice(b"{");
        append_string(buf, TIME_KEY);
        buf.push(b':');
        self.write_time(buf);

        buf.extend_from_slice(b", ");
        append_string(buf, LEVEL_KEY);
        buf.push(b':');
        append_string(buf, level.to_str());

        buf.extend_from_slice(b", ");
        append_string(buf, NAME_KEY);
        buf.push(b':');
        append_string(buf, &self.name);

        buf.extend_from_slice(b", ");
        append_string(buf, MESSAGE_KEY);
        buf.push(b':');
        append_string(buf, msg);

        let mut stack_written = false;
        if !args.is_empty() {
            match Fields::extract(args, KIND) {
                Fields::Pairs(pairs) => {
                    for (key, value) in pairs {
                        self.set(buf, &key, value, &mut stack_written);
                    }
                }
                Fields::Imbalanced(raw) => {
                    let list = Value::List(raw.to_vec());
                    self.set(buf, IMBALANCED_PAIRS_KEY, &list, &mut stack_written);
                }
            }
        }

        buf.extend_from_slice(b"}\n");
    }

    fn kind(&self) -> &str {
        KIND
    }
}

fn append_float(buf: &mut Vec<u8>, value: f64, finite: bool, repr: std::fmt::Arguments<'_>) {
    if finite {
        let _ = buf.write_fmt(repr);
    } else {
        // NaN and infinities have no JSON number form
        append_string(buf, &value.to_string());
    }
}

fn append_frames(buf: &mut Vec<u8>, frames: &[Frame]) {
    buf.push(b'[');
    for (i, frame) in frames.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        append_string(buf, &frame.to_string());
    }
    buf.push(b']');
}

/// Append `s` as a quoted JSON string.
///
/// Quote, backslash, `\n`, `\r` and `\t` get short escapes, other bytes below
/// 0x20 become `\u00XX` and replacement characters left by lossy decoding
/// are written as `\ufffd`. Everything else is copied as UTF-8.
pub fn append_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    let bytes = s.as_bytes();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        let escape: Option<&[u8]> = match c {
            '"' => Some(&b"\\\""[..]),
            '\\' => Some(&b"\\\\"[..]),
            '\n' => Some(&b"\\n"[..]),
            '\r' => Some(&b"\\r"[..]),
            '\t' => Some(&b"\\t"[..]),
            '\u{FFFD}' => Some(&b"\\ufffd"[..]),
            c if (c as u32) < 0x20 => None,
            _ => continue,
        };
        buf.extend_from_slice(&bytes[start..i]);
        match escape {
            Some(seq) => buf.extend_from_slice(seq),
            None => {
                let b = c as u8;
                buf.extend_from_slice(b"\\u00");
                buf.push(HEX[(b >> 4) as usize]);
                buf.push(HEX[(b & 0xF) as usize]);
            }
        }
        start = i + c.len_utf8();
    }
    buf.extend_from_slice(&bytes[start..]);
    buf.push(b'"');
}
