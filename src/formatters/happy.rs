//! Human formatter for terminals
//!
//! Renders a record as a colored line (time, level, logger name, message,
//! then `key: value` pairs in call order), wrapping at a maximum column.
//! Trace, warning and error records are followed by the relevant call stack
//! frames with surrounding source.
//!
//! The record is first produced by [`JsonFormatter`] and decoded again, so a
//! field that shows up during development is guaranteed to show up, encoded
//! the same way, in production. This makes the formatter several times slower
//! than the machine formatter; it is meant for interactive use.

use super::json::JsonFormatter;
use super::{field_order, Formatter};
use crate::args;
use crate::core::callstack::{self, CallstackResolver, Frame};
use crate::core::config::{Settings, DEFAULT_CONTEXT_LINES, DEFAULT_MAX_COL};
use crate::core::internal::internal_log;
use crate::core::keys::{is_reserved_key, LEVEL_KEY, MESSAGE_KEY, NAME_KEY, TIME_KEY};
use crate::core::pool::pool;
use crate::core::theme::Theme;
use crate::core::{LogLevel, TimestampFormat, Value};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

pub const KIND: &str = "happy";

const SEPARATOR: &str = " ";
const INDENT: &str = "  ";
const ASSIGNMENT: &str = ": ";

pub struct HappyFormatter {
    json: JsonFormatter,
    theme: Theme,
    max_col: usize,
    pretty: bool,
    context_lines: i32,
    resolver: Arc<CallstackResolver>,
}

impl HappyFormatter {
    /// Uncolored formatter with default layout
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            json: JsonFormatter::new(name)
                .with_timestamp(TimestampFormat::Custom("%H:%M:%S%.6f".to_string())),
            theme: Theme::disabled(),
            max_col: DEFAULT_MAX_COL,
            pretty: false,
            context_lines: DEFAULT_CONTEXT_LINES,
            resolver: callstack::resolver(),
        }
    }

    pub fn from_settings(
        name: impl Into<String>,
        settings: &Settings,
        resolver: Arc<CallstackResolver>,
    ) -> Self {
        let format = &settings.format;
        Self {
            json: JsonFormatter::new(name).with_timestamp(format.timestamp.clone()),
            theme: settings.theme.clone(),
            max_col: format.max_col,
            pretty: format.pretty,
            context_lines: format.context_lines,
            resolver,
        }
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    #[must_use]
    pub fn with_max_col(mut self, max_col: usize) -> Self {
        self.max_col = max_col;
        self
    }

    /// Put every field on its own line
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn with_context_lines(mut self, context_lines: i32) -> Self {
        self.context_lines = context_lines;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: TimestampFormat) -> Self {
        self.json = self.json.with_timestamp(timestamp);
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<CallstackResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    fn write_str(buf: &mut Vec<u8>, s: &str, col: usize) -> usize {
        buf.extend_from_slice(s.as_bytes());
        col + s.chars().count()
    }

    fn write_colored(&self, buf: &mut Vec<u8>, s: &str, color: &str, col: usize) -> usize {
        buf.extend_from_slice(color.as_bytes());
        let col = Self::write_str(buf, s, col);
        if !color.is_empty() {
            buf.extend_from_slice(self.theme.reset().as_bytes());
        }
        col
    }

    fn write_key(&self, buf: &mut Vec<u8>, key: &str, col: usize) -> usize {
        let col = Self::write_str(buf, SEPARATOR, col);
        if key.is_empty() {
            return col;
        }
        buf.extend_from_slice(self.theme.key.as_bytes());
        let col = Self::write_str(buf, key, col);
        let col = Self::write_str(buf, ASSIGNMENT, col);
        if !self.theme.key.is_empty() {
            buf.extend_from_slice(self.theme.reset().as_bytes());
        }
        col
    }

    /// Write one `key: value` pair (or a bare value when `key` is empty),
    /// breaking the line first when it would reach `max_col`
    fn set(&self, buf: &mut Vec<u8>, key: &str, value: &str, color: &str, col: usize) -> usize {
        let val = value.trim_matches(|c| c == '\n' || c == ' ');
        let width = key.chars().count() + 2 + val.chars().count();
        let mut col = col;
        if (self.pretty && !key.is_empty()) || col + width >= self.max_col {
            buf.push(b'\n');
            col = Self::write_str(buf, INDENT, 0);
        }
        let col = self.write_key(buf, key, col);
        self.write_colored(buf, val, color, col)
    }

    fn render_frames(&self, frames: &[Frame], color: &str) -> String {
        self.resolver
            .render_stack(frames, self.context_lines, color, &self.theme.source)
    }

    /// Color of the level tag and the call stack block shown for a level.
    ///
    /// Trace shows the calling frame. Warn shows the calling frame, or the
    /// stack a traced error carries. Error and Fatal show the whole stack,
    /// preferring the one a traced error carries. Nothing is shown once the
    /// resolver has been disabled.
    fn level_context(&self, level: LogLevel, args: &[Value]) -> (String, &str) {
        let color = self.theme.level(level);
        if self.resolver.is_disabled() {
            return (String::new(), color);
        }
        let carried = args
            .iter()
            .filter_map(Value::as_error)
            .find_map(|err| err.stack());

        let context = match level {
            LogLevel::Trace => self.render_frames(&self.resolver.capture(0, 1), color),
            LogLevel::Warn => match carried {
                Some(stack) => self.render_frames(stack, color),
                None => self.render_frames(&self.resolver.capture(0, 1), color),
            },
            LogLevel::Error | LogLevel::Fatal => match carried {
                Some(stack) => self.render_frames(stack, color),
                None => self.render_frames(&self.resolver.capture(0, -1), color),
            },
            _ => String::new(),
        };
        (context, color)
    }
}

fn display(entry: &Map<String, JsonValue>, key: &str) -> String {
    match entry.get(key) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl Formatter for HappyFormatter {
    fn format(&self, buf: &mut Vec<u8>, level: LogLevel, msg: &str, args: &[Value]) {
        let mut raw = pool().acquire();
        let entry = match self.json.log_entry(&mut raw, level, msg, args) {
            Ok(entry) => entry,
            Err(err) => {
                internal_log().error(
                    "Could not decode record for display.",
                    &args!["formatter", KIND, "err", err.to_string()],
                );
                buf.extend_from_slice(&raw);
                return;
            }
        };

        let theme = &self.theme;
        let mut col = self.write_colored(buf, &display(&entry, TIME_KEY), &theme.misc, 0);

        let (context, color) = self.level_context(level, args);
        col = self.set(buf, "", &display(&entry, LEVEL_KEY), color, col);
        col = self.set(buf, "", &display(&entry, NAME_KEY), &theme.misc, col);
        col = self.set(buf, "", &display(&entry, MESSAGE_KEY), &theme.message, col);

        // call order, not map order
        for key in field_order(args) {
            if is_reserved_key(&key) {
                continue;
            }
            col = self.set(buf, &key, &display(&entry, &key), &theme.value, col);
        }

        let mut add_newline = true;
        if !context.is_empty() {
            buf.push(b'\n');
            add_newline = !context.ends_with('\n');
            buf.extend_from_slice(color.as_bytes());
            buf.extend_from_slice(context.as_bytes());
            buf.extend_from_slice(theme.reset().as_bytes());
        }
        if add_newline {
            buf.push(b'\n');
        }
    }

    fn kind(&self) -> &str {
        KIND
    }
}
