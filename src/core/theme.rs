//! Color theme for the human formatter
//!
//! A theme maps semantic roles to ANSI escape sequences. It is rebuilt from
//! the color configuration every time settings are processed; when colors are
//! disabled every code is the empty string so formatters can write codes
//! unconditionally.

use super::error::LoggerError;
use super::log_level::LogLevel;
use colored::Color;

/// Resets every attribute
pub const RESET: &str = "\x1b[0m";

/// Roles a color can be assigned to
pub const ROLES: [&str; 11] = [
    "key", "value", "misc", "source", "message", "TRC", "DBG", "INF", "WRN", "ERR", "FTL",
];

const FATAL_ROLE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    enabled: bool,
    pub key: String,
    pub value: String,
    pub misc: String,
    pub source: String,
    pub message: String,
    pub trace: String,
    pub debug: String,
    pub info: String,
    pub warn: String,
    pub error: String,
    pub fatal: String,
}

impl Theme {
    /// Theme writing no escape codes at all
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build a theme from a `role=color,...` list.
    ///
    /// A bare `role` explicitly gets no color. Roles left unassigned take the
    /// `*` entry when there is one, except `FTL` which follows `ERR`.
    /// Problems are returned as diagnostics and the offending entry is
    /// skipped.
    pub fn parse(spec: &str, enabled: bool) -> (Self, Vec<LoggerError>) {
        let mut diagnostics = Vec::new();
        let mut theme = Theme {
            enabled,
            ..Theme::default()
        };
        if !enabled {
            return (theme, diagnostics);
        }

        let mut assigned: [Option<String>; ROLES.len()] = Default::default();
        let mut wildcard = None;

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (role, color) = match entry.split_once('=') {
                Some((role, color)) => (role.trim(), color.trim()),
                None => (entry, ""),
            };
            let code = if color.is_empty() {
                String::new()
            } else {
                match parse_color(color) {
                    Ok(code) => code,
                    Err(err) => {
                        diagnostics.push(err);
                        continue;
                    }
                }
            };

            if role == "*" {
                wildcard = Some(code);
                continue;
            }
            match ROLES.iter().position(|r| r.eq_ignore_ascii_case(role)) {
                Some(index) => assigned[index] = Some(code),
                None => diagnostics.push(LoggerError::config(
                    "colors",
                    format!("unknown color role '{}'", role),
                )),
            }
        }

        let fatal = assigned[FATAL_ROLE].take();
        let fallback = wildcard.unwrap_or_default();
        let mut resolved = assigned
            .into_iter()
            .map(|code| code.unwrap_or_else(|| fallback.clone()));
        let mut next = || resolved.next().unwrap_or_default();
        theme.key = next();
        theme.value = next();
        theme.misc = next();
        theme.source = next();
        theme.message = next();
        theme.trace = next();
        theme.debug = next();
        theme.info = next();
        theme.warn = next();
        theme.error = next();
        theme.fatal = fatal.unwrap_or_else(|| theme.error.clone());

        (theme, diagnostics)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Code of a level tag
    pub fn level(&self, level: LogLevel) -> &str {
        match level {
            LogLevel::Trace => &self.trace,
            LogLevel::Debug => &self.debug,
            LogLevel::Info => &self.info,
            LogLevel::Warn => &self.warn,
            LogLevel::Error => &self.error,
            LogLevel::Fatal => &self.fatal,
            LogLevel::All | LogLevel::Off => "",
        }
    }

    /// Reset code, empty when colors are off
    pub fn reset(&self) -> &'static str {
        if self.enabled {
            RESET
        } else {
            ""
        }
    }
}

/// Translate `name[+h][+b][+u]` or an xterm-256 index to an escape sequence
pub fn parse_color(spec: &str) -> Result<String, LoggerError> {
    let mut parts = spec.split('+');
    let base = parts.next().unwrap_or_default().trim();

    let mut bright = false;
    let mut attrs: Vec<&str> = Vec::new();
    for modifier in parts {
        match modifier.trim() {
            "h" => bright = true,
            "b" => attrs.push("1"),
            "u" => attrs.push("4"),
            other => {
                return Err(LoggerError::config(
                    "colors",
                    format!("unknown color modifier '{}' in '{}'", other, spec),
                ))
            }
        }
    }

    let color_code = if let Ok(index) = base.parse::<u8>() {
        format!("38;5;{}", index)
    } else {
        let color = named_color(base, bright).ok_or_else(|| {
            LoggerError::config("colors", format!("unknown color '{}'", base))
        })?;
        color.to_fg_str().into_owned()
    };

    let mut codes = attrs.join(";");
    if !codes.is_empty() {
        codes.push(';');
    }
    codes.push_str(&color_code);
    Ok(format!("\x1b[{}m", codes))
}

fn named_color(name: &str, bright: bool) -> Option<Color> {
    let color = match (name.to_ascii_lowercase().as_str(), bright) {
        ("black", false) => Color::Black,
        ("black", true) => Color::BrightBlack,
        ("red", false) => Color::Red,
        ("red", true) => Color::BrightRed,
        ("green", false) => Color::Green,
        ("green", true) => Color::BrightGreen,
        ("yellow", false) => Color::Yellow,
        ("yellow", true) => Color::BrightYellow,
        ("blue", false) => Color::Blue,
        ("blue", true) => Color::BrightBlue,
        ("magenta", false) => Color::Magenta,
        ("magenta", true) => Color::BrightMagenta,
        ("cyan", false) => Color::Cyan,
        ("cyan", true) => Color::BrightCyan,
        ("white", false) => Color::White,
        ("white", true) => Color::BrightWhite,
        _ => return None,
    };
    Some(color)
}
