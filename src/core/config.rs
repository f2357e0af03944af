//! Configuration and the settings derived from it
//!
//! Configuration is three strings (levels, format, colors), normally read
//! from `KVLOG`, `KVLOG_FORMAT` and `KVLOG_COLORS`. [`Settings::process`]
//! turns them into a level map, formatter options and a color theme. It is a
//! pure function: it never logs, it returns its diagnostics, so it can run
//! before the internal logger exists and processing the same input twice
//! gives equal settings.

use super::error::LoggerError;
use super::log_level::LogLevel;
use super::theme::Theme;
use super::timestamp::TimestampFormat;

pub const LEVELS_ENV: &str = "KVLOG";
pub const FORMAT_ENV: &str = "KVLOG_FORMAT";
pub const COLORS_ENV: &str = "KVLOG_COLORS";

pub const TERMINAL_LEVELS: &str = "*=WRN";
pub const DEFAULT_LEVELS: &str = "*=ERR";
pub const TERMINAL_FORMAT: &str = "happy,fit,maxcol=80,t=%H:%M:%S%.6f,context=-1";
pub const DEFAULT_FORMAT: &str = "JSON,t=%Y-%m-%dT%H:%M:%S%z";
pub const DEFAULT_COLORS: &str =
    "key=cyan+h,value,misc=blue,source=magenta,TRC,DBG,WRN=yellow,INF=green,ERR=red+h";

pub const HAPPY_FORMAT: &str = "happy";
pub const TEXT_FORMAT: &str = "text";
pub const JSON_FORMAT: &str = "json";

/// Wrap column of the human formatter when none is configured
pub const DEFAULT_MAX_COL: usize = 80;
/// Source lines shown around a frame when none is configured
pub const DEFAULT_CONTEXT_LINES: i32 = 2;

/// Raw configuration strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub levels: String,
    pub format: String,
    pub colors: String,
    /// Forces colors on or off regardless of the output being a terminal
    pub color_override: Option<bool>,
}

impl Config {
    pub fn new(
        levels: impl Into<String>,
        format: impl Into<String>,
        colors: impl Into<String>,
    ) -> Self {
        Self {
            levels: levels.into(),
            format: format.into(),
            colors: colors.into(),
            color_override: None,
        }
    }

    /// Read the configuration from the environment; unset variables stay
    /// empty and take the defaults during processing.
    ///
    /// `NO_COLOR` turns colors off and `CLICOLOR_FORCE` turns them on.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        let color_override = if std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            Some(false)
        } else if std::env::var("CLICOLOR_FORCE").is_ok_and(|v| !v.is_empty() && v != "0") {
            Some(true)
        } else {
            None
        };
        Self {
            levels: var(LEVELS_ENV),
            format: var(FORMAT_ENV),
            colors: var(COLORS_ENV),
            color_override,
        }
    }

    /// Defaults for an interactive or a redirected output
    pub fn defaults(is_terminal: bool) -> Self {
        if is_terminal {
            Self::new(TERMINAL_LEVELS, TERMINAL_FORMAT, DEFAULT_COLORS)
        } else {
            Self::new(DEFAULT_LEVELS, DEFAULT_FORMAT, DEFAULT_COLORS)
        }
    }

    #[must_use]
    pub fn with_color_override(mut self, enabled: bool) -> Self {
        self.color_override = Some(enabled);
        self
    }
}

/// Logger name matcher of one level entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    Exact(String),
    /// `foo*`
    Prefix(String),
    /// `*foo`
    Suffix(String),
    /// `*`
    All,
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Result<Self, LoggerError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(LoggerError::config("levels", "empty logger name pattern"));
        }
        if pattern == "*" {
            return Ok(NamePattern::All);
        }
        let parsed = if let Some(rest) = pattern.strip_prefix('*') {
            NamePattern::Suffix(rest.to_string())
        } else if let Some(rest) = pattern.strip_suffix('*') {
            NamePattern::Prefix(rest.to_string())
        } else {
            NamePattern::Exact(pattern.to_string())
        };
        match &parsed {
            NamePattern::Exact(s) | NamePattern::Prefix(s) | NamePattern::Suffix(s)
                if s.contains('*') =>
            {
                Err(LoggerError::config(
                    "levels",
                    format!("'*' is only allowed at the start or end of '{}'", pattern),
                ))
            }
            _ => Ok(parsed),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(s) => name == s,
            NamePattern::Prefix(s) => name.starts_with(s.as_str()),
            NamePattern::Suffix(s) => name.ends_with(s.as_str()),
            NamePattern::All => true,
        }
    }
}

/// Ordered `pattern => level` entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelMap {
    entries: Vec<(NamePattern, LogLevel)>,
}

impl LevelMap {
    /// Parse a level spec such as `*=WRN,db*=DBG,-noisy,mylog`.
    ///
    /// A leading `-` turns the pattern off, a bare pattern means Debug, and
    /// an unknown level falls back to Warn on a terminal, Error otherwise.
    pub fn parse(spec: &str, is_terminal: bool) -> (Self, Vec<LoggerError>) {
        let fallback = if is_terminal {
            LogLevel::Warn
        } else {
            LogLevel::Error
        };
        let mut diagnostics = Vec::new();
        let mut entries = Vec::new();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (pattern, level) = if let Some(rest) = entry.strip_prefix('-') {
                let pattern = rest.split_once('=').map_or(rest, |(p, _)| p);
                (pattern, LogLevel::Off)
            } else {
                match entry.split_once('=') {
                    Some((pattern, token)) => match token.parse::<LogLevel>() {
                        Ok(level) => (pattern, level),
                        Err(err) => {
                            diagnostics.push(err);
                            (pattern, fallback)
                        }
                    },
                    None => (entry, LogLevel::Debug),
                }
            };
            match NamePattern::parse(pattern) {
                Ok(pattern) => entries.push((pattern, level)),
                Err(err) => diagnostics.push(err),
            }
        }

        (Self { entries }, diagnostics)
    }

    /// Level of a logger name.
    ///
    /// Exact entries win over prefix/suffix entries (the longest match wins,
    /// later entries win ties), which win over `*`. A name nothing matches
    /// is Off.
    pub fn resolve(&self, name: &str) -> LogLevel {
        let mut exact = None;
        let mut wildcard: Option<(usize, LogLevel)> = None;
        let mut all = None;

        for (pattern, level) in &self.entries {
            if !pattern.matches(name) {
                continue;
            }
            match pattern {
                NamePattern::Exact(_) => exact = Some(*level),
                NamePattern::Prefix(s) | NamePattern::Suffix(s) => {
                    if wildcard.map_or(true, |(len, _)| s.len() >= len) {
                        wildcard = Some((s.len(), *level));
                    }
                }
                NamePattern::All => all = Some(*level),
            }
        }

        exact
            .or(wildcard.map(|(_, level)| level))
            .or(all)
            .unwrap_or(LogLevel::Off)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(NamePattern, LogLevel)] {
        &self.entries
    }
}

/// Options of the formatter selected by the format spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Lower-cased formatter kind (`happy`, `text`, `json` or a registered one)
    pub kind: String,
    pub timestamp: TimestampFormat,
    pub max_col: usize,
    /// Source lines around a frame; `-1` shows the call site line only
    pub context_lines: i32,
    /// Every field on its own line instead of packing up to `max_col`
    pub pretty: bool,
}

impl FormatOptions {
    pub fn defaults(is_terminal: bool) -> Self {
        Self {
            kind: if is_terminal { HAPPY_FORMAT } else { JSON_FORMAT }.to_string(),
            timestamp: default_timestamp(is_terminal),
            max_col: DEFAULT_MAX_COL,
            context_lines: DEFAULT_CONTEXT_LINES,
            pretty: false,
        }
    }

    /// Parse a format spec on top of the defaults for the output mode
    pub fn parse(spec: &str, is_terminal: bool) -> (Self, Vec<LoggerError>) {
        let mut options = Self::defaults(is_terminal);
        let mut diagnostics = Vec::new();

        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some((key, value)) = token.split_once('=') else {
                match token.to_ascii_lowercase().as_str() {
                    "fit" => options.pretty = false,
                    "pretty" => options.pretty = true,
                    kind => options.kind = kind.to_string(),
                }
                continue;
            };

            let value = value.trim();
            match key.trim() {
                "t" => match TimestampFormat::parse_token(value) {
                    Ok(format) => options.timestamp = format,
                    Err(err) => diagnostics.push(err),
                },
                "maxcol" => match value.parse::<usize>() {
                    Ok(col) if col > 0 => options.max_col = col,
                    _ => diagnostics.push(LoggerError::config(
                        "format",
                        format!("maxcol must be a positive integer, got '{}'", value),
                    )),
                },
                "context" => match value.parse::<i32>() {
                    Ok(lines) if lines >= -1 => options.context_lines = lines,
                    _ => diagnostics.push(LoggerError::config(
                        "format",
                        format!("context must be -1 or more, got '{}'", value),
                    )),
                },
                other => diagnostics.push(LoggerError::config(
                    "format",
                    format!("unknown format option '{}'", other),
                )),
            }
        }

        (options, diagnostics)
    }
}

fn default_timestamp(is_terminal: bool) -> TimestampFormat {
    let pattern = if is_terminal {
        "%H:%M:%S%.6f"
    } else {
        "%Y-%m-%dT%H:%M:%S%z"
    };
    TimestampFormat::Custom(pattern.to_string())
}

/// Everything derived from a [`Config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub levels: LevelMap,
    pub format: FormatOptions,
    pub theme: Theme,
    pub is_terminal: bool,
}

impl Settings {
    /// Process configuration; empty strings take the defaults of the
    /// output mode.
    pub fn process(config: &Config, is_terminal: bool) -> (Self, Vec<LoggerError>) {
        let defaults = Config::defaults(is_terminal);
        let pick = |value: &str, default: &str| -> String {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value.to_string()
            }
        };

        let mut diagnostics = Vec::new();

        let (levels, diags) = LevelMap::parse(&pick(&config.levels, &defaults.levels), is_terminal);
        diagnostics.extend(diags);

        let (format, diags) =
            FormatOptions::parse(&pick(&config.format, &defaults.format), is_terminal);
        diagnostics.extend(diags);

        let colors_enabled = config.color_override.unwrap_or(is_terminal);
        let (theme, diags) = Theme::parse(&pick(&config.colors, &defaults.colors), colors_enabled);
        diagnostics.extend(diags);

        (
            Self {
                levels,
                format,
                theme,
                is_terminal,
            },
            diagnostics,
        )
    }

    /// Fallback level for names no entry matches
    pub fn level_for(&self, name: &str) -> LogLevel {
        self.levels.resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(spec: &str) -> LevelMap {
        let (map, diags) = LevelMap::parse(spec, true);
        assert!(diags.is_empty(), "unexpected diagnostics {:?}", diags);
        map
    }

    #[test]
    fn test_wildcard_resolution() {
        let map = levels("*=WRN,mylog=ERR,other=OFF");
        assert_eq!(map.resolve("mylog"), LogLevel::Error);
        assert_eq!(map.resolve("other"), LogLevel::Off);
        assert_eq!(map.resolve("unlisted"), LogLevel::Warn);

        assert_eq!(levels("*log=ERR").resolve("mylog"), LogLevel::Error);
        assert_eq!(levels("*=WRN,myx*=ERR").resolve("mylog"), LogLevel::Warn);
        assert_eq!(levels("myx*=ERR").resolve("mylog"), LogLevel::Off);
    }

    #[test]
    fn test_precedence() {
        let map = levels("my*=DBG,mylog=ERR,*=WRN,myl*=INF");
        assert_eq!(map.resolve("mylog"), LogLevel::Error);
        assert_eq!(map.resolve("mylogger"), LogLevel::Info);
        assert_eq!(map.resolve("myapp"), LogLevel::Debug);
        assert_eq!(map.resolve("zzz"), LogLevel::Warn);
    }

    #[test]
    fn test_bare_and_negated_entries() {
        let map = levels("*=WRN,db,-noisy*");
        assert_eq!(map.resolve("db"), LogLevel::Debug);
        assert_eq!(map.resolve("noisy.http"), LogLevel::Off);
        assert_eq!(map.resolve("quiet"), LogLevel::Warn);
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let (map, diags) = LevelMap::parse("app=oy", true);
        assert_eq!(diags.len(), 1);
        assert_eq!(map.resolve("app"), LogLevel::Warn);

        let (map, _) = LevelMap::parse("app=oy", false);
        assert_eq!(map.resolve("app"), LogLevel::Error);
    }

    #[test]
    fn test_bad_pattern_reported() {
        let (map, diags) = LevelMap::parse("a*b=ERR,=ERR", true);
        assert_eq!(diags.len(), 2);
        assert!(map.is_empty());
    }

    #[test]
    fn test_format_options() {
        let (options, diags) = FormatOptions::parse("HAPPY,pretty,maxcol=120,context=3,t=unix", false);
        assert!(diags.is_empty());
        assert_eq!(options.kind, "happy");
        assert!(options.pretty);
        assert_eq!(options.max_col, 120);
        assert_eq!(options.context_lines, 3);
        assert_eq!(options.timestamp, TimestampFormat::Unix);
    }

    #[test]
    fn test_format_bad_options_keep_defaults() {
        let (options, diags) = FormatOptions::parse("JSON,maxcol=wide,context=-5,t=%Q,color=1", false);
        assert_eq!(diags.len(), 4);
        assert_eq!(options.kind, "json");
        assert_eq!(options.max_col, DEFAULT_MAX_COL);
        assert_eq!(options.context_lines, DEFAULT_CONTEXT_LINES);
    }

    #[test]
    fn test_defaults_by_mode() {
        let (terminal, diags) = Settings::process(&Config::default(), true);
        assert!(diags.is_empty());
        assert_eq!(terminal.format.kind, "happy");
        assert_eq!(terminal.format.context_lines, -1);
        assert_eq!(terminal.level_for("anything"), LogLevel::Warn);
        assert!(terminal.theme.enabled());

        let (piped, _) = Settings::process(&Config::default(), false);
        assert_eq!(piped.format.kind, "json");
        assert_eq!(piped.level_for("anything"), LogLevel::Error);
        assert!(!piped.theme.enabled());
    }

    #[test]
    fn test_color_override() {
        let config = Config::default().with_color_override(true);
        let (settings, _) = Settings::process(&config, false);
        assert!(settings.theme.enabled());
    }

    #[test]
    fn test_process_is_idempotent() {
        let config = Config::new("*=WRN,mylog=ERR,-other", "happy,maxcol=100", "key=red,*=blue");
        let (first, _) = Settings::process(&config, true);
        let (second, _) = Settings::process(&config, true);
        assert_eq!(first, second);
    }
}
