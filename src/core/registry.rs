//! Process-wide logger table
//!
//! A [`Registry`] owns the processed configuration, one logger per name,
//! the formatter factories and the sink new loggers write to. The global
//! registry is built from the environment on first use; tests build their
//! own with [`Registry::new`].

use super::callstack::{self, CallstackResolver};
use super::config::{Config, Settings, HAPPY_FORMAT, JSON_FORMAT};
use super::error::LoggerError;
use super::internal::internal_log;
use super::log_level::LogLevel;
use super::logger::{DefaultLogger, Logger};
use super::null_logger::NullLogger;
use super::sink::Sink;
use super::value::{ErrorValue, Value};
use crate::args;
use crate::formatters::{builtin_factories, Formatter, FormatterFactory};
use crate::sinks::ConsoleSink;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Name of the default logger
pub const DEFAULT_LOGGER_NAME: &str = "~";

pub struct Registry {
    settings: RwLock<Settings>,
    loggers: Mutex<HashMap<String, Arc<dyn Logger>>>,
    factories: RwLock<HashMap<String, FormatterFactory>>,
    sink: Arc<dyn Sink>,
    resolver: Arc<CallstackResolver>,
}

impl Registry {
    /// Build a registry, reporting configuration problems to the internal
    /// logger
    pub fn new(config: &Config, is_terminal: bool, sink: Arc<dyn Sink>) -> Self {
        let (registry, diagnostics) = Self::with_diagnostics(config, is_terminal, sink);
        report(&diagnostics);
        registry
    }

    /// Build a registry and hand back configuration problems instead of
    /// logging them
    pub fn with_diagnostics(
        config: &Config,
        is_terminal: bool,
        sink: Arc<dyn Sink>,
    ) -> (Self, Vec<LoggerError>) {
        let factories = builtin_factories()
            .into_iter()
            .map(|(kind, factory)| (kind.to_string(), factory))
            .collect();
        let (settings, diagnostics) = process_with(&factories, config, is_terminal);
        let registry = Self {
            settings: RwLock::new(settings),
            loggers: Mutex::new(HashMap::new()),
            factories: RwLock::new(factories),
            sink,
            resolver: Arc::new(CallstackResolver::new()),
        };
        (registry, diagnostics)
    }

    /// The registry behind the free functions, configured from `KVLOG`,
    /// `KVLOG_FORMAT` and `KVLOG_COLORS`
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let sink = ConsoleSink::stdout();
            let is_terminal = sink.is_terminal();
            let mut registry = Self::new(&Config::from_env(), is_terminal, Arc::new(sink));
            registry.resolver = callstack::resolver();
            registry
        })
    }

    /// Logger for `name`, created on first request.
    ///
    /// A name whose level resolves to Off gets the null logger and is not
    /// registered.
    pub fn logger(&self, name: &str) -> Arc<dyn Logger> {
        let mut loggers = self.loggers.lock();
        if let Some(logger) = loggers.get(name) {
            return Arc::clone(logger);
        }

        let settings = self.settings.read();
        let level = settings.level_for(name);
        if level == LogLevel::Off {
            return NullLogger::shared();
        }

        let formatter = self.formatter_for(name, &settings);
        let logger: Arc<dyn Logger> = Arc::new(DefaultLogger::new(
            name,
            level,
            formatter,
            Arc::clone(&self.sink),
        ));
        loggers.insert(name.to_string(), Arc::clone(&logger));
        logger
    }

    /// Register a logger writing to its own sink through an explicit
    /// formatter, replacing any logger of the same name
    pub fn logger_with(
        &self,
        name: &str,
        sink: Arc<dyn Sink>,
        formatter: Arc<dyn Formatter>,
    ) -> Arc<dyn Logger> {
        let level = self.settings.read().level_for(name);
        let logger: Arc<dyn Logger> = Arc::new(DefaultLogger::new(name, level, formatter, sink));
        self.loggers
            .lock()
            .insert(name.to_string(), Arc::clone(&logger));
        logger
    }

    /// The default logger
    pub fn default_logger(&self) -> Arc<dyn Logger> {
        self.logger(DEFAULT_LOGGER_NAME)
    }

    /// Reprocess configuration and re-apply level and formatter to every
    /// registered logger
    pub fn reconfigure(&self, config: &Config) {
        let diagnostics = {
            let loggers = self.loggers.lock();
            let mut settings = self.settings.write();
            let (processed, diagnostics) = self.process(config, settings.is_terminal);
            *settings = processed;

            for (name, logger) in loggers.iter() {
                logger.set_level(settings.level_for(name));
                logger.set_formatter(self.formatter_for(name, &settings));
            }
            diagnostics
        };
        report(&diagnostics);
    }

    /// Forget every registered logger and go back to the environment
    /// configuration
    pub fn reset(&self) {
        self.loggers.lock().clear();
        self.resolver.reset();
        let is_terminal = self.settings.read().is_terminal;
        let (settings, diagnostics) = self.process(&Config::from_env(), is_terminal);
        *self.settings.write() = settings;
        report(&diagnostics);
    }

    /// Make a formatter kind selectable from the format spec. Kinds are
    /// matched case-insensitively.
    pub fn register_format_factory(&self, kind: &str, factory: FormatterFactory) {
        self.factories
            .write()
            .insert(kind.to_ascii_lowercase(), factory);
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn resolver(&self) -> &Arc<CallstackResolver> {
        &self.resolver
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Number of registered loggers
    pub fn len(&self) -> usize {
        self.loggers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.lock().is_empty()
    }

    fn process(&self, config: &Config, is_terminal: bool) -> (Settings, Vec<LoggerError>) {
        process_with(&self.factories.read(), config, is_terminal)
    }

    /// Formatter for a logger. An unknown kind was already reported when the
    /// settings were processed and silently falls back here.
    fn formatter_for(&self, name: &str, settings: &Settings) -> Arc<dyn Formatter> {
        let factories = self.factories.read();
        if let Some(factory) = factories.get(&settings.format.kind) {
            return factory(name, settings, &self.resolver);
        }
        match factories.get(fallback_kind(settings)) {
            Some(factory) => factory(name, settings, &self.resolver),
            None => Arc::new(crate::formatters::JsonFormatter::new(name)),
        }
    }
}

/// Process configuration, adding a diagnostic when the format names a kind
/// no factory is registered for
fn process_with(
    factories: &HashMap<String, FormatterFactory>,
    config: &Config,
    is_terminal: bool,
) -> (Settings, Vec<LoggerError>) {
    let (settings, mut diagnostics) = Settings::process(config, is_terminal);
    let kind = &settings.format.kind;
    if !factories.contains_key(kind) {
        diagnostics.push(LoggerError::config(
            "format",
            format!(
                "unknown formatter kind '{}', using {}",
                kind,
                fallback_kind(&settings)
            ),
        ));
    }
    (settings, diagnostics)
}

fn fallback_kind(settings: &Settings) -> &'static str {
    if settings.is_terminal {
        HAPPY_FORMAT
    } else {
        JSON_FORMAT
    }
}

fn report(diagnostics: &[LoggerError]) {
    if diagnostics.is_empty() {
        return;
    }
    let log = internal_log();
    for err in diagnostics {
        log.error("Invalid configuration.", &args!["err", err.to_string()]);
    }
}

/// Logger for `name` from the global registry
pub fn logger(name: &str) -> Arc<dyn Logger> {
    Registry::global().logger(name)
}

/// The global default logger
pub fn default_logger() -> Arc<dyn Logger> {
    Registry::global().default_logger()
}

pub fn trace(msg: &str, args: &[Value]) {
    default_logger().trace(msg, args);
}

pub fn debug(msg: &str, args: &[Value]) {
    default_logger().debug(msg, args);
}

pub fn info(msg: &str, args: &[Value]) {
    default_logger().info(msg, args);
}

pub fn warn(msg: &str, args: &[Value]) -> Option<ErrorValue> {
    default_logger().warn(msg, args)
}

pub fn error(msg: &str, args: &[Value]) -> Option<ErrorValue> {
    default_logger().error(msg, args)
}

pub fn fatal(msg: &str, args: &[Value]) -> ! {
    default_logger().fatal(msg, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::TextFormatter;
    use crate::sinks::MemorySink;

    fn registry(levels: &str, format: &str) -> (Registry, MemorySink) {
        let sink = MemorySink::new();
        let (registry, diagnostics) = Registry::with_diagnostics(
            &Config::new(levels, format, ""),
            false,
            Arc::new(sink.clone()),
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        (registry, sink)
    }

    #[test]
    fn test_logger_created_once() {
        let (registry, _) = registry("*=INF", "json");
        let a = registry.logger("db");
        let b = registry.logger("db");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_off_name_gets_null_logger() {
        let (registry, sink) = registry("*=INF,-noisy", "json");
        let logger = registry.logger("noisy");
        assert_eq!(logger.level(), LogLevel::Off);
        logger.error("dropped", &[]);
        assert!(sink.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_levels_from_patterns() {
        let (registry, _) = registry("*=WRN,db*=DBG,cache", "json");
        assert_eq!(registry.logger("dbpool").level(), LogLevel::Debug);
        assert_eq!(registry.logger("cache").level(), LogLevel::Debug);
        assert_eq!(registry.logger("http").level(), LogLevel::Warn);
    }

    #[test]
    fn test_writes_to_registry_sink() {
        let (registry, sink) = registry("*=INF", "json");
        registry.logger("api").info("up", &args!["port", 80]);
        let line = &sink.lines()[0];
        assert!(line.contains(r#""n":"api""#), "{}", line);
        assert!(line.contains(r#""port":80"#), "{}", line);
    }

    #[test]
    fn test_reconfigure_updates_loggers() {
        let (registry, sink) = registry("*=ERR", "json");
        let logger = registry.logger("api");
        logger.info("hidden", &[]);
        assert!(sink.is_empty());

        registry.reconfigure(&Config::new("*=INF", "text", ""));
        assert_eq!(logger.level(), LogLevel::Info);
        logger.info("shown", &[]);
        assert!(sink.lines()[0].contains("m=\"shown\""));
    }

    #[test]
    fn test_registered_factory() {
        let (registry, sink) = registry("*=INF", "json");
        let factory: FormatterFactory =
            Arc::new(|name, _, _| Arc::new(TextFormatter::new(format!("custom-{}", name))));
        registry.register_format_factory("Custom", factory);
        registry.reconfigure(&Config::new("*=INF", "custom", ""));

        registry.logger("api").info("m", &[]);
        assert!(sink.lines()[0].contains("n=custom-api"));
    }

    #[test]
    fn test_unknown_kind_falls_back() {
        let (registry, _) = registry("*=INF", "json");
        registry.reconfigure(&Config::new("*=INF", "nosuchkind", ""));
        let formatter = registry.formatter_for("api", &registry.settings());
        assert_eq!(formatter.kind(), JSON_FORMAT);
    }

    #[test]
    fn test_unknown_kind_reported_once_per_processing() {
        let (registry, diagnostics) = Registry::with_diagnostics(
            &Config::new("*=INF", "nosuchkind", ""),
            false,
            Arc::new(MemorySink::new()),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_config());
        assert!(diagnostics[0].to_string().contains("nosuchkind"));

        let (settings, diagnostics) =
            registry.process(&Config::new("*=INF", "nosuchkind", ""), true);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].to_string().contains(HAPPY_FORMAT));
        assert_eq!(registry.formatter_for("api", &settings).kind(), HAPPY_FORMAT);
    }

    #[test]
    fn test_registered_kind_not_reported() {
        let (registry, _) = registry("*=INF", "json");
        let factory: FormatterFactory = Arc::new(|name, _, _| Arc::new(TextFormatter::new(name)));
        registry.register_format_factory("audit", factory);
        let (_, diagnostics) = registry.process(&Config::new("*=INF", "audit", ""), false);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_logger_with_explicit_wiring() {
        let (registry, shared) = registry("*=INF", "json");
        let own = MemorySink::new();
        let logger = registry.logger_with(
            "audit",
            Arc::new(own.clone()),
            Arc::new(TextFormatter::new("audit")),
        );
        logger.info("entry", &[]);
        assert_eq!(own.len(), 1);
        assert!(shared.is_empty());
        assert!(Arc::ptr_eq(&logger, &registry.logger("audit")));
    }

    #[test]
    fn test_reset_clears_loggers() {
        let (registry, _) = registry("*=INF", "json");
        registry.logger("a");
        registry.logger("b");
        registry.reset();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_default_logger_name() {
        let (registry, _) = registry("*=INF", "json");
        assert_eq!(registry.default_logger().name(), DEFAULT_LOGGER_NAME);
    }
}
