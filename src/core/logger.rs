//! Logger trait and the default logger implementation

use super::{
    log_level::LogLevel,
    metrics::LoggerMetrics,
    pool::pool,
    sink::Sink,
    value::{ErrorValue, Value},
};
use crate::formatters::{Formatter, JsonFormatter};
use crate::sinks::ConsoleSink;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// A named, leveled logger.
///
/// Calls below the logger's level are no-ops. `warn` and `error` hand back
/// the first error found in the arguments so a call site can log an error
/// and propagate it in one step. `fatal` never returns.
pub trait Logger: Send + Sync {
    fn name(&self) -> &str;
    fn level(&self) -> LogLevel;
    fn set_level(&self, level: LogLevel);
    fn set_formatter(&self, formatter: Arc<dyn Formatter>);

    /// Format and write a record if `level` passes the threshold
    fn log(&self, level: LogLevel, msg: &str, args: &[Value]);

    #[inline]
    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    fn is_trace(&self) -> bool {
        self.is_enabled(LogLevel::Trace)
    }

    fn is_debug(&self) -> bool {
        self.is_enabled(LogLevel::Debug)
    }

    fn is_info(&self) -> bool {
        self.is_enabled(LogLevel::Info)
    }

    fn is_warn(&self) -> bool {
        self.is_enabled(LogLevel::Warn)
    }

    fn trace(&self, msg: &str, args: &[Value]) {
        self.log(LogLevel::Trace, msg, args);
    }

    fn debug(&self, msg: &str, args: &[Value]) {
        self.log(LogLevel::Debug, msg, args);
    }

    fn info(&self, msg: &str, args: &[Value]) {
        self.log(LogLevel::Info, msg, args);
    }

    /// Log a warning; returns the first error argument whether or not the
    /// record was written
    fn warn(&self, msg: &str, args: &[Value]) -> Option<ErrorValue> {
        self.log(LogLevel::Warn, msg, args);
        first_error(args)
    }

    /// Log an error; returns the first error argument
    fn error(&self, msg: &str, args: &[Value]) -> Option<ErrorValue> {
        self.log(LogLevel::Error, msg, args);
        first_error(args)
    }

    /// Write the record regardless of level, then panic
    fn fatal(&self, msg: &str, args: &[Value]) -> !;
}

/// First error among the arguments
pub fn first_error(args: &[Value]) -> Option<ErrorValue> {
    args.iter().find_map(Value::as_error).cloned()
}

/// Logger writing through a formatter into a sink
pub struct DefaultLogger {
    name: String,
    level: AtomicU8,
    formatter: RwLock<Arc<dyn Formatter>>,
    sink: Arc<dyn Sink>,
    metrics: Arc<LoggerMetrics>,
}

impl DefaultLogger {
    pub fn new(
        name: impl Into<String>,
        level: LogLevel,
        formatter: Arc<dyn Formatter>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(level as u8),
            formatter: RwLock::new(formatter),
            sink,
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn formatter(&self) -> Arc<dyn Formatter> {
        Arc::clone(&*self.formatter.read())
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    fn write(&self, level: LogLevel, msg: &str, args: &[Value]) {
        let formatter = self.formatter();
        let mut buf = pool().acquire();
        formatter.format(&mut buf, level, msg, args);

        match self.sink.write_record(&buf) {
            Ok(()) => {
                self.metrics.record_written();
            }
            Err(e) => {
                self.metrics.record_write_error();
                eprintln!(
                    "[LOGGER ERROR] Sink '{}' failed for logger '{}': {}",
                    self.sink.name(),
                    self.name,
                    e
                );
            }
        }
    }
}

impl Logger for DefaultLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    fn set_formatter(&self, formatter: Arc<dyn Formatter>) {
        *self.formatter.write() = formatter;
    }

    fn log(&self, level: LogLevel, msg: &str, args: &[Value]) {
        if !self.is_enabled(level) {
            self.metrics.record_filtered();
            return;
        }
        self.write(level, msg, args);
    }

    fn fatal(&self, msg: &str, args: &[Value]) -> ! {
        self.write(LogLevel::Fatal, msg, args);
        if let Err(e) = self.sink.flush() {
            eprintln!("[LOGGER ERROR] Sink '{}' flush failed: {}", self.sink.name(), e);
        }
        panic!("exit due to fatal error: {}", msg);
    }
}

/// Builder for constructing a [`DefaultLogger`] with a fluent API
///
/// # Example
/// ```
/// use rust_kv_logger::prelude::*;
/// use std::sync::Arc;
///
/// let sink = MemorySink::new();
/// let logger = DefaultLogger::builder("app")
///     .level(LogLevel::Debug)
///     .sink(Arc::new(sink.clone()))
///     .build();
///
/// logger.info("ready", &args!["port", 8080]);
/// assert_eq!(sink.len(), 1);
/// ```
pub struct LoggerBuilder {
    name: String,
    level: LogLevel,
    formatter: Option<Arc<dyn Formatter>>,
    sink: Option<Arc<dyn Sink>>,
}

impl LoggerBuilder {
    /// Create a builder: level Info, JSON formatter, stdout
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: LogLevel::Info,
            formatter: None,
            sink: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> DefaultLogger {
        let formatter = self
            .formatter
            .unwrap_or_else(|| Arc::new(JsonFormatter::new(self.name.clone())));
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(ConsoleSink::stdout()));
        DefaultLogger::new(self.name, self.level, formatter, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::core::LoggerError;
    use crate::sinks::MemorySink;
    use std::fmt;

    #[derive(Debug)]
    struct Timeout;

    impl fmt::Display for Timeout {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "timeout")
        }
    }

    impl std::error::Error for Timeout {}

    struct RejectingSink;

    impl Sink for RejectingSink {
        fn write_record(&self, _record: &[u8]) -> crate::core::Result<()> {
            Err(LoggerError::sink("rejected"))
        }

        fn flush(&self) -> crate::core::Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "rejecting"
        }
    }

    fn logger(level: LogLevel) -> (DefaultLogger, MemorySink) {
        let sink = MemorySink::new();
        let logger = DefaultLogger::builder("test")
            .level(level)
            .sink(Arc::new(sink.clone()))
            .build();
        (logger, sink)
    }

    #[test]
    fn test_level_threshold() {
        let (logger, sink) = logger(LogLevel::Warn);
        logger.debug("d", &[]);
        logger.info("i", &[]);
        assert_eq!(sink.len(), 0);
        assert_eq!(logger.metrics().filtered_count(), 2);

        logger.warn("w", &[]);
        logger.error("e", &[]);
        assert_eq!(sink.len(), 2);
        assert_eq!(logger.metrics().written_count(), 2);
    }

    #[test]
    fn test_all_and_off() {
        let (logger, sink) = logger(LogLevel::All);
        logger.trace("t", &[]);
        assert_eq!(sink.len(), 1);

        logger.set_level(LogLevel::Off);
        assert_eq!(logger.level(), LogLevel::Off);
        logger.error("e", &[]);
        assert_eq!(sink.len(), 1);
        assert!(!logger.is_warn());
    }

    #[test]
    fn test_warn_returns_error_argument() {
        let (logger, _sink) = logger(LogLevel::Warn);
        let err = ErrorValue::new(Timeout);
        let shared = Arc::clone(err.error());

        let returned = logger.warn("slow", &args!["err", err]);
        assert!(returned.map_or(false, |e| e.same_error(&shared)));
        assert!(logger.warn("slow", &args!["k", 1]).is_none());
    }

    #[test]
    fn test_warn_returns_error_when_filtered() {
        let (logger, sink) = logger(LogLevel::Error);
        let returned = logger.warn("slow", &args!["err", Value::error(Timeout)]);
        assert_eq!(sink.len(), 0);
        assert_eq!(returned.map(|e| e.to_string()), Some("timeout".to_string()));
    }

    #[test]
    fn test_error_returns_first_error() {
        let (logger, _sink) = logger(LogLevel::Error);
        let returned = logger.error(
            "failed",
            &args!["first", Value::error(Timeout), "second", Value::error(std::io::Error::other("io"))],
        );
        assert_eq!(returned.map(|e| e.to_string()), Some("timeout".to_string()));
        assert!(logger.error("failed", &[]).is_none());
    }

    #[test]
    fn test_fatal_writes_then_panics() {
        let (logger, sink) = logger(LogLevel::Off);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.fatal("cannot continue", &args!["code", 3]);
        }));
        assert!(result.is_err());
        assert_eq!(sink.len(), 1);
        assert!(sink.lines()[0].contains(r#""l":"FTL""#));
    }

    #[test]
    fn test_set_formatter() {
        let (logger, sink) = logger(LogLevel::Info);
        logger.set_formatter(Arc::new(crate::formatters::TextFormatter::new("test")));
        logger.info("hello", &[]);
        assert!(sink.lines()[0].contains("m=\"hello\""));
        assert_eq!(logger.formatter().kind(), "text");
    }

    #[test]
    fn test_sink_failure_counted() {
        let logger = DefaultLogger::builder("test")
            .sink(Arc::new(RejectingSink))
            .build();
        logger.info("lost", &[]);
        assert_eq!(logger.metrics().write_error_count(), 1);
        assert_eq!(logger.metrics().written_count(), 0);
    }
}
