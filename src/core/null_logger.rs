//! Logger for names configured Off

use super::log_level::LogLevel;
use super::logger::{first_error, Logger};
use super::value::{ErrorValue, Value};
use crate::formatters::Formatter;
use std::sync::Arc;

/// Does nothing and allocates nothing; handed out instead of a real logger
/// for disabled names.
///
/// `warn` and `error` still return the first error argument and `fatal`
/// still panics, so code behaves the same whether logging is on or off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

static NULL_LOGGER: NullLogger = NullLogger;

impl NullLogger {
    /// The shared instance
    pub fn instance() -> &'static NullLogger {
        &NULL_LOGGER
    }

    /// The shared instance behind an `Arc<dyn Logger>`
    pub fn shared() -> Arc<dyn Logger> {
        use std::sync::OnceLock;
        static SHARED: OnceLock<Arc<dyn Logger>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(NullLogger)))
    }
}

impl Logger for NullLogger {
    fn name(&self) -> &str {
        ""
    }

    fn level(&self) -> LogLevel {
        LogLevel::Off
    }

    fn set_level(&self, _level: LogLevel) {}

    fn set_formatter(&self, _formatter: Arc<dyn Formatter>) {}

    #[inline]
    fn log(&self, _level: LogLevel, _msg: &str, _args: &[Value]) {}

    #[inline]
    fn is_enabled(&self, _level: LogLevel) -> bool {
        false
    }

    fn warn(&self, _msg: &str, args: &[Value]) -> Option<ErrorValue> {
        first_error(args)
    }

    fn error(&self, _msg: &str, args: &[Value]) -> Option<ErrorValue> {
        first_error(args)
    }

    fn fatal(&self, msg: &str, _args: &[Value]) -> ! {
        panic!("exit due to fatal error: {}", msg);
    }
}
