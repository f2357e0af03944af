//! The library's own diagnostics logger
//!
//! Bad configuration tokens, malformed keys, values that cannot be encoded
//! and unreadable source files are reported here instead of being returned
//! to callers. The logger is created lazily, writes to stderr at level Error
//! (text on a terminal, JSON otherwise) and can be replaced, for example to
//! capture diagnostics in tests.

use super::log_level::LogLevel;
use super::logger::{DefaultLogger, Logger};
use crate::formatters::{Formatter, JsonFormatter, TextFormatter};
use crate::sinks::ConsoleSink;
use parking_lot::RwLock;
use std::io::IsTerminal;
use std::sync::Arc;

/// Name the internal logger logs under
pub const INTERNAL_LOGGER_NAME: &str = "__kvlog";

static INTERNAL: RwLock<Option<Arc<dyn Logger>>> = parking_lot::const_rwlock(None);

/// The internal logger, created on first use
pub fn internal_log() -> Arc<dyn Logger> {
    if let Some(logger) = INTERNAL.read().as_ref() {
        return Arc::clone(logger);
    }
    let mut slot = INTERNAL.write();
    Arc::clone(slot.get_or_insert_with(default_internal_logger))
}

/// Replace the internal logger, returning the previous one
pub fn set_internal_logger(logger: Arc<dyn Logger>) -> Option<Arc<dyn Logger>> {
    INTERNAL.write().replace(logger)
}

/// Go back to the default stderr logger on next use
pub fn reset_internal_logger() {
    INTERNAL.write().take();
}

fn default_internal_logger() -> Arc<dyn Logger> {
    let formatter: Arc<dyn Formatter> = if std::io::stderr().is_terminal() {
        Arc::new(TextFormatter::new(INTERNAL_LOGGER_NAME))
    } else {
        Arc::new(JsonFormatter::new(INTERNAL_LOGGER_NAME))
    };
    Arc::new(DefaultLogger::new(
        INTERNAL_LOGGER_NAME,
        LogLevel::Error,
        formatter,
        Arc::new(ConsoleSink::stderr()),
    ))
}
