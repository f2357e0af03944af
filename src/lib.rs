//! # Rust KV Logger
//!
//! A structured, leveled logging library. Every call carries a message and
//! a flat list of alternating keys and values, rendered by a pluggable
//! formatter into one newline-terminated record.
//!
//! ## Features
//!
//! - **Machine output**: compact single-line JSON with fixed reserved fields
//! - **Developer output**: colorized, column-aware lines with the call site
//!   and surrounding source for warnings and errors
//! - **Name patterns**: per-logger levels from `KVLOG` with `*` wildcards
//! - **Forgiving**: malformed calls show up in the output instead of crashing
//!
//! ```
//! use rust_kv_logger::prelude::*;
//! use std::sync::Arc;
//!
//! let sink = MemorySink::new();
//! let logger = DefaultLogger::builder("app").sink(Arc::new(sink.clone())).build();
//!
//! logger.info("Request processed", &args!["status", 200, "path", "/api/users"]);
//! assert!(sink.lines()[0].contains(r#""status":200"#));
//! ```

pub mod core;
pub mod formatters;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::args;
    pub use crate::core::{
        Config, DefaultLogger, ErrorValue, LogLevel, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, NullLogger, Registry, Result, Sink, TimestampFormat, Value,
    };
    pub use crate::formatters::{Formatter, HappyFormatter, JsonFormatter, TextFormatter};
    pub use crate::sinks::{ConsoleSink, MemorySink, WriterSink};
}

pub use crate::core::registry::{debug, default_logger, error, fatal, info, logger, trace, warn};
pub use crate::core::{
    CallstackResolver, Config, DefaultLogger, ErrorValue, Frame, LogLevel, Logger, LoggerBuilder,
    LoggerError, LoggerMetrics, NullLogger, Registry, Result, Settings, Sink, StructuredValue,
    Theme, TimestampFormat, Value,
};
pub use crate::formatters::{Formatter, FormatterFactory, HappyFormatter, JsonFormatter, TextFormatter};
pub use crate::sinks::{ConsoleSink, MemorySink, WriterSink};
