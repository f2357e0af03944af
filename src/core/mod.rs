//! Core logger types and traits

pub mod callstack;
pub mod config;
pub mod error;
pub mod internal;
pub mod keys;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod null_logger;
pub mod pool;
pub mod registry;
pub mod sink;
pub mod theme;
pub mod timestamp;
pub mod value;

pub use callstack::{CallstackResolver, Frame, IgnoreFilter, SourceLine};
pub use config::{Config, FormatOptions, LevelMap, NamePattern, Settings};
pub use error::{LoggerError, Result};
pub use internal::{internal_log, reset_internal_logger, set_internal_logger};
pub use log_level::LogLevel;
pub use logger::{first_error, DefaultLogger, Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use null_logger::NullLogger;
pub use pool::{BufferPool, PooledBuffer};
pub use registry::{Registry, DEFAULT_LOGGER_NAME};
pub use sink::Sink;
pub use theme::Theme;
pub use timestamp::TimestampFormat;
pub use value::{ErrorValue, StructuredValue, Value};
