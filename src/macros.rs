//! Logging macros for ergonomic key/value calls.
//!
//! A log call takes a message followed by a flat list alternating keys and
//! values. [`args!`](crate::args) builds that list from anything that
//! converts into a [`Value`](crate::core::Value); the level macros wrap it.
//!
//! # Examples
//!
//! ```
//! use rust_kv_logger::prelude::*;
//! use rust_kv_logger::info;
//! use std::sync::Arc;
//!
//! let sink = MemorySink::new();
//! let logger = DefaultLogger::builder("app").sink(Arc::new(sink.clone())).build();
//!
//! // Message only
//! info!(logger, "Server started");
//!
//! // With key/value pairs
//! let port = 8080;
//! info!(logger, "Server listening", "port", port, "tls", true);
//! assert_eq!(sink.len(), 2);
//! ```

/// Build the argument list of a log call.
///
/// Expands to an array of [`Value`](crate::core::Value), so `&args![...]`
/// can be passed wherever a `&[Value]` is expected.
///
/// ```
/// use rust_kv_logger::{args, Value};
///
/// let values = args!["user", "ann", "attempts", 3];
/// assert_eq!(values.len(), 4);
/// assert!(matches!(values[3], Value::Int(3)));
/// ```
#[macro_export]
macro_rules! args {
    () => {{
        let empty: [$crate::core::Value; 0] = [];
        empty
    }};
    ($($x:expr),+ $(,)?) => {
        [$($crate::core::Value::from($x)),+]
    };
}

/// Log at an explicit level.
///
/// ```
/// # use rust_kv_logger::prelude::*;
/// # let logger = DefaultLogger::builder("app").sink(std::sync::Arc::new(MemorySink::new())).build();
/// use rust_kv_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Request failed", "status", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::core::Logger as _;
        $logger.log($level, $msg, &$crate::args![$($arg),*])
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_kv_logger::prelude::*;
/// # let logger = DefaultLogger::builder("app").level(LogLevel::Trace).sink(std::sync::Arc::new(MemorySink::new())).build();
/// use rust_kv_logger::trace;
/// trace!(logger, "Entering calculate()", "depth", 2);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::core::Logger as _;
        $logger.trace($msg, &$crate::args![$($arg),*])
    }};
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::core::Logger as _;
        $logger.debug($msg, &$crate::args![$($arg),*])
    }};
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::core::Logger as _;
        $logger.info($msg, &$crate::args![$($arg),*])
    }};
}

/// Log a warning; evaluates to the first error argument, if any.
///
/// # Examples
///
/// ```
/// # use rust_kv_logger::prelude::*;
/// # let logger = DefaultLogger::builder("app").sink(std::sync::Arc::new(MemorySink::new())).build();
/// use rust_kv_logger::warn;
/// let err = std::io::Error::other("disk almost full");
/// let returned = warn!(logger, "Low disk space", "err", Value::error(err));
/// assert!(returned.is_some());
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::core::Logger as _;
        $logger.warn($msg, &$crate::args![$($arg),*])
    }};
}

/// Log an error; evaluates to the first error argument, if any.
#[macro_export]
macro_rules! error {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::core::Logger as _;
        $logger.error($msg, &$crate::args![$($arg),*])
    }};
}

/// Log a fatal message and panic.
///
/// # Examples
///
/// ```should_panic
/// # use rust_kv_logger::prelude::*;
/// # let logger = DefaultLogger::builder("app").sink(std::sync::Arc::new(MemorySink::new())).build();
/// use rust_kv_logger::fatal;
/// fatal!(logger, "Unable to recover", "reason", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $msg:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::core::Logger as _;
        $logger.fatal($msg, &$crate::args![$($arg),*])
    }};
}

#[cfg(test)]
mod tests {
    use crate::core::{DefaultLogger, LogLevel, Value};
    use crate::sinks::MemorySink;
    use std::sync::Arc;

    fn logger(level: LogLevel) -> (DefaultLogger, MemorySink) {
        let sink = MemorySink::new();
        let logger = DefaultLogger::builder("macros")
            .level(level)
            .sink(Arc::new(sink.clone()))
            .build();
        (logger, sink)
    }

    #[test]
    fn test_args_macro() {
        let empty = args![];
        assert!(empty.is_empty());

        let values = args!["a", 1u8, "b", -2, "c", 1.5, "d", true,];
        assert_eq!(values.len(), 8);
        assert!(matches!(values[1], Value::Uint(1)));
        assert!(matches!(values[3], Value::Int(-2)));
        assert!(matches!(values[7], Value::Bool(true)));
    }

    #[test]
    fn test_log_macro() {
        let (logger, sink) = logger(LogLevel::Info);
        log!(logger, LogLevel::Info, "Test message");
        log!(logger, LogLevel::Debug, "Filtered", "k", 1);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_level_macros() {
        let (logger, sink) = logger(LogLevel::Trace);
        trace!(logger, "t");
        debug!(logger, "d", "count", 5);
        info!(logger, "i", "items", 100);
        assert!(warn!(logger, "w").is_none());
        assert!(error!(logger, "e", "err", Value::error(std::io::Error::other("x"))).is_some());
        assert_eq!(sink.len(), 5);
        assert!(sink.lines()[2].contains(r#""items":100"#));
    }

    #[test]
    fn test_macros_on_shared_logger() {
        let (logger, sink) = logger(LogLevel::Info);
        let shared: Arc<dyn crate::core::Logger> = Arc::new(logger);
        info!(shared, "via arc", "k", "v");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    #[should_panic(expected = "exit due to fatal error")]
    fn test_fatal_macro() {
        let (logger, _sink) = logger(LogLevel::Off);
        fatal!(logger, "Critical system failure");
    }
}
