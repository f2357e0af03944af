//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A sink failed to open, write or flush
    #[error("sink '{sink}' failed while {operation}: {source}")]
    SinkIo {
        operation: &'static str,
        sink: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A sink refused a record without an underlying IO error
    #[error("sink error: {0}")]
    Sink(String),

    /// Bad token in one of the configuration strings
    #[error("invalid {component} configuration: {message}")]
    InvalidConfiguration { component: String, message: String },

    #[error("unknown level '{0}'")]
    UnknownLevel(String),
}

impl LoggerError {
    pub fn sink_io(operation: &'static str, sink: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::SinkIo {
            operation,
            sink: sink.into(),
            source,
        }
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        LoggerError::Sink(msg.into())
    }

    /// Diagnostic for a configuration string; `component` names the string
    /// (`levels`, `format`, `colors`, `timestamp`)
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn unknown_level(token: impl Into<String>) -> Self {
        LoggerError::UnknownLevel(token.into())
    }

    /// Whether the error came from parsing configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. } | LoggerError::UnknownLevel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors() {
        let err = LoggerError::config("colors", "unknown color 'purple'");
        assert_eq!(
            err.to_string(),
            "invalid colors configuration: unknown color 'purple'"
        );
        assert!(err.is_config());

        let err = LoggerError::unknown_level("oy");
        assert_eq!(err.to_string(), "unknown level 'oy'");
        assert!(err.is_config());
    }

    #[test]
    fn test_sink_errors() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = LoggerError::sink_io("writing record", "stdout", io_err);
        assert_eq!(
            err.to_string(),
            "sink 'stdout' failed while writing record: pipe closed"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_config());

        let err: LoggerError = std::io::Error::other("disk full").into();
        assert!(matches!(err, LoggerError::Io(_)));
    }
}
