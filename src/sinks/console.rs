//! Console sink implementation

use crate::core::{LoggerError, Result, Sink};
use std::io::{self, IsTerminal, Write};

/// Standard stream a [`ConsoleSink`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

pub struct ConsoleSink {
    target: ConsoleTarget,
}

impl ConsoleSink {
    pub fn new(target: ConsoleTarget) -> Self {
        // legacy Windows consoles need ANSI processing switched on
        #[cfg(windows)]
        {
            let _ = colored::control::set_virtual_terminal(true);
        }
        Self { target }
    }

    pub fn stdout() -> Self {
        Self::new(ConsoleTarget::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(ConsoleTarget::Stderr)
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    /// Whether the stream is attached to an interactive terminal
    pub fn is_terminal(&self) -> bool {
        match self.target {
            ConsoleTarget::Stdout => io::stdout().is_terminal(),
            ConsoleTarget::Stderr => io::stderr().is_terminal(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Sink for ConsoleSink {
    fn write_record(&self, record: &[u8]) -> Result<()> {
        // the std stream lock keeps the record in one piece
        let result = match self.target {
            ConsoleTarget::Stdout => io::stdout().lock().write_all(record),
            ConsoleTarget::Stderr => io::stderr().lock().write_all(record),
        };
        result.map_err(|e| LoggerError::sink_io("writing record", self.name(), e))
    }

    fn flush(&self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => io::stdout().flush()?,
            ConsoleTarget::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        match self.target {
            ConsoleTarget::Stdout => "stdout",
            ConsoleTarget::Stderr => "stderr",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_names() {
        assert_eq!(ConsoleSink::stdout().name(), "stdout");
        assert_eq!(ConsoleSink::stderr().name(), "stderr");
        assert_eq!(ConsoleSink::default().target(), ConsoleTarget::Stdout);
    }

    #[test]
    fn test_console_write() {
        let sink = ConsoleSink::stderr();
        assert!(sink.write_record(b"console sink test\n").is_ok());
        assert!(sink.flush().is_ok());
    }
}
