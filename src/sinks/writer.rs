//! Sink over any `io::Write`

use crate::core::{LoggerError, Result, Sink};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes records from many threads onto one writer
pub struct WriterSink {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterSink {
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            name: "writer".to_string(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Append to a file, creating it when missing
    pub fn append_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LoggerError::sink_io("opening log file", path.display().to_string(), e))?;
        Ok(Self::new(BufWriter::new(file)).with_name(path.display().to_string()))
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Sink for WriterSink {
    fn write_record(&self, record: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer
            .write_all(record)
            .map_err(|e| LoggerError::sink_io("writing record", self.name.clone(), e))
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_append_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");

        let sink = WriterSink::append_file(&path).unwrap();
        sink.write_record(b"first\n").unwrap();
        sink.write_record(b"second\n").unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_write_error_has_context() {
        let sink = WriterSink::new(BrokenPipe).with_name("pipe");
        let err = sink.write_record(b"lost\n").unwrap_err();
        assert!(matches!(err, LoggerError::SinkIo { .. }));
        assert!(err.to_string().contains("pipe"));
    }
}
