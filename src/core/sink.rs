//! Sink trait for record output destinations

use super::error::Result;

/// Destination of formatted records.
///
/// Loggers share sinks across threads, so implementations must accept
/// concurrent calls and write each record as one unit: bytes of two records
/// are never interleaved.
pub trait Sink: Send + Sync {
    /// Write one complete, newline-terminated record
    fn write_record(&self, record: &[u8]) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn name(&self) -> &str;
}
