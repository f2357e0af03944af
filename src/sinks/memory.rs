//! In-memory sink for capturing output

use crate::core::{Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Keeps every record; clones share the same storage
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in write order
    pub fn records(&self) -> Vec<Vec<u8>> {
        self.records.lock().clone()
    }

    /// Records as text, without their trailing newline
    pub fn lines(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| String::from_utf8_lossy(r).trim_end_matches('\n').to_string())
            .collect()
    }

    /// Everything written, concatenated
    pub fn contents(&self) -> String {
        let records = self.records.lock();
        let mut out = String::new();
        for record in records.iter() {
            out.push_str(&String::from_utf8_lossy(record));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write_record(&self, record: &[u8]) -> Result<()> {
        self.records.lock().push(record.to_vec());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
