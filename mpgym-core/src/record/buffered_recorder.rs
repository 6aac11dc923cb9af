use super::{Record, Recorder};
use crate::error::CoreError;

/// Collects records in memory in the order they were written.
#[derive(Debug, Default)]
pub struct BufferedRecorder {
    records: Vec<Record>,
}

impl BufferedRecorder {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The records written so far.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The scalar under `key` of every record, e.g. the executed length of
    /// each planned trajectory.
    pub fn scalars(&self, key: &str) -> Result<Vec<f64>, CoreError> {
        self.records.iter().map(|r| r.get_scalar(key)).collect()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.records.push(record);
    }
}
