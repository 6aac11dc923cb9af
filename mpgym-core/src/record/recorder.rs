use super::Record;

/// Sink of the [`Record`]s produced while running an environment.
pub trait Recorder {
    /// Consumes one record.
    fn write(&mut self, record: Record);
}
