//! Errors of this crate.
use thiserror::Error;

/// Failed lookup in a [`Record`](crate::record::Record).
#[derive(Error, Debug)]
pub enum CoreError {
    /// No value under the key.
    #[error("no record entry {0:?}")]
    RecordKeyError(String),

    /// The value under the key has another type.
    #[error("record entry {key:?} is {found}, not {expected}")]
    RecordValueTypeError {
        /// Key looked up.
        key: String,
        /// Requested type.
        expected: &'static str,
        /// Stored type.
        found: &'static str,
    },
}
