//! Errors in the library.
use thiserror::Error;

/// Errors raised by [`Registry`](crate::Registry).
#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    /// An environment with the same id is already registered.
    #[error("environment id already registered: {0}")]
    DuplicateId(String),

    /// No environment is registered under the id.
    #[error("unknown environment id: {0}")]
    UnknownId(String),

    /// The name is not a movement primitive variant.
    #[error("unknown variant: {0}, expected one of ProMP, DMP, ReplanDMP, ProDMP, ReplanProDMP")]
    UnknownVariant(String),
}
