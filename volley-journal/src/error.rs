use std::fmt::{Debug, Display};

use thiserror::Error;
use volley_message::{CodecError, MappingError};

#[derive(Debug, Error)]
/// Errors returned by the in-memory journal store.
pub enum JournalError {
    #[error("The partition {0:?} does not exist.")]
    UnknownPartition(String),

    #[error("The journal store is closed.")]
    Closed,

    #[error("Injected {0} failure.")]
    /// A failure requested through the store's failure injection hooks.
    InjectedFailure(&'static str),
}

#[derive(Debug, Error)]
pub enum PublishError<E: Display + Debug> {
    #[error("Failed to map message to a partition: {0}")]
    Mapping(#[from] MappingError),

    #[error("{0}")]
    Codec(#[from] CodecError),

    #[error("Failed to append message to the journal: {0}")]
    Journal(E),
}

#[derive(Debug, Error)]
#[error("Failed to list the partitions matching the selector: {0}")]
/// The initial listing of partitions failed, no routing can happen without it.
pub struct DiscoveryError<E: Display + Debug>(pub E);
