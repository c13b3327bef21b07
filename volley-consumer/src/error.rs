use std::fmt::{Debug, Display};

use thiserror::Error;
use volley_journal::PublishError;
use volley_message::ShardId;

#[derive(Debug, Error)]
#[error("Failed to (de)serialize state.")]
/// The shard state could not be encoded, or a checkpoint contained a state
/// record which could not be decoded.
pub struct CorruptedState;

#[derive(Debug, Error)]
pub enum ShardError<E: Display + Debug> {
    #[error("A shard with the id {0} is already running.")]
    AlreadyRunning(ShardId),

    #[error("Journal store error: {0}")]
    Journal(E),

    #[error("{0}")]
    State(#[from] CorruptedState),

    #[error("Failed to publish transaction: {0}")]
    Publish(PublishError<E>),

    #[error("Application error: {0}")]
    /// The application's handler failed to process the shard or a message.
    Application(anyhow::Error),
}
