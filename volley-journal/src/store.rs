use std::error::Error;

use async_trait::async_trait;
use bytes::Bytes;
use volley_message::{LabelSelector, Offset, Partition, ShardId};

#[derive(Debug, Clone)]
/// A single frame read from a partition.
pub struct Envelope {
    pub partition: Partition,
    /// The offset the frame was read at.
    pub offset: Offset,
    /// The offset of the frame following this one.
    pub next_offset: Offset,
    pub frame: Bytes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The committed progress of a shard.
///
/// A shard restored from its checkpoint resumes reading its source partition from
/// `offset` with its state decoded from `state`.
pub struct Checkpoint {
    /// The next offset of the source partition to be read.
    pub offset: Offset,
    /// The encoded shard state.
    pub state: Vec<u8>,
}

#[async_trait]
/// The durable, partitioned journals applications publish to and consume from.
///
/// Implementations must guarantee that, within a partition, frames are read back
/// in the order they were appended and that appended frames survive restarts.
pub trait JournalStore: Send + Sync + 'static {
    type Error: Error + Send + Sync + 'static;

    /// Lists all partitions whose labels match the given selector.
    async fn list(&self, selector: &LabelSelector) -> Result<Vec<Partition>, Self::Error>;

    /// Appends a single frame to the partition.
    ///
    /// The frame is durably sequenced once this returns, the returned offset is
    /// the offset the frame was written at.
    async fn append(&self, partition: &Partition, frame: Bytes) -> Result<Offset, Self::Error>;

    /// Reads the frame at the given offset of a partition.
    ///
    /// If no frame has been written at the offset yet, this waits until one is.
    /// The returned future must be safe to drop at any point.
    async fn read(&self, partition: &Partition, offset: Offset) -> Result<Envelope, Self::Error>;

    /// Loads the last committed checkpoint of a shard.
    async fn load_checkpoint(&self, shard_id: &ShardId) -> Result<Option<Checkpoint>, Self::Error>;

    /// Atomically appends all frames and records the shard's checkpoint.
    ///
    /// Either every frame is appended and the checkpoint is recorded, or neither
    /// takes effect.
    async fn commit(
        &self,
        shard_id: &ShardId,
        checkpoint: Checkpoint,
        frames: Vec<(Partition, Bytes)>,
    ) -> Result<(), Self::Error>;
}
