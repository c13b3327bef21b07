use async_trait::async_trait;
use bytes::Bytes;
use volley_message::{LabelSelector, Offset, Partition, ShardId};

use crate::store::{Checkpoint, Envelope, JournalStore};

/// A wrapping type around another `JournalStore` implementation that
/// logs all the activity going into and out of the store.
///
/// Wrap a store with this when tracing which frames a shard reads and commits.
pub struct InstrumentedStore<J: JournalStore>(pub J);

#[async_trait]
impl<J: JournalStore> JournalStore for InstrumentedStore<J> {
    type Error = J::Error;

    async fn list(&self, selector: &LabelSelector) -> Result<Vec<Partition>, Self::Error> {
        info!(selector = ?selector, "list");
        self.0.list(selector).await
    }

    async fn append(&self, partition: &Partition, frame: Bytes) -> Result<Offset, Self::Error> {
        info!(partition = %partition, frame_len = frame.len(), "append");
        self.0.append(partition, frame).await
    }

    async fn read(&self, partition: &Partition, offset: Offset) -> Result<Envelope, Self::Error> {
        info!(partition = %partition, offset = offset, "read");
        self.0.read(partition, offset).await
    }

    async fn load_checkpoint(&self, shard_id: &ShardId) -> Result<Option<Checkpoint>, Self::Error> {
        info!(shard_id = %shard_id, "load_checkpoint");
        self.0.load_checkpoint(shard_id).await
    }

    async fn commit(
        &self,
        shard_id: &ShardId,
        checkpoint: Checkpoint,
        frames: Vec<(Partition, Bytes)>,
    ) -> Result<(), Self::Error> {
        info!(
            shard_id = %shard_id,
            offset = checkpoint.offset,
            state_len = checkpoint.state.len(),
            num_frames = frames.len(),
            "commit",
        );
        self.0.commit(shard_id, checkpoint, frames).await
    }
}
