use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::watch;
use volley_message::{LabelSelector, Offset, Partition, ShardId};

use crate::error::JournalError;
use crate::store::{Checkpoint, Envelope, JournalStore};

struct PartitionLog {
    partition: Partition,
    frames: Vec<Bytes>,
    /// Broadcasts the length of the log whenever a frame is appended.
    len_tx: watch::Sender<usize>,
}

impl PartitionLog {
    fn new(partition: Partition) -> Self {
        let (len_tx, _) = watch::channel(0);

        Self {
            partition,
            frames: Vec::new(),
            len_tx,
        }
    }

    fn push(&mut self, frame: Bytes) -> Offset {
        let offset = self.frames.len() as Offset;
        self.frames.push(frame);
        offset
    }

    fn notify_readers(&self) {
        self.len_tx.send_replace(self.frames.len());
    }
}

#[derive(Default)]
struct Inner {
    partitions: BTreeMap<String, PartitionLog>,
    checkpoints: HashMap<ShardId, Vec<Checkpoint>>,
}

#[derive(Default)]
/// A non-durable, in-memory journal store.
///
/// Every partition is a vector of frames and every shard keeps its full history
/// of checkpoints, which makes the store convenient for inspecting what an
/// application has done. Failures can be injected for the next appends or commits
/// in order to exercise the transaction abort paths.
pub struct MemJournalStore {
    inner: RwLock<Inner>,
    failing_appends: AtomicUsize,
    failing_commits: AtomicUsize,
}

impl MemJournalStore {
    /// Creates a new, empty partition.
    ///
    /// If a partition with the same name already exists this is a no-op.
    pub fn create_partition(&self, partition: Partition) {
        let mut lock = self.inner.write();
        lock.partitions
            .entry(partition.name().to_string())
            .or_insert_with(|| PartitionLog::new(partition));
    }

    /// Removes a partition and all of its frames.
    pub fn remove_partition(&self, name: &str) -> bool {
        self.inner.write().partitions.remove(name).is_some()
    }

    /// Gets a copy of every frame written to the partition.
    pub fn frames(&self, partition: &Partition) -> Vec<Bytes> {
        self.inner
            .read()
            .partitions
            .get(partition.name())
            .map(|log| log.frames.clone())
            .unwrap_or_default()
    }

    /// Gets every checkpoint committed by a shard, oldest first.
    pub fn checkpoint_history(&self, shard_id: &ShardId) -> Vec<Checkpoint> {
        self.inner
            .read()
            .checkpoints
            .get(shard_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes the next `n` appends fail.
    pub fn fail_next_appends(&self, n: usize) {
        self.failing_appends.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` commits fail without taking any effect.
    pub fn fail_next_commits(&self, n: usize) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl JournalStore for MemJournalStore {
    type Error = JournalError;

    async fn list(&self, selector: &LabelSelector) -> Result<Vec<Partition>, Self::Error> {
        let lock = self.inner.read();

        Ok(lock
            .partitions
            .values()
            .filter(|log| selector.matches(log.partition.labels()))
            .map(|log| log.partition.clone())
            .collect())
    }

    async fn append(&self, partition: &Partition, frame: Bytes) -> Result<Offset, Self::Error> {
        if take_failure(&self.failing_appends) {
            return Err(JournalError::InjectedFailure("append"));
        }

        let mut lock = self.inner.write();
        let log = lock
            .partitions
            .get_mut(partition.name())
            .ok_or_else(|| JournalError::UnknownPartition(partition.name().to_string()))?;

        let offset = log.push(frame);
        log.notify_readers();

        Ok(offset)
    }

    async fn read(&self, partition: &Partition, offset: Offset) -> Result<Envelope, Self::Error> {
        loop {
            let mut changes = {
                let lock = self.inner.read();
                let log = lock.partitions.get(partition.name()).ok_or_else(|| {
                    JournalError::UnknownPartition(partition.name().to_string())
                })?;

                if let Some(frame) = log.frames.get(offset as usize) {
                    return Ok(Envelope {
                        partition: log.partition.clone(),
                        offset,
                        next_offset: offset + 1,
                        frame: frame.clone(),
                    });
                }

                // Subscribing while the lock is held means no append can be missed.
                log.len_tx.subscribe()
            };

            if changes.changed().await.is_err() {
                return Err(JournalError::Closed);
            }
        }
    }

    async fn load_checkpoint(&self, shard_id: &ShardId) -> Result<Option<Checkpoint>, Self::Error> {
        let lock = self.inner.read();
        Ok(lock
            .checkpoints
            .get(shard_id)
            .and_then(|history| history.last())
            .cloned())
    }

    async fn commit(
        &self,
        shard_id: &ShardId,
        checkpoint: Checkpoint,
        frames: Vec<(Partition, Bytes)>,
    ) -> Result<(), Self::Error> {
        if take_failure(&self.failing_commits) {
            return Err(JournalError::InjectedFailure("commit"));
        }

        let mut lock = self.inner.write();

        // Validate everything up front so a bad batch leaves no partial effect.
        for (partition, _) in frames.iter() {
            if !lock.partitions.contains_key(partition.name()) {
                return Err(JournalError::UnknownPartition(partition.name().to_string()));
            }
        }

        let mut touched = Vec::new();
        for (partition, frame) in frames {
            if let Some(log) = lock.partitions.get_mut(partition.name()) {
                log.push(frame);
            }
            touched.push(partition);
        }

        lock.checkpoints
            .entry(shard_id.clone())
            .or_default()
            .push(checkpoint);

        for partition in touched {
            if let Some(log) = lock.partitions.get(partition.name()) {
                log.notify_readers();
            }
        }

        Ok(())
    }
}
