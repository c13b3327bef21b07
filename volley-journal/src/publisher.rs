use std::sync::Arc;

use bytes::Bytes;
use volley_message::{
    Clock,
    Flags,
    MappingFunc,
    Message,
    MessageId,
    Offset,
    Partition,
    ProducerId,
};

use crate::error::PublishError;
use crate::store::JournalStore;

/// Publishes messages to the partitions selected by a mapping function.
///
/// Messages are either published committed, in which case they are appended
/// immediately, or uncommitted, in which case they are enqueued into the
/// publisher's open transaction and only become visible once the owner of the
/// transaction commits it.
pub struct Publisher<J: JournalStore> {
    store: Arc<J>,
    producer: ProducerId,
    clock: Clock,
    pending: Vec<(Partition, Bytes)>,
}

impl<J: JournalStore> Publisher<J> {
    /// Creates a new publisher with a random producer id.
    pub fn new(store: Arc<J>) -> Self {
        Self::with_producer(store, ProducerId::random())
    }

    pub fn with_producer(store: Arc<J>, producer: ProducerId) -> Self {
        Self {
            store,
            producer,
            clock: Clock::now(),
            pending: Vec::new(),
        }
    }

    #[inline]
    pub fn producer(&self) -> ProducerId {
        self.producer
    }

    #[inline]
    /// The journal store the publisher writes to.
    pub fn store(&self) -> &Arc<J> {
        &self.store
    }

    /// Publishes a message outside of any transaction.
    ///
    /// This only returns once the message is durably sequenced within its target
    /// partition, returning the offset it was written at.
    pub async fn publish_committed<M, F>(
        &self,
        mapping: &F,
        mut msg: M,
    ) -> Result<Offset, PublishError<J::Error>>
    where
        M: Message,
        F: MappingFunc<M> + ?Sized,
    {
        msg.set_id(self.next_id(Flags::OutsideTxn));
        let partition = mapping.map(&msg)?;
        let frame = Bytes::from(msg.encode()?);

        let offset = self
            .store
            .append(&partition, frame)
            .await
            .map_err(PublishError::Journal)?;

        trace!(
            producer = %self.producer,
            partition = %partition,
            offset = offset,
            "Published committed message.",
        );

        Ok(offset)
    }

    /// Publishes a message as part of the open transaction.
    ///
    /// The message is mapped and encoded straight away, so routing and codec
    /// failures are returned here, but it is only appended when the transaction
    /// is committed. Returns the partition the message will be written to.
    pub fn publish_uncommitted<M, F>(
        &mut self,
        mapping: &F,
        mut msg: M,
    ) -> Result<Partition, PublishError<J::Error>>
    where
        M: Message,
        F: MappingFunc<M> + ?Sized,
    {
        msg.set_id(self.next_id(Flags::ContinueTxn));
        let partition = mapping.map(&msg)?;
        let frame = Bytes::from(msg.encode()?);

        self.pending.push((partition.clone(), frame));

        Ok(partition)
    }

    #[inline]
    /// Returns if the open transaction has any messages enqueued.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drains the open transaction into a batch ready to be committed.
    ///
    /// The batch contains every enqueued message in publish order, followed by an
    /// acknowledgement marker for each partition the transaction wrote to.
    pub fn take_pending<M: Message>(
        &mut self,
    ) -> Result<Vec<(Partition, Bytes)>, PublishError<J::Error>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let mut batch = std::mem::take(&mut self.pending);

        let mut acknowledged: Vec<Partition> = Vec::new();
        for (partition, _) in batch.iter() {
            if !acknowledged.contains(partition) {
                acknowledged.push(partition.clone());
            }
        }

        for partition in acknowledged {
            let mut ack = M::new_acknowledgement(&partition);
            ack.set_id(self.next_id(Flags::AckTxn));
            let frame = Bytes::from(ack.encode()?);
            batch.push((partition, frame));
        }

        Ok(batch)
    }

    /// Discards every message enqueued in the open transaction.
    pub fn abort(&mut self) {
        if !self.pending.is_empty() {
            debug!(
                producer = %self.producer,
                num_discarded = self.pending.len(),
                "Aborted open transaction.",
            );
        }

        self.pending.clear();
    }

    fn next_id(&self, flags: Flags) -> MessageId {
        MessageId::new(self.producer, self.clock.tick(), flags)
    }
}
