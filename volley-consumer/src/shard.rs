use std::sync::Arc;
use std::time::Duration;

use volley_journal::{Checkpoint, Envelope, JournalStore, Publisher};
use volley_message::{Message, Offset};

use crate::app::{ShardHandler, ShardSpec};
use crate::error::ShardError;
use crate::shutdown::Shutdown;
use crate::state::StateRecord;

/// The default time a shard waits before retrying a failed transaction.
pub const SHARD_RETRY_BACKOFF: Duration = Duration::from_millis(500);
/// The number of consecutive failed attempts at a transaction after which the
/// shard gives up and stops.
pub const MAX_TXN_ATTEMPTS: usize = 5;

/// Runs the transaction loop of a single shard.
///
/// The shard reads one envelope from its source partition at a time, each
/// envelope being processed as its own transaction which commits the shard's
/// state, its next offset and any published messages atomically.
pub(crate) struct ShardActor<J, H>
where
    J: JournalStore,
    H: ShardHandler,
{
    spec: ShardSpec,
    store: Arc<J>,
    handler: H,
    publisher: Publisher<J>,
    shutdown: Shutdown,
    retry_backoff: Duration,

    state: H::State,
    /// The encoded state of the last committed checkpoint.
    committed_state: Vec<u8>,
    /// The next offset of the source partition to be read.
    offset: Offset,
}

impl<J, H> ShardActor<J, H>
where
    J: JournalStore,
    H: ShardHandler,
{
    /// Restores the shard from its last checkpoint and initialises the handler.
    pub(crate) async fn recover(
        spec: ShardSpec,
        store: Arc<J>,
        mut handler: H,
        shutdown: Shutdown,
        retry_backoff: Duration,
    ) -> Result<Self, ShardError<J::Error>> {
        let checkpoint = store
            .load_checkpoint(&spec.id)
            .await
            .map_err(ShardError::Journal)?;

        let (state, committed_state, offset) = match checkpoint {
            Some(checkpoint) => {
                let state = H::State::from_bytes(&checkpoint.state)?;
                (state, checkpoint.state, checkpoint.offset)
            },
            None => {
                let state = H::State::default();
                let committed_state = state.to_bytes()?;
                (state, committed_state, 0)
            },
        };

        info!(
            shard_id = %spec.id,
            source = %spec.source,
            offset = offset,
            "Recovered shard.",
        );

        let publisher = Publisher::new(store.clone());
        handler
            .init_shard(&spec, &state, &publisher)
            .await
            .map_err(ShardError::Application)?;

        Ok(Self {
            spec,
            store,
            handler,
            publisher,
            shutdown,
            retry_backoff,
            state,
            committed_state,
            offset,
        })
    }

    /// Processes envelopes until the shutdown is triggered.
    ///
    /// A shutdown observed while waiting for the next envelope returns without
    /// committing anything further.
    pub(crate) async fn run(mut self) -> Result<(), ShardError<J::Error>> {
        loop {
            let envelope = tokio::select! {
                biased;
                _ = self.shutdown.wait() => break,
                envelope = self.store.read(&self.spec.source, self.offset) => {
                    envelope.map_err(ShardError::Journal)?
                },
            };

            self.process_with_retries(envelope).await?;
        }

        debug!(shard_id = %self.spec.id, offset = self.offset, "Shutting down shard.");

        Ok(())
    }

    async fn process_with_retries(
        &mut self,
        envelope: Envelope,
    ) -> Result<(), ShardError<J::Error>> {
        let mut attempts = 0;

        loop {
            let err = match self.process(&envelope).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            self.abort()?;
            attempts += 1;

            if attempts >= MAX_TXN_ATTEMPTS {
                error!(
                    shard_id = %self.spec.id,
                    offset = envelope.offset,
                    attempts = attempts,
                    error = ?err,
                    "Giving up on transaction, stopping shard.",
                );
                return Err(err);
            }

            warn!(
                shard_id = %self.spec.id,
                offset = envelope.offset,
                attempts = attempts,
                error = ?err,
                "Transaction failed, retrying after backoff.",
            );

            tokio::select! {
                biased;
                // The envelope is redelivered when the shard next starts.
                _ = self.shutdown.wait() => return Ok(()),
                _ = tokio::time::sleep(self.retry_backoff) => {},
            }
        }
    }

    /// Processes a single envelope as one transaction.
    async fn process(&mut self, envelope: &Envelope) -> Result<(), ShardError<J::Error>> {
        match H::Message::decode(&envelope.frame) {
            Ok(msg) if msg.is_acknowledgement() => {
                trace!(
                    shard_id = %self.spec.id,
                    offset = envelope.offset,
                    "Skipping acknowledgement.",
                );
            },
            Ok(msg) => {
                self.handler
                    .consume_message(&self.spec, &mut self.state, msg, &mut self.publisher)
                    .map_err(ShardError::Application)?;
            },
            Err(e) => {
                error!(
                    shard_id = %self.spec.id,
                    partition = %envelope.partition,
                    offset = envelope.offset,
                    error = ?e,
                    "Skipping frame which could not be decoded.",
                );
            },
        }

        self.handler
            .finalize_txn(&self.spec, &mut self.state, &mut self.publisher)
            .map_err(ShardError::Application)?;

        let frames = self
            .publisher
            .take_pending::<H::Message>()
            .map_err(ShardError::Publish)?;
        let num_frames = frames.len();

        let state = self.state.to_bytes()?;
        let checkpoint = Checkpoint {
            offset: envelope.next_offset,
            state: state.clone(),
        };

        self.store
            .commit(&self.spec.id, checkpoint, frames)
            .await
            .map_err(ShardError::Journal)?;

        self.committed_state = state;
        self.offset = envelope.next_offset;

        trace!(
            shard_id = %self.spec.id,
            offset = self.offset,
            num_frames = num_frames,
            "Committed transaction.",
        );

        Ok(())
    }

    /// Discards the open transaction and restores the last committed state.
    fn abort(&mut self) -> Result<(), ShardError<J::Error>> {
        self.publisher.abort();
        self.state = H::State::from_bytes(&self.committed_state)?;
        Ok(())
    }
}
