use async_trait::async_trait;
use volley_journal::{JournalStore, Publisher};
use volley_message::{LabelSet, Message, Partition, ShardId};

use crate::state::StateRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
/// The configuration of a single shard.
pub struct ShardSpec {
    /// The unique identity of the shard.
    pub id: ShardId,
    /// The partition the shard consumes.
    pub source: Partition,
    /// Arbitrary labels the application may use to assign roles to the shard.
    pub labels: LabelSet,
}

impl ShardSpec {
    pub fn new(id: impl Into<ShardId>, source: Partition) -> Self {
        Self {
            id: id.into(),
            source,
            labels: LabelSet::default(),
        }
    }

    /// Adds a label to the shard's spec.
    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels = self.labels.with(name, value);
        self
    }
}

/// An application consuming partitioned journals.
///
/// The application creates a [ShardHandler] for every shard which is started,
/// each handler is owned by its shard and only ever processes one transaction at
/// a time.
pub trait Application: Send + Sync + 'static {
    type Message: Message;
    type State: StateRecord;
    type Handler: ShardHandler<Message = Self::Message, State = Self::State>;

    /// Creates the handler for a newly started shard.
    fn new_handler(&self, spec: &ShardSpec) -> anyhow::Result<Self::Handler>;
}

#[async_trait]
/// The per-shard logic of an [Application].
pub trait ShardHandler: Send + 'static {
    type Message: Message;
    type State: StateRecord;

    /// Called once the shard's state has been restored and before the shard
    /// reads any messages.
    ///
    /// Anything published here must be published committed, the shard has no
    /// open transaction yet.
    async fn init_shard<J: JournalStore>(
        &mut self,
        _spec: &ShardSpec,
        _state: &Self::State,
        _publisher: &Publisher<J>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Consumes a single application message as part of the open transaction.
    ///
    /// Acknowledgement markers are filtered out before this is called.
    fn consume_message<J: JournalStore>(
        &mut self,
        spec: &ShardSpec,
        state: &mut Self::State,
        msg: Self::Message,
        publisher: &mut Publisher<J>,
    ) -> anyhow::Result<()>;

    /// Called right before the open transaction is committed.
    fn finalize_txn<J: JournalStore>(
        &mut self,
        _spec: &ShardSpec,
        _state: &mut Self::State,
        _publisher: &mut Publisher<J>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
