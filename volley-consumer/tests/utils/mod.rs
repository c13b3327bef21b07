#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rkyv::{AlignedVec, Archive, Deserialize, Serialize};
use volley_consumer::{Application, CorruptedState, ShardHandler, ShardSpec, StateRecord};
use volley_journal::{JournalStore, MemJournalStore, Publisher};
use volley_message::{
    CodecError,
    LabelSet,
    Mappable,
    Message,
    MessageId,
    MessageType,
    ModuloMapping,
    Partition,
    ShardId,
};

pub const HOP: MessageType = MessageType::new("tests.Hop");
pub const TEST_RETRY_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[archive(check_bytes)]
/// A message which keeps bouncing back to its recipient until it runs out of hops.
pub struct Hop {
    pub id: MessageId,
    pub to: String,
    pub hops_left: u32,
}

impl Hop {
    pub fn new(to: &str, hops_left: u32) -> Self {
        Self {
            id: MessageId::default(),
            to: to.to_string(),
            hops_left,
        }
    }
}

impl Mappable for Hop {
    fn mapping_key(&self) -> String {
        self.to.clone()
    }
}

impl Message for Hop {
    fn id(&self) -> MessageId {
        self.id
    }

    fn set_id(&mut self, id: MessageId) {
        self.id = id;
    }

    fn new_acknowledgement(_partition: &Partition) -> Self {
        Self::new("", 0)
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        rkyv::to_bytes::<_, 256>(self)
            .map(|buffer| buffer.into_vec())
            .map_err(|_| CodecError::new("failed to serialize hop"))
    }

    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let mut aligned = AlignedVec::with_capacity(buf.len());
        aligned.extend_from_slice(buf);
        rkyv::from_bytes::<Self>(&aligned).map_err(|_| CodecError::invalid_frame(buf.len()))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Counts the application messages a shard has processed.
pub struct Counter(pub u64);

impl StateRecord for Counter {
    fn to_bytes(&self) -> Result<Vec<u8>, CorruptedState> {
        Ok(self.0.to_le_bytes().to_vec())
    }

    fn from_bytes(buf: &[u8]) -> Result<Self, CorruptedState> {
        let buf: [u8; 8] = buf.try_into().map_err(|_| CorruptedState)?;
        Ok(Self(u64::from_le_bytes(buf)))
    }
}

#[derive(Clone)]
pub struct HopApp {
    pub partitions: Arc<[Partition]>,
    /// Makes the next `n` handled messages fail after mutating the state.
    pub failing_messages: Arc<AtomicUsize>,
}

impl HopApp {
    pub fn new(partitions: Arc<[Partition]>) -> Self {
        Self {
            partitions,
            failing_messages: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Application for HopApp {
    type Message = Hop;
    type State = Counter;
    type Handler = HopHandler;

    fn new_handler(&self, _spec: &ShardSpec) -> anyhow::Result<Self::Handler> {
        Ok(HopHandler {
            mapping: ModuloMapping::new(self.partitions.clone()),
            failing_messages: self.failing_messages.clone(),
        })
    }
}

pub struct HopHandler {
    mapping: ModuloMapping<Arc<[Partition]>>,
    failing_messages: Arc<AtomicUsize>,
}

impl ShardHandler for HopHandler {
    type Message = Hop;
    type State = Counter;

    fn consume_message<J: JournalStore>(
        &mut self,
        _spec: &ShardSpec,
        state: &mut Self::State,
        msg: Self::Message,
        publisher: &mut Publisher<J>,
    ) -> anyhow::Result<()> {
        state.0 += 1;

        if msg.hops_left > 0 {
            publisher.publish_uncommitted(&self.mapping, Hop::new(&msg.to, msg.hops_left - 1))?;
        }

        let should_fail = self
            .failing_messages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            anyhow::bail!("Injected handler failure.");
        }

        Ok(())
    }
}

pub fn hop_partitions(n: usize) -> Arc<[Partition]> {
    (0..n)
        .map(|i| Partition::new(format!("hops/part={i:02}"), LabelSet::for_message_type(HOP)))
        .collect()
}

pub fn store_with(partitions: &[Partition]) -> Arc<MemJournalStore> {
    let store = Arc::new(MemJournalStore::default());
    for partition in partitions {
        store.create_partition(partition.clone());
    }
    store
}

/// Waits until the shard has committed a checkpoint at or past the given offset.
pub async fn wait_for_offset(store: &MemJournalStore, shard_id: &ShardId, offset: u64) {
    let fut = async {
        loop {
            let reached = store
                .checkpoint_history(shard_id)
                .last()
                .map(|checkpoint| checkpoint.offset >= offset)
                .unwrap_or_default();

            if reached {
                break;
            }

            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };

    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("Shard should reach the offset in time.");
}

/// Decodes the state of the shard's last committed checkpoint.
pub fn committed_count(store: &MemJournalStore, shard_id: &ShardId) -> u64 {
    store
        .checkpoint_history(shard_id)
        .last()
        .map(|checkpoint| Counter::from_bytes(&checkpoint.state).expect("Decode state.").0)
        .unwrap_or_default()
}
