use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rkyv::{Archive, Deserialize, Serialize};

/// Producer ids are restricted to 48 bits, the same width as a MAC address.
const PRODUCER_ID_MASK: u64 = (1 << 48) - 1;
/// The number of low bits of the initial clock value reserved for the sequence counter.
const CLOCK_SEQUENCE_BITS: u32 = 16;

#[derive(
    Archive, Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[archive(check_bytes)]
/// A unique identifier of a message producer.
pub struct ProducerId(u64);

impl ProducerId {
    pub fn new(raw: u64) -> Self {
        Self(raw & PRODUCER_ID_MASK)
    }

    /// Creates a new randomly selected producer id.
    pub fn random() -> Self {
        Self::new(rand::random())
    }

    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for ProducerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:012x}", self.0)
    }
}

#[derive(Archive, Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[archive(check_bytes)]
/// Describes how a message takes part in a transaction.
pub enum Flags {
    #[default]
    /// The message was published outside of any transaction and is committed
    /// as soon as it is appended.
    OutsideTxn,
    /// The message is part of a transaction which is committed together
    /// with the producer's own state.
    ContinueTxn,
    /// The message marks the commit of a transaction. It carries no application
    /// data and must never be routed further.
    AckTxn,
}

#[derive(Archive, Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[archive(check_bytes)]
/// The globally unique identity of a published message.
///
/// Ids produced by a single producer are strictly increasing in their clock.
pub struct MessageId {
    producer: ProducerId,
    clock: u64,
    flags: Flags,
}

impl MessageId {
    pub fn new(producer: ProducerId, clock: u64, flags: Flags) -> Self {
        Self {
            producer,
            clock,
            flags,
        }
    }

    #[inline]
    pub fn producer(&self) -> ProducerId {
        self.producer
    }

    #[inline]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:016x}-{:?}", self.producer, self.clock, self.flags)
    }
}

/// A monotonic clock used to sequence the messages of a single producer.
pub struct Clock(AtomicU64);

impl Clock {
    /// Creates a new clock starting at the current wall-clock time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self::starting_at(millis << CLOCK_SEQUENCE_BITS)
    }

    pub fn starting_at(value: u64) -> Self {
        Self(AtomicU64::new(value))
    }

    /// Advances the clock, returning the new value.
    pub fn tick(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(
    Archive, Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[archive(check_bytes)]
/// The identity of a shard, unique within a deployment.
pub struct ShardId(String);

impl ShardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ShardId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ShardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
