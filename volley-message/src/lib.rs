//! # Volley Message
//! The message model shared by every application built on top of the partitioned
//! journals: message identities, partition labels and the mapping functions which
//! route a message to the partition that should receive it.
//!
//! Every published message carries a [MessageId]. The id is unique across producers
//! and also carries the [Flags] describing how the message takes part in a
//! transaction, this is how readers tell application messages apart from the
//! acknowledgement markers written when a transaction commits.
//!
//! ### Basic Example
//! ```rust
//! use std::sync::Arc;
//! use volley_message::{modulo_partition, LabelSet, Mappable, MessageType, Partition};
//!
//! struct Ping(String);
//!
//! impl Mappable for Ping {
//!     fn mapping_key(&self) -> String {
//!         self.0.clone()
//!     }
//! }
//!
//! const PING: MessageType = MessageType::new("example.Ping");
//!
//! let partitions: Arc<[Partition]> = (0..4)
//!     .map(|n| Partition::new(format!("pings/part={n:02}"), LabelSet::for_message_type(PING)))
//!     .collect();
//!
//! let target = modulo_partition(&Ping("bob".into()), &partitions).unwrap();
//! let again = modulo_partition(&Ping("bob".into()), &partitions).unwrap();
//! assert_eq!(target, again);
//! ```

mod id;
mod mapping;
mod partition;

pub use id::{Clock, Flags, MessageId, ProducerId, ShardId};
pub use mapping::{
    modulo_partition,
    random_partition,
    Mappable,
    MappingError,
    MappingFunc,
    ModuloMapping,
    PartitionSource,
    RandomMapping,
};
pub use partition::{
    LabelSelector,
    LabelSet,
    MessageType,
    Offset,
    Partition,
    MESSAGE_TYPE_LABEL,
};

#[derive(Debug, thiserror::Error)]
#[error("Failed to (de)serialize message: {reason}")]
/// A message could not be encoded into, or decoded from, a journal frame.
pub struct CodecError {
    reason: String,
}

impl CodecError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The frame did not contain a valid archived message.
    pub fn invalid_frame(len: usize) -> Self {
        Self::new(format!("invalid frame of {len} bytes"))
    }
}

/// A message which can be published to, and read back from, a partitioned journal.
pub trait Message: Mappable + Sized + Send + Sync + 'static {
    /// The identity assigned to the message when it was published.
    fn id(&self) -> MessageId;

    /// Sets the identity of the message, this is done by the publisher.
    fn set_id(&mut self, id: MessageId);

    /// Creates the acknowledgement marker written to `partition` when a
    /// transaction which published to it commits.
    fn new_acknowledgement(partition: &Partition) -> Self;

    /// Encodes the message into a journal frame.
    fn encode(&self) -> Result<Vec<u8>, CodecError>;

    /// Decodes a message from a journal frame.
    fn decode(buf: &[u8]) -> Result<Self, CodecError>;

    #[inline]
    /// Returns if the message marks a transaction boundary rather than carrying
    /// application data.
    fn is_acknowledgement(&self) -> bool {
        self.id().flags() == Flags::AckTxn
    }
}
