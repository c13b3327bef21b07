//! # Volley Journal
//! The storage contract the shards and publishers are built upon, along with an
//! in-memory implementation of it and the transactional [Publisher].
//!
//! A [JournalStore] provides ordered, durable, partitioned journals and an atomic
//! commit which appends a batch of frames while recording a shard's [Checkpoint].
//! Anything which can provide those guarantees can back an application, the
//! [MemJournalStore] is a non-durable implementation used for tests and demos.
//!
//! ## Basic Example
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use volley_journal::{JournalStore, MemJournalStore};
//! use volley_message::{LabelSet, MessageType, Partition};
//!
//! const PING: MessageType = MessageType::new("example.Ping");
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = Arc::new(MemJournalStore::default());
//! let partition = Partition::new("pings/part=00", LabelSet::for_message_type(PING));
//! store.create_partition(partition.clone());
//!
//! let offset = store.append(&partition, Bytes::from_static(b"ping")).await?;
//! let envelope = store.read(&partition, offset).await?;
//! assert_eq!(envelope.frame.as_ref(), b"ping");
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

mod error;
mod memory;
mod polled;
mod publisher;
mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{DiscoveryError, JournalError, PublishError};
pub use memory::MemJournalStore;
pub use polled::{PolledList, PARTITION_REFRESH_INTERVAL};
pub use publisher::Publisher;
pub use store::{Checkpoint, Envelope, JournalStore};
