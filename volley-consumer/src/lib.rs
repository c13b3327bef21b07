//! # Volley Consumer
//! A transactional runtime for applications consuming partitioned journals.
//!
//! Every shard owns a single source partition and a small piece of durable state.
//! The shard processes its partition one envelope at a time, each envelope being
//! its own transaction: the application's [ShardHandler] mutates the state and
//! publishes any resulting messages uncommitted, then the shard's next offset,
//! its encoded state and the published messages are committed atomically.
//!
//! If any step of the transaction fails, the transaction is aborted, the state is
//! restored from the last checkpoint and the envelope is redelivered after a
//! short backoff. A shard restarted after a crash resumes from its last
//! checkpoint, so a message is only ever applied to the state once.
//!
//! ## Basic Example
//! ```rust
//! use std::sync::Arc;
//! use volley_consumer::{shutdown_channel, Application, ShardHandler, ShardHost, ShardSpec};
//! use volley_journal::{JournalStore, MemJournalStore, Publisher};
//! use volley_message::{CodecError, LabelSet, Mappable, Message, MessageId, MessageType, Partition};
//!
//! const TICK: MessageType = MessageType::new("example.Tick");
//!
//! struct Tick(MessageId);
//!
//! impl Mappable for Tick {
//!     fn mapping_key(&self) -> String {
//!         String::new()
//!     }
//! }
//!
//! impl Message for Tick {
//!     fn id(&self) -> MessageId { self.0 }
//!     fn set_id(&mut self, id: MessageId) { self.0 = id; }
//!     fn new_acknowledgement(_: &Partition) -> Self { Self(MessageId::default()) }
//!     fn encode(&self) -> Result<Vec<u8>, CodecError> { Ok(Vec::new()) }
//!     fn decode(_: &[u8]) -> Result<Self, CodecError> { Ok(Self(MessageId::default())) }
//! }
//!
//! struct Ignore;
//!
//! impl ShardHandler for Ignore {
//!     type Message = Tick;
//!     type State = ();
//!
//!     fn consume_message<J: JournalStore>(
//!         &mut self,
//!         _spec: &ShardSpec,
//!         _state: &mut (),
//!         _msg: Tick,
//!         _publisher: &mut Publisher<J>,
//!     ) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! struct IgnoreApp;
//!
//! impl Application for IgnoreApp {
//!     type Message = Tick;
//!     type State = ();
//!     type Handler = Ignore;
//!
//!     fn new_handler(&self, _spec: &ShardSpec) -> anyhow::Result<Ignore> {
//!         Ok(Ignore)
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = Arc::new(MemJournalStore::default());
//! let partition = Partition::new("ticks/part=00", LabelSet::for_message_type(TICK));
//! store.create_partition(partition.clone());
//!
//! let (trigger, shutdown) = shutdown_channel();
//! let host = ShardHost::new(store, IgnoreApp, shutdown);
//! let handle = host.start_shard(ShardSpec::new("ticks-00", partition))?;
//!
//! trigger.trigger();
//! handle.join().await?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

mod app;
mod error;
mod host;
mod shard;
mod shutdown;
mod state;

pub use app::{Application, ShardHandler, ShardSpec};
pub use error::{CorruptedState, ShardError};
pub use host::{ShardHandle, ShardHost};
pub use shard::{MAX_TXN_ATTEMPTS, SHARD_RETRY_BACKOFF};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use state::StateRecord;
