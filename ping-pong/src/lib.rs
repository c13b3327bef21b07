//! # Ping Pong
//! A game of ping-pong played by shards over partitioned journals.
//!
//! Every shard consumes one partition of volleys, returning each volley it
//! receives to the next player. The reply is published as part of the same
//! transaction which records the shard's updated [PlayerState], so a volley is
//! only ever returned once even if the shard crashes part way through.
//!
//! New games are started by the [GameGenerator], which serves a volley to a
//! random player, or a random shard of the ring under the fixed partner policy,
//! at a normally distributed interval around the configured period.
//!
//! ## Basic Example
//! ```rust
//! use std::sync::Arc;
//! use ping_pong::{player_shards, volley_partitions, PingPongApp, PingPongConfig};
//! use volley_consumer::{shutdown_channel, ShardHost};
//! use volley_journal::MemJournalStore;
//! use volley_message::Partition;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = Arc::new(MemJournalStore::default());
//! let partitions: Arc<[Partition]> = volley_partitions(4)?.into();
//! for partition in partitions.iter() {
//!     store.create_partition(partition.clone());
//! }
//!
//! let (trigger, shutdown) = shutdown_channel();
//! let app = PingPongApp::new(PingPongConfig::default(), partitions.clone());
//! let host = ShardHost::new(store, app, shutdown);
//!
//! let mut handles = Vec::new();
//! for spec in player_shards(&partitions) {
//!     handles.push(host.start_shard(spec)?);
//! }
//!
//! trigger.trigger();
//! for handle in handles {
//!     handle.join().await?;
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

mod app;
mod config;
mod generator;
mod state;
mod topology;
mod volley;

pub use app::{PingPongApp, PlayerShard, ShardRoles, FIRST_SERVE_LABEL, VOLLEY_TO_LABEL};
pub use config::{
    ConfigError,
    PingPongConfig,
    RecipientPolicy,
    DEFAULT_PERIOD,
    DEFAULT_PLAYERS,
    MIN_PLAYERS,
};
pub use generator::GameGenerator;
pub use state::{PlayerState, PLAYER_STATE_VERSION};
pub use topology::{player_shards, ring_shards, volley_partition, volley_partitions};
pub use volley::{Designation, Volley, VOLLEY_MESSAGE_TYPE};
