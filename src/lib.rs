//! # Volley
//! Tooling for building applications out of transactional shards which exchange
//! messages over durable, partitioned journals.
//!
//! This is a convenience package which includes all of the sub-projects within
//! Volley, realistically you probably only want some of these projects:
//!
//! ### Features
//! - `volley_message` - Message identities, partition labels and mapping functions. (always enabled)
//! - `volley_journal` - The journal storage contract, an in-memory store and the transactional publisher.
//! - `volley_consumer` - The shard runtime: recovery, the transaction loop and the shard host.
//! - `ping_pong` - A demo application of shards playing ping-pong.

pub use volley_message as message;
#[cfg(feature = "volley-journal")]
pub use volley_journal as journal;
#[cfg(feature = "volley-consumer")]
pub use volley_consumer as consumer;
#[cfg(feature = "ping-pong")]
pub use ping_pong;
