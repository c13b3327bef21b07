use crate::error::CorruptedState;

/// The durable state a shard keeps between transactions.
///
/// The state is encoded after every transaction and committed together with the
/// messages the transaction produced, a shard restored from its checkpoint
/// decodes the state again before processing any further messages.
pub trait StateRecord: Default + Send + Sync + 'static {
    /// Encodes the state into its persisted form.
    fn to_bytes(&self) -> Result<Vec<u8>, CorruptedState>;

    /// Decodes a state previously produced by [StateRecord::to_bytes].
    fn from_bytes(buf: &[u8]) -> Result<Self, CorruptedState>;
}

/// Shards which keep no state of their own.
impl StateRecord for () {
    fn to_bytes(&self) -> Result<Vec<u8>, CorruptedState> {
        Ok(Vec::new())
    }

    fn from_bytes(buf: &[u8]) -> Result<Self, CorruptedState> {
        if buf.is_empty() {
            Ok(())
        } else {
            Err(CorruptedState)
        }
    }
}
