use rkyv::{AlignedVec, Archive, Deserialize, Serialize};
use volley_consumer::{CorruptedState, StateRecord};

/// The version of [PlayerState] written by this build.
pub const PLAYER_STATE_VERSION: u16 = 1;

#[derive(Archive, Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[archive(check_bytes)]
/// The durable state of a player shard.
pub struct PlayerState {
    pub version: u16,
    /// The number of volleys the shard has returned.
    pub received_count: u64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            version: PLAYER_STATE_VERSION,
            received_count: 0,
        }
    }
}

impl StateRecord for PlayerState {
    fn to_bytes(&self) -> Result<Vec<u8>, CorruptedState> {
        rkyv::to_bytes::<_, 64>(self)
            .map(|buffer| buffer.into_vec())
            .map_err(|_| CorruptedState)
    }

    fn from_bytes(buf: &[u8]) -> Result<Self, CorruptedState> {
        let mut aligned = AlignedVec::with_capacity(buf.len());
        aligned.extend_from_slice(buf);

        let state = rkyv::from_bytes::<Self>(&aligned).map_err(|_| CorruptedState)?;
        if state.version != PLAYER_STATE_VERSION {
            warn!(
                version = state.version,
                expected = PLAYER_STATE_VERSION,
                "Refusing to load player state of an unknown version.",
            );
            return Err(CorruptedState);
        }

        Ok(state)
    }
}
