use std::fmt::{Display, Formatter};

use rkyv::{AlignedVec, Archive, Deserialize, Serialize};
use volley_message::{
    CodecError,
    Mappable,
    Message,
    MessageId,
    MessageType,
    Partition,
    ShardId,
};

/// The type of every partition carrying volleys.
pub const VOLLEY_MESSAGE_TYPE: MessageType = MessageType::new("ping_pong.Volley");

#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[archive(check_bytes)]
/// The sender or recipient of a volley.
pub enum Designation {
    /// No one sent the volley, it started a new game.
    NoSender,
    /// One of the game's players.
    Player(u32),
    /// A shard addressed by its identity.
    Shard(ShardId),
}

impl Designation {
    /// The key the volley is routed on when addressed to this designation.
    pub fn routing_key(&self) -> String {
        match self {
            Self::NoSender => "-1".to_string(),
            Self::Player(player) => format!("{player:x}"),
            Self::Shard(shard_id) => shard_id.to_string(),
        }
    }
}

impl Display for Designation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSender => f.write_str("-1"),
            Self::Player(player) => write!(f, "{player}"),
            Self::Shard(shard_id) => write!(f, "{shard_id}"),
        }
    }
}

impl Mappable for Designation {
    fn mapping_key(&self) -> String {
        self.routing_key()
    }
}

#[derive(Archive, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[archive(check_bytes)]
/// A single hop of a game of ping-pong.
pub struct Volley {
    pub id: MessageId,
    /// The game the volley belongs to, first serves have no game id.
    pub game_id: Option<u32>,
    pub from: Designation,
    pub to: Designation,
    /// The number of hops since the game started.
    pub round: u64,
}

impl Volley {
    /// Creates the opening volley of a new game.
    pub fn new_game(game_id: u32, to: Designation) -> Self {
        Self {
            id: MessageId::default(),
            game_id: Some(game_id),
            from: Designation::NoSender,
            to,
            round: 0,
        }
    }

    /// Creates a volley a shard serves to itself to start its first game.
    pub fn first_serve(shard_id: ShardId) -> Self {
        Self {
            id: MessageId::default(),
            game_id: None,
            from: Designation::Shard(shard_id.clone()),
            to: Designation::Shard(shard_id),
            round: 0,
        }
    }

    /// Creates the volley returned by the recipient of this one.
    ///
    /// Returns `None` if the game has run out of rounds.
    pub fn reply(&self, to: Designation) -> Option<Self> {
        Some(Self {
            id: MessageId::default(),
            game_id: self.game_id,
            from: self.to.clone(),
            to,
            round: self.round.checked_add(1)?,
        })
    }
}

impl Mappable for Volley {
    fn mapping_key(&self) -> String {
        self.to.routing_key()
    }
}

impl Message for Volley {
    fn id(&self) -> MessageId {
        self.id
    }

    fn set_id(&mut self, id: MessageId) {
        self.id = id;
    }

    fn new_acknowledgement(_partition: &Partition) -> Self {
        Self {
            id: MessageId::default(),
            game_id: None,
            from: Designation::NoSender,
            to: Designation::NoSender,
            round: 0,
        }
    }

    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        rkyv::to_bytes::<_, 256>(self)
            .map(|buffer| buffer.into_vec())
            .map_err(|_| CodecError::new("failed to serialize volley"))
    }

    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        // Frames are not guaranteed to be aligned for the archived type.
        let mut aligned = AlignedVec::with_capacity(buf.len());
        aligned.extend_from_slice(buf);

        rkyv::from_bytes::<Self>(&aligned).map_err(|_| CodecError::invalid_frame(buf.len()))
    }
}
