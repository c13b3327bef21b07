use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

/// The default number of players in a game.
pub const DEFAULT_PLAYERS: u32 = 100;
/// The default mean period between new games.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);
/// The fewest players a game can be played with.
pub const MIN_PLAYERS: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("A game needs at least {} players, got {players}.", MIN_PLAYERS)]
    TooFewPlayers { players: u32 },

    #[error("At least one volley partition is required.")]
    NoPartitions,

    #[error("The fixed partner policy needs at least one shard to serve games to.")]
    NoRecipients,

    #[error("No shard id could be found which routes to partition {0:?}.")]
    /// Identity routing needs a shard id which hashes onto every partition.
    UnroutablePartition(String),
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, clap::ValueEnum)]
/// Decides who a shard returns a volley to.
pub enum RecipientPolicy {
    #[default]
    /// Any player, selected uniformly at random.
    RandomToAny,
    /// The partner configured for the shard, volleys addressed to anyone else
    /// are dropped.
    FixedPartner,
}

#[derive(Debug, Clone)]
pub struct PingPongConfig {
    /// The number of players new games and replies are addressed to.
    pub players: u32,
    /// The mean period between new games, zero disables the game generator.
    pub period: Duration,
    pub policy: RecipientPolicy,
    /// Seeds every source of randomness, making runs reproducible.
    pub seed: Option<u64>,
}

impl Default for PingPongConfig {
    fn default() -> Self {
        Self {
            players: DEFAULT_PLAYERS,
            period: DEFAULT_PERIOD,
            policy: RecipientPolicy::default(),
            seed: None,
        }
    }
}

impl PingPongConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.players < MIN_PLAYERS {
            return Err(ConfigError::TooFewPlayers {
                players: self.players,
            });
        }

        Ok(())
    }

    /// Creates the random number generator for a named stream.
    ///
    /// With a seed configured, each stream gets its own deterministic sequence.
    pub fn rng_for(&self, stream: &str) -> StdRng {
        match self.seed {
            Some(seed) => {
                let stream = crc32fast::hash(stream.as_bytes()) as u64;
                StdRng::seed_from_u64(seed ^ (stream << 32 | stream))
            },
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_validate() {
        assert!(PingPongConfig::default().validate().is_ok());

        let config = PingPongConfig {
            players: 2,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooFewPlayers { players: 2 })
        );
    }

    #[test]
    fn test_seeded_streams() {
        let config = PingPongConfig {
            seed: Some(99),
            ..Default::default()
        };

        let a = config.rng_for("generator").gen::<u64>();
        let b = config.rng_for("generator").gen::<u64>();
        let c = config.rng_for("player-0").gen::<u64>();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
