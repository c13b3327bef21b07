use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use tokio::task::JoinHandle;
use volley_consumer::{ShardSpec, Shutdown};
use volley_journal::{JournalStore, PublishError, Publisher};
use volley_message::{MappingFunc, Offset, ShardId};

use crate::config::{ConfigError, PingPongConfig, RecipientPolicy};
use crate::volley::{Designation, Volley};

/// The standard deviation of the delay between games, relative to the period.
const PERIOD_JITTER: f64 = 0.3;

#[derive(Debug)]
/// Who opening volleys are served to.
enum Recipients {
    /// Any of the given number of players.
    Players(u32),
    /// Any of the shards, each only accepting volleys addressed to itself.
    Shards(Vec<ShardId>),
}

/// Periodically starts new games by serving a volley to a random recipient.
pub struct GameGenerator<J, F>
where
    J: JournalStore,
    F: MappingFunc<Volley>,
{
    publisher: Publisher<J>,
    mapping: F,
    recipients: Recipients,
    period: Duration,
    rng: StdRng,
}

impl<J, F> GameGenerator<J, F>
where
    J: JournalStore,
    F: MappingFunc<Volley> + 'static,
{
    /// Creates a new generator serving games to the players of the given shards.
    ///
    /// Under the fixed partner policy games are addressed to one of the `shards`
    /// directly, otherwise to any of the configured players.
    pub fn new(
        store: Arc<J>,
        mapping: F,
        config: &PingPongConfig,
        shards: &[ShardSpec],
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let recipients = match config.policy {
            RecipientPolicy::RandomToAny => Recipients::Players(config.players),
            RecipientPolicy::FixedPartner if shards.is_empty() => {
                return Err(ConfigError::NoRecipients);
            },
            RecipientPolicy::FixedPartner => {
                Recipients::Shards(shards.iter().map(|spec| spec.id.clone()).collect())
            },
        };

        Ok(Self {
            publisher: Publisher::new(store),
            mapping,
            recipients,
            period: config.period,
            rng: config.rng_for("generator"),
        })
    }

    /// Creates the opening volley of the next game.
    pub fn next_game(&mut self) -> Volley {
        let game_id = self.rng.gen();
        let to = match &self.recipients {
            Recipients::Players(players) => Designation::Player(self.rng.gen_range(0..*players)),
            Recipients::Shards(shards) => {
                Designation::Shard(shards[self.rng.gen_range(0..shards.len())].clone())
            },
        };
        Volley::new_game(game_id, to)
    }

    /// Draws the delay before the next game is started.
    ///
    /// Delays are normally distributed around the period, negative samples are
    /// clamped to zero.
    pub fn next_delay(&mut self) -> Duration {
        let sample: f64 = self.rng.sample(StandardNormal);
        let period = self.period.as_secs_f64();
        let secs = period + sample * PERIOD_JITTER * period;

        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Starts a single new game, waiting for its opening volley to be committed.
    pub async fn start_one_game(&mut self) -> Result<Offset, PublishError<J::Error>> {
        let volley = self.next_game();
        let game_id = volley.game_id;
        let to = volley.to.clone();

        let offset = self.publisher.publish_committed(&self.mapping, volley).await?;

        debug!(game_id = ?game_id, to = %to, offset = offset, "Started new game.");

        Ok(offset)
    }

    /// Starts the generator in the background.
    ///
    /// Returns `None` when the period is zero, which disables the generator.
    pub fn spawn(self, shutdown: Shutdown) -> Option<JoinHandle<Result<(), PublishError<J::Error>>>> {
        if self.period.is_zero() {
            info!("Game generator is disabled.");
            return None;
        }

        Some(tokio::spawn(self.run(shutdown)))
    }

    async fn run(mut self, mut shutdown: Shutdown) -> Result<(), PublishError<J::Error>> {
        info!(
            recipients = ?self.recipients,
            period = ?self.period,
            producer = %self.publisher.producer(),
            "Starting game generator.",
        );

        while !shutdown.is_triggered() {
            if let Err(e) = self.start_one_game().await {
                error!(error = ?e, "Failed to start new game, stopping generator.");
                return Err(e);
            }

            let delay = self.next_delay();
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = tokio::time::sleep(delay) => {},
            }
        }

        debug!("Shutting down game generator.");

        Ok(())
    }
}
