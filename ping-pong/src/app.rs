use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use volley_consumer::{Application, ShardHandler, ShardSpec};
use volley_journal::{JournalStore, Publisher};
use volley_message::{LabelSet, ModuloMapping, PartitionSource, ShardId};

use crate::config::{PingPongConfig, RecipientPolicy};
use crate::state::PlayerState;
use crate::volley::{Designation, Volley};

/// Marks the shard which serves the first volley.
pub static FIRST_SERVE_LABEL: &str = "first-serve";
/// The shard id a shard returns volleys to under the fixed partner policy.
pub static VOLLEY_TO_LABEL: &str = "volley-to";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// The roles a shard plays, resolved from its labels when it starts.
pub struct ShardRoles {
    pub first_serve: bool,
    pub volley_to: Option<Designation>,
}

impl ShardRoles {
    pub fn from_labels(labels: &LabelSet) -> Self {
        Self {
            first_serve: labels.contains(FIRST_SERVE_LABEL),
            volley_to: labels
                .get(VOLLEY_TO_LABEL)
                .map(|shard_id| Designation::Shard(ShardId::new(shard_id))),
        }
    }
}

/// The ping-pong application.
///
/// Every shard plays the part of one or more players, returning each volley it
/// receives to the next recipient chosen by the configured [RecipientPolicy].
pub struct PingPongApp<P> {
    config: PingPongConfig,
    partitions: P,
}

impl<P> PingPongApp<P>
where
    P: PartitionSource + Clone + 'static,
{
    pub fn new(config: PingPongConfig, partitions: P) -> Self {
        Self { config, partitions }
    }

    #[inline]
    pub fn config(&self) -> &PingPongConfig {
        &self.config
    }
}

impl<P> Application for PingPongApp<P>
where
    P: PartitionSource + Clone + 'static,
{
    type Message = Volley;
    type State = PlayerState;
    type Handler = PlayerShard<P>;

    fn new_handler(&self, spec: &ShardSpec) -> anyhow::Result<Self::Handler> {
        self.config.validate()?;

        let roles = ShardRoles::from_labels(&spec.labels);
        if self.config.policy == RecipientPolicy::FixedPartner && roles.volley_to.is_none() {
            warn!(shard_id = %spec.id, "Shard has no partner, volleys it receives will be dropped.");
        }

        Ok(PlayerShard {
            roles,
            policy: self.config.policy,
            players: self.config.players,
            mapping: ModuloMapping::new(self.partitions.clone()),
            rng: self.config.rng_for(spec.id.as_str()),
        })
    }
}

/// The handler of a single ping-pong shard.
pub struct PlayerShard<P> {
    roles: ShardRoles,
    policy: RecipientPolicy,
    players: u32,
    mapping: ModuloMapping<P>,
    rng: StdRng,
}

impl<P: PartitionSource> PlayerShard<P> {
    #[inline]
    pub fn roles(&self) -> &ShardRoles {
        &self.roles
    }

    /// Picks who the volley is returned to, if anyone.
    fn next_recipient(&mut self, spec: &ShardSpec, volley: &Volley) -> Option<Designation> {
        match self.policy {
            RecipientPolicy::RandomToAny => {
                Some(Designation::Player(self.rng.gen_range(0..self.players)))
            },
            RecipientPolicy::FixedPartner => {
                if volley.to != Designation::Shard(spec.id.clone()) {
                    debug!(
                        shard_id = %spec.id,
                        to = %volley.to,
                        "Ignoring volley addressed to another shard.",
                    );
                    return None;
                }

                if self.roles.volley_to.is_none() {
                    warn!(shard_id = %spec.id, "Dropping volley, shard has no partner.");
                }

                self.roles.volley_to.clone()
            },
        }
    }
}

#[async_trait]
impl<P> ShardHandler for PlayerShard<P>
where
    P: PartitionSource + 'static,
{
    type Message = Volley;
    type State = PlayerState;

    async fn init_shard<J: JournalStore>(
        &mut self,
        spec: &ShardSpec,
        state: &Self::State,
        publisher: &Publisher<J>,
    ) -> anyhow::Result<()> {
        if !self.roles.first_serve || state.received_count > 0 {
            return Ok(());
        }

        let volley = Volley::first_serve(spec.id.clone());
        let offset = publisher.publish_committed(&self.mapping, volley).await?;

        info!(shard_id = %spec.id, offset = offset, "Served the first volley.");

        Ok(())
    }

    fn consume_message<J: JournalStore>(
        &mut self,
        spec: &ShardSpec,
        state: &mut Self::State,
        msg: Self::Message,
        publisher: &mut Publisher<J>,
    ) -> anyhow::Result<()> {
        let Some(to) = self.next_recipient(spec, &msg) else {
            return Ok(());
        };

        let reply = msg
            .reply(to)
            .ok_or_else(|| anyhow::anyhow!("Game {:?} ran out of rounds.", msg.game_id))?;
        state.received_count = state
            .received_count
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("Received count of shard {} overflowed.", spec.id))?;

        debug!(
            shard_id = %spec.id,
            game_id = ?reply.game_id,
            from = %reply.from,
            to = %reply.to,
            round = reply.round,
            received_count = state.received_count,
            "Returning volley.",
        );

        publisher.publish_uncommitted(&self.mapping, reply)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use volley_journal::MemJournalStore;
    use volley_message::Partition;

    use super::*;
    use crate::topology::volley_partitions;

    #[test]
    fn test_roles_from_labels() {
        let labels = LabelSet::default()
            .with(FIRST_SERVE_LABEL, "")
            .with(VOLLEY_TO_LABEL, "player-1");

        let roles = ShardRoles::from_labels(&labels);
        assert!(roles.first_serve);
        assert_eq!(
            roles.volley_to,
            Some(Designation::Shard(ShardId::from("player-1")))
        );

        assert_eq!(ShardRoles::from_labels(&LabelSet::default()), ShardRoles::default());
    }

    #[test]
    fn test_overflow_fails_the_message() -> anyhow::Result<()> {
        let partitions: Arc<[Partition]> = volley_partitions(1)?.into();
        let spec = ShardSpec::new("player-0", partitions[0].clone());
        let app = PingPongApp::new(PingPongConfig::default(), partitions);
        let mut shard = app.new_handler(&spec)?;
        let mut publisher = Publisher::new(Arc::new(MemJournalStore::default()));
        let mut state = PlayerState::default();

        let mut volley = Volley::new_game(1, Designation::Player(0));
        volley.round = u64::MAX;
        let res = shard.consume_message(&spec, &mut state, volley, &mut publisher);
        assert!(res.is_err(), "A game past its last round cannot be returned.");
        assert_eq!(state.received_count, 0);
        assert!(!publisher.has_pending());

        state.received_count = u64::MAX;
        let volley = Volley::new_game(2, Designation::Player(0));
        let res = shard.consume_message(&spec, &mut state, volley, &mut publisher);
        assert!(res.is_err(), "The received count must not wrap.");
        assert_eq!(state.received_count, u64::MAX);
        assert!(!publisher.has_pending());

        Ok(())
    }
}
