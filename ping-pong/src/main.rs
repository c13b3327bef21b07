#[macro_use]
extern crate tracing;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use ping_pong::{
    player_shards,
    ring_shards,
    volley_partitions,
    GameGenerator,
    PingPongApp,
    PingPongConfig,
    RecipientPolicy,
    VOLLEY_MESSAGE_TYPE,
};
use volley_consumer::{shutdown_channel, ShardHost};
use volley_journal::{MemJournalStore, PolledList, PARTITION_REFRESH_INTERVAL};
use volley_message::{LabelSelector, ModuloMapping};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = Args::parse();

    let config = PingPongConfig {
        players: args.players,
        period: args.period,
        policy: args.policy,
        seed: args.seed,
    };
    config.validate()?;

    let store = Arc::new(MemJournalStore::default());
    let partitions = volley_partitions(args.partitions)?;
    for partition in partitions.iter() {
        store.create_partition(partition.clone());
    }

    let shards = match config.policy {
        RecipientPolicy::RandomToAny => player_shards(&partitions),
        RecipientPolicy::FixedPartner => ring_shards(&partitions)?,
    };

    let discovered = PolledList::new(
        store.clone(),
        LabelSelector::for_message_type(VOLLEY_MESSAGE_TYPE),
        PARTITION_REFRESH_INTERVAL,
    )
    .await?;

    let (trigger, shutdown) = shutdown_channel();
    let host = ShardHost::new(
        store.clone(),
        PingPongApp::new(config.clone(), discovered.clone()),
        shutdown.clone(),
    );

    let generator = GameGenerator::new(
        store.clone(),
        ModuloMapping::new(discovered.clone()),
        &config,
        &shards,
    )?;

    let mut handles = Vec::with_capacity(shards.len());
    for spec in shards {
        handles.push(host.start_shard(spec)?);
    }

    let generator = generator.spawn(shutdown);

    info!(
        players = config.players,
        period = ?config.period,
        policy = ?config.policy,
        num_partitions = partitions.len(),
        "Ping pong is running.",
    );

    match args.run_for {
        Some(duration) => tokio::time::sleep(duration).await,
        None => tokio::signal::ctrl_c().await?,
    }

    info!("Shutting down.");
    trigger.trigger();
    discovered.kill();

    if let Some(generator) = generator {
        generator.await??;
    }
    futures::future::try_join_all(handles.into_iter().map(|handle| handle.join())).await?;

    for partition in partitions.iter() {
        info!(
            partition = %partition,
            num_frames = store.frames(partition).len(),
            "Final partition size.",
        );
    }

    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, env = "PING_PONG_PLAYERS", default_value_t = ping_pong::DEFAULT_PLAYERS)]
    /// The number of players taking part in every game.
    players: u32,

    #[arg(long, env = "PING_PONG_PERIOD", default_value = "1s", value_parser = humantime::parse_duration)]
    /// The mean period between new games.
    ///
    /// A period of zero disables the game generator.
    period: Duration,

    #[arg(long, default_value_t = 4)]
    /// The number of volley partitions, one shard is started per partition.
    partitions: usize,

    #[arg(long, value_enum, default_value_t = RecipientPolicy::RandomToAny)]
    /// Decides who a shard returns a volley to.
    policy: RecipientPolicy,

    #[arg(long)]
    /// Seeds every source of randomness, making runs reproducible.
    seed: Option<u64>,

    #[arg(long, value_parser = humantime::parse_duration)]
    /// Stops the game after the given duration rather than waiting for ctrl-c.
    run_for: Option<Duration>,
}
