#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ping_pong::{volley_partitions, PlayerState, Volley};
use volley_consumer::StateRecord;
use volley_journal::MemJournalStore;
use volley_message::{Message, Partition, ShardId};

pub fn setup(num_partitions: usize) -> (Arc<MemJournalStore>, Arc<[Partition]>) {
    let store = Arc::new(MemJournalStore::default());
    let partitions: Arc<[Partition]> = volley_partitions(num_partitions)
        .expect("Create partitions.")
        .into();

    for partition in partitions.iter() {
        store.create_partition(partition.clone());
    }

    (store, partitions)
}

/// Every application volley written to the partitions, acknowledgements excluded.
pub fn volleys(store: &MemJournalStore, partitions: &[Partition]) -> Vec<Volley> {
    partitions
        .iter()
        .flat_map(|partition| store.frames(partition))
        .map(|frame| Volley::decode(&frame).expect("Decode volley."))
        .filter(|volley| !volley.is_acknowledgement())
        .collect()
}

/// The state of the shard's last committed checkpoint.
pub fn committed_state(store: &MemJournalStore, shard_id: &ShardId) -> PlayerState {
    store
        .checkpoint_history(shard_id)
        .last()
        .map(|checkpoint| PlayerState::from_bytes(&checkpoint.state).expect("Decode state."))
        .unwrap_or_default()
}

/// Polls the condition until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let fut = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };

    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("Condition should hold in time.");
}

/// Asserts that the rounds of a single game form an unbroken sequence.
pub fn assert_rounds_are_consecutive(volleys: &[Volley]) {
    let mut rounds = volleys.iter().map(|v| v.round).collect::<Vec<_>>();
    rounds.sort_unstable();

    let expected = (0..rounds.len() as u64).collect::<Vec<_>>();
    assert_eq!(rounds, expected, "Every round should be played exactly once.");
}
