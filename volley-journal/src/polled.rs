use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use volley_message::{LabelSelector, Partition, PartitionSource};

use crate::error::DiscoveryError;
use crate::store::JournalStore;

/// The default period between refreshes of a [PolledList].
pub const PARTITION_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

type Snapshot = Arc<RwLock<Arc<[Partition]>>>;

#[derive(Clone)]
/// A periodically refreshed list of the partitions matching a selector.
///
/// The list is loaded once when created, after which a background task refreshes
/// it every interval. The task stops once every handle to the list is dropped or
/// the list is killed.
///
/// This handle is cheap to clone.
pub struct PolledList {
    snapshot: Snapshot,
    kill_switch: Arc<AtomicBool>,
}

impl PolledList {
    /// Loads the partitions matching the selector and starts the refresh task.
    ///
    /// Failing to load the initial set of partitions is an error, no routing can
    /// happen without it.
    pub async fn new<J>(
        store: Arc<J>,
        selector: LabelSelector,
        refresh_interval: Duration,
    ) -> Result<Self, DiscoveryError<J::Error>>
    where
        J: JournalStore,
    {
        let mut partitions = store.list(&selector).await.map_err(DiscoveryError)?;
        partitions.sort();

        info!(
            num_partitions = partitions.len(),
            refresh_interval = ?refresh_interval,
            "Loaded the initial partition list.",
        );

        let snapshot: Snapshot = Arc::new(RwLock::new(partitions.into()));
        let kill_switch = Arc::new(AtomicBool::new(false));

        tokio::spawn(refresh_partitions(
            store,
            selector,
            refresh_interval,
            Arc::downgrade(&snapshot),
            kill_switch.clone(),
        ));

        Ok(Self {
            snapshot,
            kill_switch,
        })
    }

    /// Stops the refresh task, the current snapshot remains available.
    pub fn kill(&self) {
        self.kill_switch.store(true, Ordering::Relaxed);
    }
}

impl PartitionSource for PolledList {
    fn snapshot(&self) -> Arc<[Partition]> {
        self.snapshot.read().clone()
    }
}

async fn refresh_partitions<J>(
    store: Arc<J>,
    selector: LabelSelector,
    refresh_interval: Duration,
    snapshot: Weak<RwLock<Arc<[Partition]>>>,
    kill_switch: Arc<AtomicBool>,
) where
    J: JournalStore,
{
    let mut interval = interval(refresh_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick completes immediately and the list was only just loaded.
    interval.tick().await;

    loop {
        interval.tick().await;

        if kill_switch.load(Ordering::Relaxed) {
            break;
        }

        let partitions = match store.list(&selector).await {
            Ok(mut partitions) => {
                partitions.sort();
                partitions
            },
            Err(e) => {
                warn!(error = ?e, "Failed to refresh the partition list, keeping the previous snapshot.");
                continue;
            },
        };

        let Some(current) = snapshot.upgrade() else {
            break;
        };

        let mut lock = current.write();
        if lock[..] != partitions[..] {
            info!(
                previous = lock.len(),
                current = partitions.len(),
                "Partition list has changed.",
            );
            *lock = partitions.into();
        }
    }

    debug!("Shutting down partition refresh task.");
}
