use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use volley_journal::JournalStore;
use volley_message::ShardId;

use crate::app::{Application, ShardSpec};
use crate::error::ShardError;
use crate::shard::{ShardActor, SHARD_RETRY_BACKOFF};
use crate::shutdown::Shutdown;

type LiveShards = Arc<Mutex<HashSet<ShardId>>>;

/// Runs the shards of an application, one task per shard.
///
/// All shards share the same journal store and shutdown signal, at most one
/// shard may run for any given id at a time.
pub struct ShardHost<J, A>
where
    J: JournalStore,
    A: Application,
{
    store: Arc<J>,
    app: Arc<A>,
    shutdown: Shutdown,
    live: LiveShards,
    retry_backoff: Duration,
}

impl<J, A> ShardHost<J, A>
where
    J: JournalStore,
    A: Application,
{
    pub fn new(store: Arc<J>, app: A, shutdown: Shutdown) -> Self {
        Self {
            store,
            app: Arc::new(app),
            shutdown,
            live: LiveShards::default(),
            retry_backoff: SHARD_RETRY_BACKOFF,
        }
    }

    /// Sets the time shards started by this host wait before retrying a
    /// failed transaction.
    ///
    /// Defaults to [SHARD_RETRY_BACKOFF].
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[inline]
    pub fn app(&self) -> &A {
        &self.app
    }

    /// Returns if a shard with the given id is currently running.
    pub fn is_running(&self, shard_id: &ShardId) -> bool {
        self.live.lock().contains(shard_id)
    }

    /// Starts a new shard.
    ///
    /// The shard recovers from its last checkpoint and then processes its source
    /// partition until the host's shutdown signal is triggered, or the shard is
    /// killed through its handle.
    pub fn start_shard(&self, spec: ShardSpec) -> Result<ShardHandle<J>, ShardError<J::Error>> {
        if !self.live.lock().insert(spec.id.clone()) {
            return Err(ShardError::AlreadyRunning(spec.id));
        }
        let guard = LiveGuard {
            shard_id: spec.id.clone(),
            live: self.live.clone(),
        };

        let handler = match self.app.new_handler(&spec) {
            Ok(handler) => handler,
            Err(e) => return Err(ShardError::Application(e)),
        };

        let shard_id = spec.id.clone();
        let store = self.store.clone();
        let shutdown = self.shutdown.clone();
        let retry_backoff = self.retry_backoff;
        let task = tokio::spawn(async move {
            let _guard = guard;

            let actor = ShardActor::recover(spec, store, handler, shutdown, retry_backoff).await?;
            actor.run().await
        });

        info!(shard_id = %shard_id, "Started shard.");

        Ok(ShardHandle { shard_id, task })
    }
}

/// Removes the shard from the live set once its task exits.
struct LiveGuard {
    shard_id: ShardId,
    live: LiveShards,
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.live.lock().remove(&self.shard_id);
    }
}

/// A handle to a running shard.
pub struct ShardHandle<J: JournalStore> {
    shard_id: ShardId,
    task: JoinHandle<Result<(), ShardError<J::Error>>>,
}

impl<J: JournalStore> ShardHandle<J> {
    #[inline]
    pub fn id(&self) -> &ShardId {
        &self.shard_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the shard to stop, returning the error which stopped it if any.
    pub async fn join(self) -> Result<(), ShardError<J::Error>> {
        match self.task.await {
            Ok(res) => res,
            Err(e) => Err(ShardError::Application(e.into())),
        }
    }

    /// Kills the shard's task immediately.
    ///
    /// Anything the shard has already committed stays committed, its open
    /// transaction is lost and redelivered once the shard is started again.
    pub async fn kill(self) {
        self.task.abort();
        let _ = self.task.await;
        debug!(shard_id = %self.shard_id, "Killed shard.");
    }
}
