use tokio::sync::watch;

/// Creates a new shutdown signal and the trigger which fires it.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), Shutdown(rx))
}

/// Fires the shutdown signal for every linked [Shutdown].
///
/// Dropping the trigger also counts as a shutdown.
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }

    /// Creates another receiver of the signal.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown(self.0.subscribe())
    }
}

#[derive(Clone)]
/// A process wide shutdown signal.
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    #[inline]
    pub fn is_triggered(&self) -> bool {
        *self.0.borrow() || self.0.has_changed().is_err()
    }

    /// Waits until the shutdown has been triggered.
    ///
    /// This is cancel safe.
    pub async fn wait(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let (trigger, mut shutdown) = shutdown_channel();
        let mut other = trigger.subscribe();
        assert!(!shutdown.is_triggered());

        let waiter = tokio::spawn(async move { other.wait().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("Waiter should be woken.")
            .expect("Join waiter.");
        assert!(shutdown.is_triggered());
        shutdown.wait().await;
    }

    #[tokio::test]
    async fn test_dropped_trigger_is_shutdown() {
        let (trigger, mut shutdown) = shutdown_channel();
        drop(trigger);
        assert!(shutdown.is_triggered());

        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .expect("Dropped trigger should count as shutdown.");
    }
}
