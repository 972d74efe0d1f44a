//! Requery fan-out to registered listeners.
//!
//! After a device state is durably recorded, interested parties (typically a
//! host rule engine holding a standing condition) are told that a re-query may
//! give a different answer. The signal carries no payload.

use crate::domain::error::{AclError, Result};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, RwLock};

/// Receiver of "state changed, please re-evaluate" signals.
///
/// Closures of the form `Fn() -> Result<()>` implement this trait.
pub trait StateListener: Send + Sync {
    /// Called once per successful state change.
    ///
    /// # Errors
    ///
    /// Errors are logged by the fan-out and otherwise ignored.
    fn on_state_changed(&self) -> Result<()>;
}

impl<F> StateListener for F
where
    F: Fn() -> Result<()> + Send + Sync,
{
    fn on_state_changed(&self) -> Result<()> {
        self()
    }
}

/// Listener that forwards each signal into an mpsc channel.
///
/// Delivery fails once the receiving end has been dropped.
#[derive(Debug)]
pub struct ChannelListener {
    sender: Mutex<Sender<()>>,
}

impl ChannelListener {
    #[must_use]
    pub fn new(sender: Sender<()>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl StateListener for ChannelListener {
    fn on_state_changed(&self) -> Result<()> {
        let sender = self
            .sender
            .lock()
            .map_err(|e| AclError::Storage(format!("listener lock poisoned: {e}")))?;
        sender
            .send(())
            .map_err(|_| AclError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "requery receiver dropped")))
    }
}

/// Best-effort broadcaster of requery signals.
///
/// Holds no state besides its listener registry. Listeners are called
/// synchronously, in no guaranteed order; one failing listener does not stop
/// delivery to the others and nothing is retried.
#[derive(Default)]
pub struct NotificationFanout {
    listeners: RwLock<Vec<Arc<dyn StateListener>>>,
}

impl NotificationFanout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for all future signals.
    pub fn register(&self, listener: Arc<dyn StateListener>) {
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(listener),
            Err(e) => tracing::error!(error = %e, "listener registry poisoned, listener dropped"),
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().map_or(0, |listeners| listeners.len())
    }

    /// Signals every registered listener that device state changed.
    ///
    /// Never fails. Delivery problems are logged at debug level.
    pub fn notify_state_changed(&self) {
        // Snapshot so listeners run without the registry lock held.
        let listeners: Vec<Arc<dyn StateListener>> = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(e) => {
                tracing::error!(error = %e, "listener registry poisoned, skipping requery");
                return;
            }
        };

        let mut failed = 0usize;
        for listener in &listeners {
            if let Err(e) = listener.on_state_changed() {
                failed += 1;
                tracing::debug!(error = %e, "requery listener failed");
            }
        }

        tracing::debug!(listeners = listeners.len(), failed, "requery signal sent");
    }
}

impl std::fmt::Debug for NotificationFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFanout")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn every_listener_is_signalled() {
        let fanout = NotificationFanout::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            fanout.register(Arc::new(move || -> Result<()> {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        fanout.notify_state_changed();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failing_listener_does_not_block_others() {
        let fanout = NotificationFanout::new();
        let (tx, rx) = mpsc::channel();

        fanout.register(Arc::new(|| -> Result<()> {
            Err(AclError::Storage("broadcast unavailable".into()))
        }));
        fanout.register(Arc::new(ChannelListener::new(tx)));

        fanout.notify_state_changed();
        assert_eq!(rx.try_recv(), Ok(()));
    }

    #[test]
    fn dropped_receiver_is_tolerated() {
        let fanout = NotificationFanout::new();
        let (tx, rx) = mpsc::channel();
        fanout.register(Arc::new(ChannelListener::new(tx)));
        drop(rx);

        fanout.notify_state_changed();
        assert_eq!(fanout.listener_count(), 1);
    }

    #[test]
    fn no_listeners_is_fine() {
        NotificationFanout::new().notify_state_changed();
    }
}
