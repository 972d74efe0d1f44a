//! Connectivity event ingestion.

use crate::domain::{ConnectivityEvent, Rejected, TransitionKind};
use crate::notify::NotificationFanout;
use crate::storage::StateStore;
use std::sync::Arc;

/// A successfully recorded transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub device: String,
    pub connected: bool,
}

/// Validates connectivity events and records them in the state store.
///
/// The write side of the store. Each applied event is followed by exactly one
/// synchronous requery signal, sent only after the store confirmed the write.
pub struct EventIngestor {
    store: Arc<dyn StateStore>,
    fanout: Arc<NotificationFanout>,
}

impl EventIngestor {
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, fanout: Arc<NotificationFanout>) -> Self {
        Self { store, fanout }
    }

    /// Validates and applies one event.
    ///
    /// Checks run in order and stop at the first failure: the transition kind
    /// must be recognized, then the device identifier must be non-empty.
    ///
    /// # Errors
    ///
    /// - [`Rejected::UnrecognizedEventKind`] / [`Rejected::MissingIdentifier`]
    ///   for malformed events; nothing is stored and nobody is notified.
    /// - [`Rejected::StorageFailure`] if the store write fails; listeners are
    ///   not notified and the write is not retried.
    ///
    /// # Examples
    ///
    /// ```
    /// use aclwatch::ingest::EventIngestor;
    /// use aclwatch::notify::NotificationFanout;
    /// use aclwatch::storage::{MemoryStateStore, StateStore};
    /// use aclwatch::{ConnectivityEvent, TransitionKind};
    /// use std::sync::Arc;
    ///
    /// let store = Arc::new(MemoryStateStore::new());
    /// let ingestor = EventIngestor::new(store.clone(), Arc::new(NotificationFanout::new()));
    ///
    /// ingestor.ingest(&ConnectivityEvent::new(TransitionKind::Connected, "AA:BB")).unwrap();
    /// assert_eq!(store.get("AA:BB").unwrap(), Some(true));
    /// ```
    pub fn ingest(&self, event: &ConnectivityEvent) -> Result<Applied, Rejected> {
        let Some(kind) = event.kind() else {
            tracing::trace!(action = ?event.action, "ignoring unrelated event");
            return Err(Rejected::UnrecognizedEventKind);
        };

        let Some(device) = event.device_id() else {
            tracing::trace!(action = kind.as_action(), "ignoring event without device");
            return Err(Rejected::MissingIdentifier);
        };

        self.apply(kind, device)
    }

    /// Records a transition that is already known to be well-formed apart
    /// from the identifier.
    ///
    /// # Errors
    ///
    /// Same as [`EventIngestor::ingest`], minus the kind check.
    pub fn apply(&self, kind: TransitionKind, device: &str) -> Result<Applied, Rejected> {
        if device.is_empty() {
            return Err(Rejected::MissingIdentifier);
        }

        let _span = tracing::debug_span!("ingest_event", device = %device, action = kind.as_action()).entered();
        let connected = kind.is_connected();

        self.store
            .put(device, connected)
            .map_err(Rejected::StorageFailure)?;

        tracing::debug!(connected, "device state recorded");
        self.fanout.notify_state_changed();

        Ok(Applied {
            device: device.to_string(),
            connected,
        })
    }
}

impl std::fmt::Debug for EventIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventIngestor")
            .field("fanout", &self.fanout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{AclError, Result};
    use crate::notify::ChannelListener;
    use crate::storage::MemoryStateStore;
    use std::sync::mpsc;

    struct FailingStore;

    impl StateStore for FailingStore {
        fn put(&self, _id: &str, _connected: bool) -> Result<()> {
            Err(AclError::Storage("disk full".into()))
        }

        fn get(&self, _id: &str) -> Result<Option<bool>> {
            Ok(None)
        }
    }

    fn setup() -> (Arc<MemoryStateStore>, EventIngestor, mpsc::Receiver<()>) {
        let store = Arc::new(MemoryStateStore::new());
        let fanout = Arc::new(NotificationFanout::new());
        let (tx, rx) = mpsc::channel();
        fanout.register(Arc::new(ChannelListener::new(tx)));
        let ingestor = EventIngestor::new(store.clone(), fanout);
        (store, ingestor, rx)
    }

    #[test]
    fn connect_and_disconnect_are_recorded() {
        let (store, ingestor, rx) = setup();

        let applied = ingestor
            .ingest(&ConnectivityEvent::new(TransitionKind::Connected, "AA:BB"))
            .unwrap();
        assert_eq!(applied, Applied { device: "AA:BB".into(), connected: true });
        assert_eq!(store.get("AA:BB").unwrap(), Some(true));

        ingestor
            .ingest(&ConnectivityEvent::new(TransitionKind::Disconnected, "AA:BB"))
            .unwrap();
        assert_eq!(store.get("AA:BB").unwrap(), Some(false));

        assert_eq!(rx.try_iter().count(), 2);
    }

    #[test]
    fn unrecognized_kind_is_rejected_without_side_effects() {
        let (store, ingestor, rx) = setup();

        for action in [None, Some("acl.bond_state_changed".to_string()), Some(String::new())] {
            let event = ConnectivityEvent {
                action,
                device: Some("AA:BB".into()),
            };
            assert!(matches!(ingestor.ingest(&event), Err(Rejected::UnrecognizedEventKind)));
        }

        assert!(store.is_empty().unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn kind_is_checked_before_identifier() {
        let (_store, ingestor, _rx) = setup();
        let event = ConnectivityEvent {
            action: Some("something.else".into()),
            device: None,
        };
        assert!(matches!(ingestor.ingest(&event), Err(Rejected::UnrecognizedEventKind)));
    }

    #[test]
    fn missing_identifier_is_rejected_without_side_effects() {
        let (store, ingestor, rx) = setup();

        let absent = ConnectivityEvent {
            action: Some("acl.connected".into()),
            device: None,
        };
        assert!(matches!(ingestor.ingest(&absent), Err(Rejected::MissingIdentifier)));
        assert!(matches!(
            ingestor.ingest(&ConnectivityEvent::new(TransitionKind::Connected, "")),
            Err(Rejected::MissingIdentifier)
        ));

        assert!(store.is_empty().unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn non_string_device_in_payload_is_missing_identifier() {
        let (store, ingestor, rx) = setup();

        let event = ConnectivityEvent::from_payload(r#"{"action":"acl.connected","device":5}"#);
        assert!(matches!(ingestor.ingest(&event), Err(Rejected::MissingIdentifier)));

        assert!(store.is_empty().unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn storage_failure_is_propagated_and_not_notified() {
        let fanout = Arc::new(NotificationFanout::new());
        let (tx, rx) = mpsc::channel();
        fanout.register(Arc::new(ChannelListener::new(tx)));
        let ingestor = EventIngestor::new(Arc::new(FailingStore), fanout);

        let result = ingestor.ingest(&ConnectivityEvent::new(TransitionKind::Connected, "AA:BB"));
        assert!(matches!(result, Err(Rejected::StorageFailure(AclError::Storage(_)))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn notification_follows_the_write() {
        let store = Arc::new(MemoryStateStore::new());
        let fanout = Arc::new(NotificationFanout::new());
        let (tx, rx) = mpsc::channel();

        let observer = Arc::clone(&store);
        fanout.register(Arc::new(move || -> Result<()> {
            // The listener must already see the new state.
            tx.send(observer.get("AA:BB")?)
                .map_err(|e| AclError::Storage(e.to_string()))
        }));

        let ingestor = EventIngestor::new(store, fanout);
        ingestor
            .ingest(&ConnectivityEvent::new(TransitionKind::Connected, "AA:BB"))
            .unwrap();

        assert_eq!(rx.try_recv(), Ok(Some(true)));
    }
}
