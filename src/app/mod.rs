//! Application layer wiring the store, ingestion, queries and fan-out.
//!
//! [`Monitor`] is the composition root: it owns the single state store and
//! hands shared references of it to the [`EventIngestor`] and the
//! [`QueryEvaluator`], which never talk to each other directly.
//!
//! ```text
//! pipe event  → EventIngestor ─put→ StateStore ←get─ QueryEvaluator ← pipe query
//!                     │
//!                     └→ NotificationFanout → requery listeners
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effects for the plugin runtime to execute
//! - [`handler`]: Maps incoming [`Event`]s to actions

pub mod actions;
pub mod handler;

pub use actions::Action;
pub use handler::{handle_event, Event};

use crate::domain::error::Result;
use crate::domain::{AbsencePolicy, DeviceRegistry};
use crate::ingest::EventIngestor;
use crate::notify::{NotificationFanout, StateListener};
use crate::query::QueryEvaluator;
use crate::storage::{JsonStateStore, StateStore};
use crate::Config;
use std::sync::Arc;

/// The assembled state-tracking core.
pub struct Monitor {
    fanout: Arc<NotificationFanout>,
    ingestor: EventIngestor,
    evaluator: QueryEvaluator,
    registry: DeviceRegistry,
}

impl Monitor {
    /// Assembles a monitor around an existing store, with the legacy absence
    /// policy and an empty device registry.
    ///
    /// # Examples
    ///
    /// ```
    /// use aclwatch::app::Monitor;
    /// use aclwatch::query::QueryRequest;
    /// use aclwatch::storage::MemoryStateStore;
    /// use aclwatch::{ConnectivityEvent, QueryVerdict, TransitionKind};
    /// use std::sync::Arc;
    ///
    /// let monitor = Monitor::new(Arc::new(MemoryStateStore::new()));
    /// monitor.ingestor().ingest(&ConnectivityEvent::new(TransitionKind::Connected, "AA:BB")).unwrap();
    ///
    /// let verdict = monitor.evaluator().evaluate_request(&QueryRequest::new("AA:BB", true))?;
    /// assert_eq!(verdict, QueryVerdict::Satisfied);
    /// # Ok::<(), aclwatch::AclError>(())
    /// ```
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let fanout = Arc::new(NotificationFanout::new());
        Self {
            ingestor: EventIngestor::new(Arc::clone(&store), Arc::clone(&fanout)),
            evaluator: QueryEvaluator::new(store),
            fanout,
            registry: DeviceRegistry::default(),
        }
    }

    /// Opens the file-backed store and device registry named by `config`.
    ///
    /// A registry that fails to load is logged and replaced by an empty one;
    /// display names are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be opened or parsed.
    pub fn open(config: &Config) -> Result<Self> {
        let state_path = config.state_path();
        let store = JsonStateStore::open(&state_path)?;

        let registry = config.devices_path().map_or_else(DeviceRegistry::default, |path| {
            DeviceRegistry::from_file(&path).unwrap_or_else(|e| {
                tracing::warn!(path = ?path, error = %e, "failed to load device registry, names disabled");
                DeviceRegistry::default()
            })
        });

        tracing::debug!(
            state_path = ?state_path,
            named_devices = registry.len(),
            absence = ?config.unknown_devices,
            "monitor opened"
        );

        Ok(Self::new(Arc::new(store))
            .with_absence_policy(config.unknown_devices)
            .with_registry(registry))
    }

    #[must_use]
    pub fn with_absence_policy(mut self, absence: AbsencePolicy) -> Self {
        self.evaluator = self.evaluator.with_absence_policy(absence);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: DeviceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Subscribes a listener to requery signals.
    pub fn register_listener(&self, listener: Arc<dyn StateListener>) {
        self.fanout.register(listener);
    }

    #[must_use]
    pub const fn ingestor(&self) -> &EventIngestor {
        &self.ingestor
    }

    #[must_use]
    pub const fn evaluator(&self) -> &QueryEvaluator {
        &self.evaluator
    }

    #[must_use]
    pub const fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("fanout", &self.fanout)
            .field("evaluator", &self.evaluator)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectivityEvent, QueryVerdict, TransitionKind};
    use crate::query::QueryRequest;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            state_file: Some(dir.join("state.json").to_string_lossy().into_owned()),
            ..Config::default()
        }
    }

    #[test]
    fn open_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        {
            let monitor = Monitor::open(&config).unwrap();
            monitor
                .ingestor()
                .ingest(&ConnectivityEvent::new(TransitionKind::Connected, "AA:BB"))
                .unwrap();
        }

        let monitor = Monitor::open(&config).unwrap();
        let verdict = monitor
            .evaluator()
            .evaluate_request(&QueryRequest::new("AA:BB", true))
            .unwrap();
        assert_eq!(verdict, QueryVerdict::Satisfied);
    }

    #[test]
    fn open_applies_absence_policy_and_registry() {
        let dir = tempfile::tempdir().unwrap();
        let devices = dir.path().join("devices.toml");
        std::fs::write(&devices, "[[device]]\naddress = \"AA:BB\"\nname = \"Car\"\n").unwrap();

        let config = Config {
            devices_file: Some(devices.to_string_lossy().into_owned()),
            unknown_devices: AbsencePolicy::Indeterminate,
            ..config_in(dir.path())
        };

        let monitor = Monitor::open(&config).unwrap();
        assert_eq!(monitor.registry().name_of("AA:BB"), Some("Car"));
        assert_eq!(
            monitor.evaluator().evaluate_request(&QueryRequest::new("AA:BB", false)).unwrap(),
            QueryVerdict::Indeterminate
        );
    }

    #[test]
    fn broken_registry_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            devices_file: Some(dir.path().join("missing.toml").to_string_lossy().into_owned()),
            ..config_in(dir.path())
        };

        let monitor = Monitor::open(&config).unwrap();
        assert!(monitor.registry().is_empty());
    }
}
