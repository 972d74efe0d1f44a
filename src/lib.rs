//! aclwatch: a Zellij plugin that tracks peer device connections.
//!
//! aclwatch records the last observed connection state of each peer device
//! (for example a Bluetooth ACL link to a car stereo) and answers condition
//! queries of the form "is device X currently connected / disconnected?" with
//! one of three verdicts: satisfied, unsatisfied or indeterminate.

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Zellij Plugin Shim (main.rs)                       │  ← Pipe messages
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Application Layer (app/)                           │  ← Monitor, handler
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Ingest        │   │ Query         │   │ Notify        │
//! │ (ingest/)     │   │ (query/)      │   │ (notify/)     │
//! │ - Validation  │   │ - Envelopes   │   │ - Listeners   │
//! │ - Store write │   │ - Verdicts    │   │ - Requery     │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Storage (storage/)                                 │  ← Sole sync point
//! │  - StateStore trait, JSON file and memory backends  │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain, Infrastructure, Observability              │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: Composition root and pipe message handling
//! - [`domain`]: Events, verdicts, errors and the device registry
//! - [`ingest`]: Connectivity event ingestion
//! - [`query`]: Envelope validation and condition evaluation
//! - [`notify`]: Requery fan-out
//! - [`storage`]: Durable device state
//! - [`infrastructure`]: Sandbox paths
//! - `observability`: OpenTelemetry tracing to a rotating file
//!
//! # Configuration
//!
//! ```kdl
//! load_plugins {
//!     "file:/path/to/aclwatch.wasm" {
//!         devices_file "~/.config/aclwatch/devices.toml"
//!         unknown_devices "disconnected"
//!         trace_level "debug"
//!     }
//! }
//! ```
//!
//! # Example
//!
//! ```rust
//! use aclwatch::app::Monitor;
//! use aclwatch::query::QueryRequest;
//! use aclwatch::storage::MemoryStateStore;
//! use aclwatch::{ConnectivityEvent, QueryVerdict, TransitionKind};
//! use std::sync::Arc;
//!
//! let monitor = Monitor::new(Arc::new(MemoryStateStore::new()));
//!
//! monitor.ingestor().ingest(&ConnectivityEvent::new(TransitionKind::Connected, "AA:BB")).unwrap();
//!
//! let request = QueryRequest::new("AA:BB", false);
//! let verdict = monitor.evaluator().evaluate(&request.to_envelope())?;
//! assert_eq!(verdict, QueryVerdict::Unsatisfied);
//! # Ok::<(), aclwatch::AclError>(())
//! ```

pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod ingest;
pub mod notify;
pub mod query;
pub mod storage;

pub mod observability;

pub use app::{handle_event, Action, Event, Monitor};
pub use domain::{
    AbsencePolicy, AclError, ConnectivityEvent, DeviceRegistry, QueryVerdict, Rejected, Result,
    TransitionKind,
};

use std::collections::BTreeMap;
use std::path::PathBuf;

/// File name of the state store inside the data directory.
const STATE_FILE_NAME: &str = "last_known_state.json";

/// Default trace file size before rotation (5 MiB).
const DEFAULT_TRACE_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Default number of rotated trace files kept.
const DEFAULT_TRACE_BACKUPS: usize = 2;

/// Plugin configuration parsed from Zellij's configuration system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the JSON state file. `~` expands to the sandbox host mount.
    ///
    /// Default: `<data dir>/last_known_state.json`
    pub state_file: Option<String>,

    /// Optional TOML registry of device display names.
    pub devices_file: Option<String>,

    /// How queries about never-observed devices are answered.
    ///
    /// Options: `disconnected` (default), `indeterminate`.
    pub unknown_devices: AbsencePolicy,

    /// `EnvFilter` directive for tracing. Default: `"info"`
    pub trace_level: Option<String>,

    /// Trace file size in bytes that triggers rotation.
    pub trace_max_bytes: u64,

    /// Number of rotated trace files to keep.
    pub trace_backups: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: None,
            devices_file: None,
            unknown_devices: AbsencePolicy::default(),
            trace_level: None,
            trace_max_bytes: DEFAULT_TRACE_MAX_BYTES,
            trace_backups: DEFAULT_TRACE_BACKUPS,
        }
    }
}

impl Config {
    /// Parses configuration from Zellij's configuration map.
    ///
    /// Unknown keys are ignored and unparseable values fall back to their
    /// defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use aclwatch::{AbsencePolicy, Config};
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("unknown_devices".to_string(), "indeterminate".to_string());
    /// map.insert("trace_backups".to_string(), "not a number".to_string());
    ///
    /// let config = Config::from_zellij(&map);
    /// assert_eq!(config.unknown_devices, AbsencePolicy::Indeterminate);
    /// assert_eq!(config.trace_backups, 2);
    /// ```
    #[must_use]
    pub fn from_zellij(config: &BTreeMap<String, String>) -> Self {
        let non_empty = |key: &str| {
            config
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let unknown_devices = config
            .get("unknown_devices")
            .and_then(|name| AbsencePolicy::from_name(name))
            .unwrap_or_default();

        let trace_max_bytes = config
            .get("trace_max_bytes")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|bytes| *bytes > 0)
            .unwrap_or(DEFAULT_TRACE_MAX_BYTES);

        let trace_backups = config
            .get("trace_backups")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TRACE_BACKUPS);

        Self {
            state_file: non_empty("state_file"),
            devices_file: non_empty("devices_file"),
            unknown_devices,
            trace_level: non_empty("trace_level"),
            trace_max_bytes,
            trace_backups,
        }
    }

    /// Resolved path of the state file.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.state_file.as_deref().map_or_else(
            || infrastructure::get_data_dir().join(STATE_FILE_NAME),
            |path| PathBuf::from(infrastructure::expand_tilde(path)),
        )
    }

    /// Resolved path of the device registry, if configured.
    #[must_use]
    pub fn devices_path(&self) -> Option<PathBuf> {
        self.devices_file
            .as_deref()
            .map(|path| PathBuf::from(infrastructure::expand_tilde(path)))
    }
}

/// Initializes the plugin core from configuration.
///
/// Opens the file-backed state store and the optional device registry.
/// Tracing is set up separately with [`observability::init_tracing`].
///
/// # Errors
///
/// Returns an error if the state file cannot be opened.
pub fn initialize(config: &Config) -> Result<Monitor> {
    tracing::debug!("initializing aclwatch plugin");
    Monitor::open(config)
}
