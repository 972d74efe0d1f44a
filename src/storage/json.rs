//! JSON file-based state store.
//!
//! Keeps the whole device map in memory behind a mutex and rewrites the file
//! on every change using an atomic write (write-to-temp, fsync, rename). The
//! mutex is held across the write so the file always reflects the latest
//! in-memory state and a returning `put` means the state is on disk.
//!
//! # Performance Characteristics
//!
//! - **Read**: O(1) map lookup, no I/O
//! - **Write**: O(n), serializes and writes the entire map
//! - **Best for**: a handful to a few hundred paired devices

use crate::domain::error::{AclError, Result};
use crate::storage::backend::{poisoned, validate_identifier, StateStore};
use crate::storage::models::DeviceRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

/// Top-level structure serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateData {
    /// Version of the storage format for future migrations.
    version: u32,

    /// Last known state per device identifier.
    #[serde(default)]
    devices: BTreeMap<String, DeviceRecord>,
}

impl Default for StateData {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            devices: BTreeMap::new(),
        }
    }
}

/// File-backed [`StateStore`].
///
/// # File Format
///
/// ```json
/// {
///   "version": 1,
///   "devices": {
///     "AA:BB:CC:DD:EE:FF": { "connected": true, "updated_at": 1718000000 }
///   }
/// }
/// ```
#[derive(Debug)]
pub struct JsonStateStore {
    /// Path to the JSON file on disk.
    file_path: PathBuf,

    /// In-memory copy of the file, loaded on open.
    data: Mutex<StateData>,
}

impl JsonStateStore {
    /// Opens the store at `file_path`, creating parent directories as needed.
    ///
    /// A missing file starts an empty store; nothing is written until the
    /// first `put`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory creation fails
    /// - The file exists but cannot be read or contains invalid JSON
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use aclwatch::storage::{JsonStateStore, StateStore};
    ///
    /// let store = JsonStateStore::open("/tmp/last_known_state.json")?;
    /// store.put("AA:BB", true)?;
    /// # Ok::<(), aclwatch::AclError>(())
    /// ```
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        tracing::debug!(path = ?file_path, "opening JSON state store");

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("no state file yet, starting empty");
            StateData::default()
        };

        tracing::debug!(device_count = data.devices.len(), "state store ready");

        Ok(Self {
            file_path,
            data: Mutex::new(data),
        })
    }

    /// Returns a copy of every stored record, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn records(&self) -> Result<Vec<(String, DeviceRecord)>> {
        let data = self.data.lock().map_err(|e| poisoned(&e))?;
        Ok(data
            .devices
            .iter()
            .map(|(id, record)| (id.clone(), *record))
            .collect())
    }

    fn load_from_file(path: &Path) -> Result<StateData> {
        let contents = std::fs::read_to_string(path)?;
        let data: StateData = serde_json::from_str(&contents)
            .map_err(|e| AclError::Storage(format!("failed to parse state file: {e}")))?;

        if data.version > FORMAT_VERSION {
            return Err(AclError::Storage(format!(
                "state file version {} is newer than supported version {FORMAT_VERSION}",
                data.version
            )));
        }

        tracing::debug!(version = data.version, devices = data.devices.len(), "loaded state file");
        Ok(data)
    }

    /// Writes `data` to disk atomically.
    fn save_to_file(&self, data: &StateData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| AclError::Storage(format!("failed to serialize state: {e}")))?;

        let tmp_path = self.file_path.with_extension("json.tmp");

        tracing::trace!(tmp_path = ?tmp_path, "writing temporary state file");
        let written = Self::write_synced(&tmp_path, json.as_bytes())
            .and_then(|()| std::fs::rename(&tmp_path, &self.file_path));

        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
                tracing::warn!(tmp_path = ?tmp_path, error = %cleanup, "failed to remove temporary state file");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}

impl StateStore for JsonStateStore {
    fn put(&self, id: &str, connected: bool) -> Result<()> {
        validate_identifier(id)?;

        let _span = tracing::debug_span!("json_state_put", device = %id, connected).entered();

        let mut data = self.data.lock().map_err(|e| poisoned(&e))?;
        let previous = data.devices.insert(id.to_string(), DeviceRecord::new(connected));

        if let Err(e) = self.save_to_file(&data) {
            // Memory must not get ahead of disk.
            match previous {
                Some(record) => data.devices.insert(id.to_string(), record),
                None => data.devices.remove(id),
            };
            tracing::error!(error = %e, "failed to persist device state");
            return Err(e);
        }
        drop(data);

        tracing::debug!(changed = previous.map_or(true, |r| r.connected != connected), "device state saved");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<bool>> {
        let data = self.data.lock().map_err(|e| poisoned(&e))?;
        let state = data.devices.get(id).map(|record| record.connected);
        drop(data);

        tracing::trace!(device = %id, state = ?state, "device state lookup");
        Ok(state)
    }
}
