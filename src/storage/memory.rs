//! In-memory state store.
//!
//! Holds records for the life of the process only. Used by tests and by
//! callers that deliberately want non-persistent state.

use crate::domain::error::Result;
use crate::storage::backend::{poisoned, validate_identifier, StateStore};
use crate::storage::models::DeviceRecord;
use std::collections::HashMap;
use std::sync::RwLock;

/// Memory-only [`StateStore`] backed by a `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: RwLock<HashMap<String, DeviceRecord>>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of devices with a recorded state.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.records.read().map_err(|e| poisoned(&e))?.len())
    }

    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl StateStore for MemoryStateStore {
    fn put(&self, id: &str, connected: bool) -> Result<()> {
        validate_identifier(id)?;

        let mut records = self.records.write().map_err(|e| poisoned(&e))?;
        records.insert(id.to_string(), DeviceRecord::new(connected));
        drop(records);

        tracing::trace!(device = %id, connected, "memory state updated");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<bool>> {
        let records = self.records.read().map_err(|e| poisoned(&e))?;
        Ok(records.get(id).map(|record| record.connected))
    }
}
