//! Storage record models for the persistence layer.

use serde::{Deserialize, Serialize};

/// Persisted state of one peer device.
///
/// The identifier is the key of the surrounding map and is not repeated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// `true` if the last observed transition was a connect.
    pub connected: bool,

    /// Unix timestamp of the transition that produced this record.
    #[serde(default)]
    pub updated_at: i64,
}

impl DeviceRecord {
    /// Creates a record stamped with the current time.
    ///
    /// # Examples
    ///
    /// ```
    /// use aclwatch::storage::DeviceRecord;
    ///
    /// let record = DeviceRecord::new(true);
    /// assert!(record.connected);
    /// assert!(record.updated_at > 0);
    /// ```
    #[must_use]
    pub fn new(connected: bool) -> Self {
        Self {
            connected,
            updated_at: chrono::Utc::now().timestamp(),
        }
    }
}
