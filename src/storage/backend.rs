//! State store abstraction.
//!
//! This module defines the [`StateStore`] trait, the single synchronization
//! point between event ingestion and condition queries. Implementations own
//! every stored record; callers only ever see copies of the boolean state.

use crate::domain::error::{AclError, Result};

/// Durable, thread-safe mapping from device identifier to last-known
/// connection state.
///
/// Both methods take `&self` and may be called concurrently from any thread.
/// Implementations must guarantee per-key read-after-write consistency: once
/// `put` has returned, every later `get` for the same identifier observes the
/// new value. Any internal lock is held only for the duration of one call.
///
/// # Implementations
///
/// - [`JsonStateStore`](crate::storage::JsonStateStore): JSON file with atomic writes
/// - [`MemoryStateStore`](crate::storage::MemoryStateStore): in-process map for tests
///
/// # Examples
///
/// ```
/// use aclwatch::storage::{MemoryStateStore, StateStore};
///
/// let store = MemoryStateStore::new();
/// store.put("AA:BB", true)?;
/// assert_eq!(store.get("AA:BB")?, Some(true));
/// assert_eq!(store.get("CC:DD")?, None);
/// # Ok::<(), aclwatch::AclError>(())
/// ```
pub trait StateStore: Send + Sync {
    /// Records `connected` as the current state of `id`, replacing any
    /// previous value.
    ///
    /// The write is durable when this returns, so callers may notify others
    /// immediately afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AclError::InvalidIdentifier`] if `id` is empty, or
    /// [`AclError::Storage`]/[`AclError::Io`] if the write cannot complete.
    fn put(&self, id: &str, connected: bool) -> Result<()>;

    /// Returns the last recorded state of `id`, or `None` if the device was
    /// never observed.
    ///
    /// # Errors
    ///
    /// Returns an error if the read cannot complete.
    fn get(&self, id: &str) -> Result<Option<bool>>;
}

/// Rejects empty identifiers before they reach a backend.
///
/// # Errors
///
/// Returns [`AclError::InvalidIdentifier`] if `id` is empty.
pub(crate) fn validate_identifier(id: &str) -> Result<()> {
    if id.is_empty() {
        tracing::debug!("rejecting empty device identifier");
        return Err(AclError::InvalidIdentifier);
    }
    Ok(())
}

/// Maps a poisoned lock to a storage error.
pub(crate) fn poisoned<T>(e: &std::sync::PoisonError<T>) -> AclError {
    AclError::Storage(format!("state lock poisoned: {e}"))
}
