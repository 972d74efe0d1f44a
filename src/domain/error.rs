//! Error types for the aclwatch plugin.
//!
//! This module defines the centralized error type [`AclError`] and a type alias
//! [`Result`] used by the store, the query path and configuration loading. Event
//! ingestion has its own rejection type, [`Rejected`], because most of its
//! failures are expected noise rather than faults.

use thiserror::Error;

/// The main error type for aclwatch operations.
///
/// Most variants carry a description or wrap an underlying error from the
/// standard library using `#[from]` for automatic conversion.
///
/// # Examples
///
/// ```
/// use aclwatch::AclError;
///
/// fn read_state() -> Result<(), AclError> {
///     Err(AclError::Storage("state file is locked".to_string()))
/// }
///
/// assert!(read_state().is_err());
/// ```
#[derive(Debug, Error)]
pub enum AclError {
    /// An empty device identifier reached the state store.
    ///
    /// Callers validate identifiers before writing, so this indicates a defect
    /// in the calling component rather than bad external input.
    #[error("invalid device identifier: identifier must not be empty")]
    InvalidIdentifier,

    /// Reading from or writing to the state store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration or the device registry is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for aclwatch operations.
pub type Result<T> = std::result::Result<T, AclError>;

/// Reasons an inbound connectivity event was not applied.
///
/// `UnrecognizedEventKind` and `MissingIdentifier` describe malformed events
/// from a shared broadcast channel and are dropped without being reported.
/// `StorageFailure` is a real fault and is returned to the caller.
#[derive(Debug, Error)]
pub enum Rejected {
    /// The event carried no transition kind, or one that is neither
    /// connected nor disconnected.
    #[error("unrecognized event kind")]
    UnrecognizedEventKind,

    /// The event carried no device identifier, or an empty one.
    #[error("event is missing a device identifier")]
    MissingIdentifier,

    /// The state store could not durably record the new state.
    #[error("failed to record device state: {0}")]
    StorageFailure(#[source] AclError),
}

impl Rejected {
    /// Returns `true` when the rejection is expected channel noise that should
    /// be dropped silently.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::UnrecognizedEventKind | Self::MissingIdentifier)
    }
}
