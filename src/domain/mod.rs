//! Domain layer for the aclwatch plugin.
//!
//! Core types shared by the ingestion and query paths, independent of Zellij
//! APIs and of how state is persisted.
//!
//! # Organization
//!
//! - [`error`]: Error types, ingestion rejections and result alias
//! - [`event`]: Connectivity-change events and transition kinds
//! - [`verdict`]: Query verdicts, host result codes and the absence policy
//! - [`device`]: Optional registry of device display names

pub mod device;
pub mod error;
pub mod event;
pub mod verdict;

pub use device::DeviceRegistry;
pub use error::{AclError, Rejected, Result};
pub use event::{ConnectivityEvent, TransitionKind};
pub use verdict::{AbsencePolicy, QueryVerdict};
