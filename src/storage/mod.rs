//! Storage layer for last-known device connection state.
//!
//! # Modules
//!
//! - `backend`: The [`StateStore`] trait shared by ingestion and queries
//! - `json`: JSON file-backed store with atomic writes
//! - `memory`: In-memory store for tests and ephemeral use
//! - `models`: Persisted record types

pub mod backend;
pub mod json;
pub mod memory;
pub mod models;

pub use backend::StateStore;
pub use json::JsonStateStore;
pub use memory::MemoryStateStore;
pub use models::DeviceRecord;
