//! Event ingestion path: the write side of the state store.
//!
//! - `ingestor`: [`EventIngestor`] validation, store update and requery signal

pub mod ingestor;

pub use ingestor::{Applied, EventIngestor};
