//! Requery notification after device state changes.
//!
//! - `fanout`: Listener registry and best-effort broadcast

pub mod fanout;

pub use fanout::{ChannelListener, NotificationFanout, StateListener};
