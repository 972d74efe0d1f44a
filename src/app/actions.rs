//! Actions representing side effects to be executed by the plugin runtime.
//!
//! The event handler never talks to Zellij itself. It returns a list of
//! actions that `main.rs` executes against the pipe the message came from.

/// Commands for the plugin runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Writes a line of output back to the originating CLI pipe.
    Reply(String),

    /// Releases the originating CLI pipe so the sender can exit.
    Unblock,
}
