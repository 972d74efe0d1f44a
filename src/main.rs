//! Zellij plugin wrapper and entry point.
//!
//! This module is the thin integration layer between the aclwatch library and
//! the Zellij plugin system. Everything that touches the Zellij host lives
//! here; the library only sees typed [`Event`]s and returns [`Action`]s.
//!
//! # Plugin Lifecycle
//!
//! 1. **Load**: Parse config, initialize tracing, open the state store
//! 2. **Listen**: Register a requery listener that broadcasts `acl-requery`
//! 3. **Permissions**: Request CLI pipe, plugin messaging and filesystem access
//! 4. **Pipe**: Translate each pipe message, delegate to the library, execute
//!    the returned actions
//!
//! # Usage
//!
//! ```text
//! zellij pipe --plugin file:aclwatch.wasm --name acl-event \
//!     -- '{"action": "acl.connected", "device": "AA:BB:CC:DD:EE:FF"}'
//! zellij pipe --plugin file:aclwatch.wasm --name acl-query \
//!     -- '{"device": "AA:BB:CC:DD:EE:FF", "state": true, "version": 1}'
//! 16 satisfied
//! ```

#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeMap;
use std::sync::Arc;
use zellij_tile::prelude::*;

use aclwatch::app::handler::PIPE_REQUERY;
use aclwatch::app::Monitor;
use aclwatch::{handle_event, Action, Config, Event};

register_plugin!(State);

/// Plugin state wrapper.
#[derive(Default)]
struct State {
    /// `None` until load succeeds; pipe messages are then answered with an
    /// error.
    monitor: Option<Monitor>,
}

impl ZellijPlugin for State {
    /// Initializes the plugin on load.
    ///
    /// # Permissions
    ///
    /// Requests:
    /// - `ReadCliPipes`: Receive and answer `zellij pipe` messages
    /// - `MessageAndLaunchOtherPlugins`: Broadcast requery signals
    /// - `FullHdAccess`: Read and write the state file
    fn load(&mut self, configuration: BTreeMap<String, String>) {
        let config = Config::from_zellij(&configuration);
        aclwatch::observability::init_tracing(&config);

        let span = tracing::debug_span!("plugin_load");
        let _guard = span.entered();

        tracing::debug!(
            state_path = ?config.state_path(),
            unknown_devices = ?config.unknown_devices,
            "parsed configuration"
        );

        match aclwatch::initialize(&config) {
            Ok(monitor) => {
                monitor.register_listener(Arc::new(|| -> aclwatch::Result<()> {
                    pipe_message_to_plugin(MessageToPlugin::new(PIPE_REQUERY));
                    Ok(())
                }));
                self.monitor = Some(monitor);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to open state store");
            }
        }

        request_permission(&[
            PermissionType::ReadCliPipes,
            PermissionType::MessageAndLaunchOtherPlugins,
            PermissionType::FullHdAccess,
        ]);
        subscribe(&[EventType::PermissionRequestResult]);

        tracing::debug!("plugin load complete");
    }

    fn update(&mut self, event: zellij_tile::prelude::Event) -> bool {
        if let zellij_tile::prelude::Event::PermissionRequestResult(status) = event {
            match status {
                PermissionStatus::Granted => tracing::debug!("permissions granted"),
                PermissionStatus::Denied => {
                    tracing::warn!("permissions denied - pipes and requery broadcasts unavailable");
                }
            }
        }
        false
    }

    /// Handles one pipe message. Never requests a render.
    fn pipe(&mut self, message: PipeMessage) -> bool {
        let span = tracing::debug_span!("plugin_pipe", pipe = %message.name);
        let _guard = span.entered();

        let cli_pipe = match &message.source {
            PipeSource::Cli(pipe_id) => Some(pipe_id.clone()),
            _ => None,
        };

        let event = Event::from_pipe(&message.name, message.payload.as_deref(), &message.args);
        let actions = match &self.monitor {
            Some(monitor) => handle_event(monitor, &event),
            None if matches!(event, Event::Unrelated { .. }) => Vec::new(),
            None => vec![
                Action::Reply("error: state store unavailable".to_string()),
                Action::Unblock,
            ],
        };

        if let Some(pipe_id) = cli_pipe {
            for action in &actions {
                execute_action(&pipe_id, action);
            }
        } else {
            tracing::trace!(action_count = actions.len(), "no cli pipe to answer");
        }
        false
    }
}

/// Executes an action against the CLI pipe that sent the message.
#[tracing::instrument(level = "trace")]
fn execute_action(pipe_id: &str, action: &Action) {
    match action {
        Action::Reply(text) => cli_pipe_output(pipe_id, &format!("{text}\n")),
        Action::Unblock => unblock_cli_pipe_input(pipe_id),
    }
}
