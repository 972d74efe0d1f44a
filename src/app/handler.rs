//! Pipe message handling.
//!
//! Translates the three pipes this plugin listens on into calls on the
//! [`Monitor`] and decides what, if anything, is written back.
//!
//! # Pipes
//!
//! | Name            | Payload / args                              | Reply                         |
//! |-----------------|---------------------------------------------|-------------------------------|
//! | `acl-event`     | `{"action": "acl.connected", "device": ..}` | none (errors only)            |
//! | `acl-query`     | query envelope JSON                         | `16 satisfied` etc.           |
//! | `acl-condition` | args `device`, `state`                      | envelope JSON, then the blurb |
//!
//! Any other pipe name is ignored.
//!
//! # Example
//!
//! ```rust
//! use aclwatch::app::{handle_event, Action, Event, Monitor};
//! use aclwatch::storage::MemoryStateStore;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! let monitor = Monitor::new(Arc::new(MemoryStateStore::new()));
//! let event = Event::from_pipe(
//!     "acl-query",
//!     Some(r#"{"device": "AA:BB", "state": false, "version": 1}"#),
//!     &BTreeMap::new(),
//! );
//!
//! let actions = handle_event(&monitor, &event);
//! assert_eq!(actions, vec![Action::Reply("16 satisfied".to_string()), Action::Unblock]);
//! ```

use crate::app::{Action, Monitor};
use crate::domain::ConnectivityEvent;
use crate::query::QueryRequest;
use std::collections::BTreeMap;

/// Pipe carrying connectivity events.
pub const PIPE_EVENT: &str = "acl-event";

/// Pipe carrying condition queries.
pub const PIPE_QUERY: &str = "acl-query";

/// Pipe that renders a condition envelope and blurb.
pub const PIPE_CONDITION: &str = "acl-condition";

/// Pipe broadcast to all plugins after a state change.
pub const PIPE_REQUERY: &str = "acl-requery";

/// Typed pipe messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A connectivity change to record.
    Connectivity(ConnectivityEvent),

    /// A condition query; the payload is the raw envelope text.
    Query { payload: Option<String> },

    /// Request to build the envelope for a condition.
    DescribeCondition {
        device: Option<String>,
        state: Option<String>,
    },

    /// A pipe this plugin does not handle.
    Unrelated { name: String },
}

impl Event {
    /// Classifies a pipe message by name.
    #[must_use]
    pub fn from_pipe(name: &str, payload: Option<&str>, args: &BTreeMap<String, String>) -> Self {
        match name {
            PIPE_EVENT => Self::Connectivity(
                payload.map(ConnectivityEvent::from_payload).unwrap_or_default(),
            ),
            PIPE_QUERY => Self::Query {
                payload: payload.map(String::from),
            },
            PIPE_CONDITION => Self::DescribeCondition {
                device: args.get("device").cloned(),
                state: args.get("state").cloned(),
            },
            other => Self::Unrelated {
                name: other.to_string(),
            },
        }
    }
}

/// Handles one pipe message and returns the actions to execute.
///
/// Never fails: malformed input turns into an indeterminate verdict, a
/// silently dropped event, or an `error:` reply.
pub fn handle_event(monitor: &Monitor, event: &Event) -> Vec<Action> {
    match event {
        Event::Connectivity(connectivity) => handle_connectivity(monitor, connectivity),
        Event::Query { payload } => handle_query(monitor, payload.as_deref()),
        Event::DescribeCondition { device, state } => {
            describe_condition(monitor, device.as_deref(), state.as_deref())
        }
        Event::Unrelated { name } => {
            tracing::trace!(pipe = %name, "ignoring unrelated pipe message");
            Vec::new()
        }
    }
}

fn handle_connectivity(monitor: &Monitor, event: &ConnectivityEvent) -> Vec<Action> {
    match monitor.ingestor().ingest(event) {
        Ok(applied) => {
            tracing::debug!(
                device = %applied.device,
                name = monitor.registry().label(&applied.device),
                connected = applied.connected,
                "connectivity event applied"
            );
            vec![Action::Unblock]
        }
        Err(rejected) if rejected.is_silent() => vec![Action::Unblock],
        Err(rejected) => {
            tracing::error!(error = %rejected, "connectivity event lost");
            vec![Action::Reply(format!("error: {rejected}")), Action::Unblock]
        }
    }
}

fn handle_query(monitor: &Monitor, payload: Option<&str>) -> Vec<Action> {
    let reply = match monitor.evaluator().evaluate_payload(payload.unwrap_or_default()) {
        Ok(verdict) => format!("{} {verdict}", verdict.result_code()),
        Err(e) => {
            tracing::error!(error = %e, "condition query failed");
            format!("error: {e}")
        }
    };
    vec![Action::Reply(reply), Action::Unblock]
}

fn describe_condition(monitor: &Monitor, device: Option<&str>, state: Option<&str>) -> Vec<Action> {
    let Some(device) = device.filter(|d| !d.is_empty()) else {
        return vec![Action::Reply("error: missing device".to_string()), Action::Unblock];
    };

    let Some(expected_state) = state.and_then(parse_state) else {
        return vec![
            Action::Reply("error: state must be connected or disconnected".to_string()),
            Action::Unblock,
        ];
    };

    let request = QueryRequest::new(device, expected_state);
    vec![
        Action::Reply(request.to_envelope().to_string()),
        Action::Reply(request.blurb(monitor.registry())),
        Action::Unblock,
    ]
}

fn parse_state(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "connected" | "true" | "on" => Some(true),
        "disconnected" | "false" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceRegistry;
    use crate::storage::{MemoryStateStore, StateStore};
    use std::sync::Arc;

    fn monitor() -> (Arc<MemoryStateStore>, Monitor) {
        let store = Arc::new(MemoryStateStore::new());
        let mut registry = DeviceRegistry::default();
        registry.insert("AA:BB", "Headphones");
        let monitor = Monitor::new(store.clone()).with_registry(registry);
        (store, monitor)
    }

    fn pipe(name: &str, payload: &str) -> Event {
        Event::from_pipe(name, Some(payload), &BTreeMap::new())
    }

    #[test]
    fn event_pipe_updates_state_without_reply() {
        let (store, monitor) = monitor();

        let actions = handle_event(&monitor, &pipe(PIPE_EVENT, r#"{"action":"acl.connected","device":"AA:BB"}"#));
        assert_eq!(actions, vec![Action::Unblock]);
        assert_eq!(store.get("AA:BB").unwrap(), Some(true));
    }

    #[test]
    fn malformed_events_are_dropped_quietly() {
        let (store, monitor) = monitor();

        for payload in ["garbage", "{}", r#"{"action":"acl.connected"}"#, r#"{"action":"acl.paired","device":"AA:BB"}"#] {
            assert_eq!(handle_event(&monitor, &pipe(PIPE_EVENT, payload)), vec![Action::Unblock]);
        }
        let no_payload = Event::from_pipe(PIPE_EVENT, None, &BTreeMap::new());
        assert_eq!(handle_event(&monitor, &no_payload), vec![Action::Unblock]);

        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn query_pipe_replies_with_code_and_verdict() {
        let (store, monitor) = monitor();
        store.put("AA:BB", true).unwrap();

        let actions = handle_event(&monitor, &pipe(PIPE_QUERY, r#"{"device":"AA:BB","state":true,"version":1}"#));
        assert_eq!(actions[0], Action::Reply("16 satisfied".into()));

        let actions = handle_event(&monitor, &pipe(PIPE_QUERY, r#"{"device":"AA:BB","state":false,"version":1}"#));
        assert_eq!(actions[0], Action::Reply("17 unsatisfied".into()));

        let actions = handle_event(&monitor, &pipe(PIPE_QUERY, r#"{"device":"AA:BB"}"#));
        assert_eq!(actions[0], Action::Reply("18 indeterminate".into()));
    }

    #[test]
    fn query_without_payload_is_indeterminate() {
        let (_store, monitor) = monitor();
        let event = Event::from_pipe(PIPE_QUERY, None, &BTreeMap::new());
        assert_eq!(
            handle_event(&monitor, &event),
            vec![Action::Reply("18 indeterminate".into()), Action::Unblock]
        );
    }

    #[test]
    fn condition_pipe_renders_envelope_and_blurb() {
        let (_store, monitor) = monitor();
        let mut args = BTreeMap::new();
        args.insert("device".to_string(), "AA:BB".to_string());
        args.insert("state".to_string(), "connected".to_string());

        let actions = handle_event(&monitor, &Event::from_pipe(PIPE_CONDITION, None, &args));
        assert_eq!(actions.len(), 3);

        let Action::Reply(envelope) = &actions[0] else {
            panic!("expected envelope reply");
        };
        let envelope: serde_json::Value = serde_json::from_str(envelope).unwrap();
        assert_eq!(QueryRequest::from_envelope(&envelope), Some(QueryRequest::new("AA:BB", true)));
        assert_eq!(actions[1], Action::Reply("Connected: Headphones".into()));
    }

    #[test]
    fn condition_pipe_validates_args() {
        let (_store, monitor) = monitor();
        let mut args = BTreeMap::new();
        args.insert("device".to_string(), "AA:BB".to_string());
        args.insert("state".to_string(), "sometimes".to_string());

        let actions = handle_event(&monitor, &Event::from_pipe(PIPE_CONDITION, None, &args));
        assert!(matches!(&actions[0], Action::Reply(text) if text.starts_with("error:")));

        let actions = handle_event(&monitor, &Event::from_pipe(PIPE_CONDITION, None, &BTreeMap::new()));
        assert_eq!(actions[0], Action::Reply("error: missing device".into()));
    }

    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn put(&self, _id: &str, _connected: bool) -> crate::Result<()> {
            Err(crate::AclError::Storage("disk full".into()))
        }

        fn get(&self, _id: &str) -> crate::Result<Option<bool>> {
            Err(crate::AclError::Storage("disk unreadable".into()))
        }
    }

    #[test]
    fn storage_failure_on_query_replies_error() {
        let monitor = Monitor::new(Arc::new(BrokenStore));

        let actions = handle_event(&monitor, &pipe(PIPE_QUERY, r#"{"device":"AA:BB","state":true,"version":1}"#));
        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], Action::Reply(text) if text.starts_with("error: ") && text.contains("disk unreadable")));
        assert_ne!(actions[0], Action::Reply("18 indeterminate".into()));
        assert_eq!(actions[1], Action::Unblock);
    }

    #[test]
    fn storage_failure_on_event_replies_error() {
        let monitor = Monitor::new(Arc::new(BrokenStore));

        let actions = handle_event(&monitor, &pipe(PIPE_EVENT, r#"{"action":"acl.connected","device":"AA:BB"}"#));
        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], Action::Reply(text) if text.starts_with("error: ") && text.contains("disk full")));
        assert_eq!(actions[1], Action::Unblock);
    }

    #[test]
    fn unrelated_pipes_produce_no_actions() {
        let (_store, monitor) = monitor();
        assert!(handle_event(&monitor, &pipe("some-other-plugin", "{}")).is_empty());
        assert!(handle_event(&monitor, &pipe(PIPE_REQUERY, "")).is_empty());
    }
}
