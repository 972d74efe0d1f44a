//! Connectivity-change events as delivered by the host transport.
//!
//! Events arrive from a shared channel and are untrusted: both fields are
//! optional and the action string may name activity this plugin does not care
//! about. Typed interpretation happens through [`ConnectivityEvent::kind`].

use serde_json::Value;

/// Action string announcing that a peer device connected.
pub const ACTION_CONNECTED: &str = "acl.connected";

/// Action string announcing that a peer device disconnected.
pub const ACTION_DISCONNECTED: &str = "acl.disconnected";

/// The two recognized transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Connected,
    Disconnected,
}

impl TransitionKind {
    /// Parses an action string. Matching is exact.
    #[must_use]
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            ACTION_CONNECTED => Some(Self::Connected),
            ACTION_DISCONNECTED => Some(Self::Disconnected),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_action(self) -> &'static str {
        match self {
            Self::Connected => ACTION_CONNECTED,
            Self::Disconnected => ACTION_DISCONNECTED,
        }
    }

    /// The connection state a device is in after this transition.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// A raw connectivity event.
///
/// ```json
/// { "action": "acl.connected", "device": "AA:BB:CC:DD:EE:FF" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectivityEvent {
    /// Transition action, see [`ACTION_CONNECTED`] and [`ACTION_DISCONNECTED`].
    pub action: Option<String>,

    /// Identifier of the peer device (usually a hardware address).
    pub device: Option<String>,
}

impl ConnectivityEvent {
    /// Builds a well-formed event for `device`.
    pub fn new(kind: TransitionKind, device: impl Into<String>) -> Self {
        Self {
            action: Some(kind.as_action().to_string()),
            device: Some(device.into()),
        }
    }

    /// Parses an event from its JSON payload.
    ///
    /// Each field is read on its own, so a mistyped `device` does not hide a
    /// valid `action`. Payloads that are not JSON objects become an empty
    /// event, which ingestion rejects as an unrecognized kind.
    #[must_use]
    pub fn from_payload(payload: &str) -> Self {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::trace!(error = %e, "unparseable event payload");
                return Self::default();
            }
        };

        let field = |key: &str| value.get(key).and_then(Value::as_str).map(String::from);
        Self {
            action: field("action"),
            device: field("device"),
        }
    }

    /// Returns the recognized transition kind, if any.
    #[must_use]
    pub fn kind(&self) -> Option<TransitionKind> {
        self.action.as_deref().and_then(TransitionKind::from_action)
    }

    /// Returns the device identifier when present and non-empty.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device.as_deref().filter(|id| !id.is_empty())
    }
}
