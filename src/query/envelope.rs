//! Query envelopes: structural validation and typed extraction.
//!
//! The host stores a small JSON object per configured condition and hands it
//! back with every query. Anything may arrive here, so validation is strict and
//! never panics.
//!
//! # Envelope Format
//!
//! ```json
//! { "device": "AA:BB:CC:DD:EE:FF", "state": true, "version": 1 }
//! ```
//!
//! Exactly these three keys must be present, with exactly these JSON types.

use crate::domain::DeviceRegistry;
use serde_json::{Map, Value};

/// Key holding the device identifier (string).
pub const KEY_DEVICE: &str = "device";

/// Key holding the expected connection state (bool).
pub const KEY_STATE: &str = "state";

/// Key holding the version code of the plugin that wrote the envelope (integer).
pub const KEY_VERSION: &str = "version";

/// Version code stamped into envelopes built by this crate.
pub const ENVELOPE_VERSION: i64 = 1;

/// Structural validator for query envelopes.
pub trait EnvelopeValidator: Send + Sync {
    /// Returns `true` if `envelope` has the required fields with the
    /// required types.
    fn is_valid(&self, envelope: &Value) -> bool;
}

/// Validator for the envelope format written by [`QueryRequest::to_envelope`].
///
/// Rejects non-objects, missing keys, wrongly typed values and unknown keys.
/// An empty device string is structurally valid; the evaluator decides what
/// an empty identifier means.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleValidator;

impl EnvelopeValidator for BundleValidator {
    fn is_valid(&self, envelope: &Value) -> bool {
        let Some(fields) = envelope.as_object() else {
            tracing::debug!("envelope is not an object");
            return false;
        };

        if fields.len() != 3 {
            tracing::debug!(field_count = fields.len(), "envelope must have exactly 3 fields");
            return false;
        }

        let typed = fields.get(KEY_DEVICE).is_some_and(Value::is_string)
            && fields.get(KEY_STATE).is_some_and(Value::is_boolean)
            && fields.get(KEY_VERSION).is_some_and(Value::is_i64);

        if !typed {
            tracing::debug!(keys = ?fields.keys().collect::<Vec<_>>(), "envelope fields missing or mistyped");
        }
        typed
    }
}

/// A typed condition query: is `device` currently in `expected_state`?
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryRequest {
    /// Identifier of the peer device.
    pub device: String,

    /// `true` to ask "is it connected", `false` for "is it disconnected".
    pub expected_state: bool,
}

impl QueryRequest {
    pub fn new(device: impl Into<String>, expected_state: bool) -> Self {
        Self {
            device: device.into(),
            expected_state,
        }
    }

    /// Extracts the typed fields of an envelope.
    ///
    /// Returns `None` if either field is missing or has the wrong type. This
    /// does not replace structural validation.
    #[must_use]
    pub fn from_envelope(envelope: &Value) -> Option<Self> {
        let device = envelope.get(KEY_DEVICE)?.as_str()?;
        let expected_state = envelope.get(KEY_STATE)?.as_bool()?;
        Some(Self::new(device, expected_state))
    }

    /// Renders this request as an envelope accepted by [`BundleValidator`].
    ///
    /// # Examples
    ///
    /// ```
    /// use aclwatch::query::{BundleValidator, EnvelopeValidator, QueryRequest};
    ///
    /// let envelope = QueryRequest::new("AA:BB", true).to_envelope();
    /// assert!(BundleValidator.is_valid(&envelope));
    /// assert_eq!(QueryRequest::from_envelope(&envelope), Some(QueryRequest::new("AA:BB", true)));
    /// ```
    #[must_use]
    pub fn to_envelope(&self) -> Value {
        let mut fields = Map::new();
        fields.insert(KEY_DEVICE.to_string(), Value::from(self.device.clone()));
        fields.insert(KEY_STATE.to_string(), Value::from(self.expected_state));
        fields.insert(KEY_VERSION.to_string(), Value::from(ENVELOPE_VERSION));
        Value::Object(fields)
    }

    /// Short human-readable summary shown by the host next to the condition,
    /// e.g. `"Connected: Headphones"`.
    #[must_use]
    pub fn blurb(&self, registry: &DeviceRegistry) -> String {
        let state = if self.expected_state { "Connected" } else { "Disconnected" };
        format!("{state}: {}", registry.label(&self.device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_envelopes() {
        assert!(BundleValidator.is_valid(&json!({"device": "AA:BB", "state": true, "version": 0})));
        assert!(BundleValidator.is_valid(&json!({"device": "AA:BB", "state": false, "version": 1})));
        assert!(BundleValidator.is_valid(&json!({"device": "", "state": false, "version": 1})));
    }

    #[test]
    fn rejects_non_objects() {
        assert!(!BundleValidator.is_valid(&Value::Null));
        assert!(!BundleValidator.is_valid(&json!("test")));
        assert!(!BundleValidator.is_valid(&json!([1, 2, 3])));
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(!BundleValidator.is_valid(&json!({})));
        assert!(!BundleValidator.is_valid(&json!({"state": true, "version": 1})));
        assert!(!BundleValidator.is_valid(&json!({"device": "AA:BB", "version": 1})));
    }

    #[test]
    fn rejects_extra_fields() {
        let envelope = json!({"device": "AA:BB", "state": true, "version": 1, "test": "test"});
        assert!(!BundleValidator.is_valid(&envelope));
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(!BundleValidator.is_valid(&json!({"device": "AA:BB", "state": "test", "version": 1})));
        assert!(!BundleValidator.is_valid(&json!({"device": "AA:BB", "state": true, "version": "test"})));
        assert!(!BundleValidator.is_valid(&json!({"device": 42, "state": true, "version": 1})));
        assert!(!BundleValidator.is_valid(&json!({"device": "AA:BB", "state": true, "version": 1.5})));
    }

    #[test]
    fn key_names_are_stable() {
        assert_eq!(KEY_DEVICE, "device");
        assert_eq!(KEY_STATE, "state");
        assert_eq!(KEY_VERSION, "version");
    }

    #[test]
    fn blurb_uses_registry_name() {
        let mut registry = DeviceRegistry::default();
        registry.insert("AA:BB", "Headphones");

        assert_eq!(QueryRequest::new("AA:BB", true).blurb(&registry), "Connected: Headphones");
        assert_eq!(QueryRequest::new("CC:DD", false).blurb(&registry), "Disconnected: CC:DD");
    }
}
