//! Condition query evaluation.

use crate::domain::error::Result;
use crate::domain::{AbsencePolicy, QueryVerdict};
use crate::query::envelope::{BundleValidator, EnvelopeValidator, QueryRequest};
use crate::storage::StateStore;
use serde_json::Value;
use std::sync::Arc;

/// Answers "is device X currently in state S?" from the shared state store.
///
/// Evaluation never mutates state. Malformed input yields
/// [`QueryVerdict::Indeterminate`]; only a failing store read produces an
/// `Err`, so callers can tell "unanswerable" apart from "broken".
pub struct QueryEvaluator {
    store: Arc<dyn StateStore>,
    validator: Box<dyn EnvelopeValidator>,
    absence: AbsencePolicy,
}

impl QueryEvaluator {
    /// Creates an evaluator using [`BundleValidator`] and the legacy
    /// absence policy.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            validator: Box::new(BundleValidator),
            absence: AbsencePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Box<dyn EnvelopeValidator>) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub const fn with_absence_policy(mut self, absence: AbsencePolicy) -> Self {
        self.absence = absence;
        self
    }

    /// Evaluates a query envelope.
    ///
    /// # Errors
    ///
    /// Returns an error only if the state store read fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use aclwatch::query::{QueryEvaluator, QueryRequest};
    /// use aclwatch::storage::{MemoryStateStore, StateStore};
    /// use aclwatch::QueryVerdict;
    /// use std::sync::Arc;
    ///
    /// let store = Arc::new(MemoryStateStore::new());
    /// store.put("AA:BB", true)?;
    ///
    /// let evaluator = QueryEvaluator::new(store);
    /// let envelope = QueryRequest::new("AA:BB", true).to_envelope();
    /// assert_eq!(evaluator.evaluate(&envelope)?, QueryVerdict::Satisfied);
    /// # Ok::<(), aclwatch::AclError>(())
    /// ```
    pub fn evaluate(&self, envelope: &Value) -> Result<QueryVerdict> {
        let _span = tracing::debug_span!("evaluate_query").entered();

        if !self.validator.is_valid(envelope) {
            tracing::debug!("invalid envelope, answering indeterminate");
            return Ok(QueryVerdict::Indeterminate);
        }

        let Some(request) = QueryRequest::from_envelope(envelope) else {
            tracing::debug!("envelope passed validation but fields could not be extracted");
            return Ok(QueryVerdict::Indeterminate);
        };

        self.evaluate_request(&request)
    }

    /// Evaluates a query envelope given as JSON text.
    ///
    /// Text that is not JSON is treated like any other malformed envelope.
    ///
    /// # Errors
    ///
    /// Returns an error only if the state store read fails.
    pub fn evaluate_payload(&self, payload: &str) -> Result<QueryVerdict> {
        match serde_json::from_str::<Value>(payload) {
            Ok(envelope) => self.evaluate(&envelope),
            Err(e) => {
                tracing::debug!(error = %e, "query payload is not JSON");
                Ok(QueryVerdict::Indeterminate)
            }
        }
    }

    /// Evaluates an already extracted request.
    ///
    /// # Errors
    ///
    /// Returns an error only if the state store read fails.
    pub fn evaluate_request(&self, request: &QueryRequest) -> Result<QueryVerdict> {
        if request.device.is_empty() {
            tracing::debug!("empty device identifier, answering indeterminate");
            return Ok(QueryVerdict::Indeterminate);
        }

        let observed = self.store.get(&request.device)?;

        let verdict = observed.map_or_else(
            || self.absence.classify_absent(request.expected_state),
            |connected| QueryVerdict::compare(connected, request.expected_state),
        );

        tracing::debug!(
            device = %request.device,
            observed = ?observed,
            expected = request.expected_state,
            verdict = %verdict,
            "query evaluated"
        );
        Ok(verdict)
    }
}

impl std::fmt::Debug for QueryEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEvaluator")
            .field("absence", &self.absence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AclError;
    use crate::storage::MemoryStateStore;
    use serde_json::json;

    struct FailingStore;

    impl StateStore for FailingStore {
        fn put(&self, _id: &str, _connected: bool) -> Result<()> {
            Err(AclError::Storage("read-only".into()))
        }

        fn get(&self, _id: &str) -> Result<Option<bool>> {
            Err(AclError::Storage("device map unavailable".into()))
        }
    }

    struct RejectAll;

    impl EnvelopeValidator for RejectAll {
        fn is_valid(&self, _envelope: &Value) -> bool {
            false
        }
    }

    fn evaluator_with(states: &[(&str, bool)]) -> QueryEvaluator {
        let store = Arc::new(MemoryStateStore::new());
        for (id, connected) in states {
            store.put(id, *connected).unwrap();
        }
        QueryEvaluator::new(store)
    }

    #[test]
    fn matching_state_is_satisfied() {
        let evaluator = evaluator_with(&[("AA:BB", true), ("CC:DD", false)]);

        assert_eq!(evaluator.evaluate_request(&QueryRequest::new("AA:BB", true)).unwrap(), QueryVerdict::Satisfied);
        assert_eq!(evaluator.evaluate_request(&QueryRequest::new("AA:BB", false)).unwrap(), QueryVerdict::Unsatisfied);
        assert_eq!(evaluator.evaluate_request(&QueryRequest::new("CC:DD", false)).unwrap(), QueryVerdict::Satisfied);
        assert_eq!(evaluator.evaluate_request(&QueryRequest::new("CC:DD", true)).unwrap(), QueryVerdict::Unsatisfied);
    }

    #[test]
    fn unseen_device_compares_as_disconnected() {
        let evaluator = evaluator_with(&[]);

        assert_eq!(evaluator.evaluate_request(&QueryRequest::new("EE:FF", false)).unwrap(), QueryVerdict::Satisfied);
        assert_eq!(evaluator.evaluate_request(&QueryRequest::new("EE:FF", true)).unwrap(), QueryVerdict::Unsatisfied);
    }

    #[test]
    fn strict_policy_answers_indeterminate_for_unseen_device() {
        let evaluator = evaluator_with(&[("AA:BB", true)]).with_absence_policy(AbsencePolicy::Indeterminate);

        assert_eq!(evaluator.evaluate_request(&QueryRequest::new("EE:FF", false)).unwrap(), QueryVerdict::Indeterminate);
        assert_eq!(evaluator.evaluate_request(&QueryRequest::new("AA:BB", true)).unwrap(), QueryVerdict::Satisfied);
    }

    #[test]
    fn empty_identifier_is_indeterminate() {
        let evaluator = evaluator_with(&[]);
        let envelope = json!({"device": "", "state": false, "version": 1});
        assert_eq!(evaluator.evaluate(&envelope).unwrap(), QueryVerdict::Indeterminate);
    }

    #[test]
    fn malformed_envelopes_are_indeterminate() {
        let evaluator = evaluator_with(&[("AA:BB", false)]);

        for envelope in [
            Value::Null,
            json!("test"),
            json!({"state": false, "version": 1}),
            json!({"device": "AA:BB", "state": "false", "version": 1}),
            json!({"device": "AA:BB", "state": false, "version": 1, "extra": true}),
        ] {
            assert_eq!(evaluator.evaluate(&envelope).unwrap(), QueryVerdict::Indeterminate);
        }
        assert_eq!(evaluator.evaluate_payload("{ truncated").unwrap(), QueryVerdict::Indeterminate);
        assert_eq!(evaluator.evaluate_payload("").unwrap(), QueryVerdict::Indeterminate);
    }

    #[test]
    fn validator_is_consulted_first() {
        let evaluator = evaluator_with(&[("AA:BB", true)]).with_validator(Box::new(RejectAll));
        let envelope = QueryRequest::new("AA:BB", true).to_envelope();
        assert_eq!(evaluator.evaluate(&envelope).unwrap(), QueryVerdict::Indeterminate);
    }

    #[test]
    fn store_failure_is_an_error_not_indeterminate() {
        let evaluator = QueryEvaluator::new(Arc::new(FailingStore));
        let envelope = QueryRequest::new("AA:BB", true).to_envelope();
        assert!(matches!(evaluator.evaluate(&envelope), Err(AclError::Storage(_))));
    }

    #[test]
    fn malformed_query_never_reaches_the_store() {
        let evaluator = QueryEvaluator::new(Arc::new(FailingStore));
        assert_eq!(evaluator.evaluate(&json!({})).unwrap(), QueryVerdict::Indeterminate);
    }
}
