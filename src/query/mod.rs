//! Query path: envelope validation and verdict computation.
//!
//! - `envelope`: Envelope format, [`EnvelopeValidator`] and [`QueryRequest`]
//! - `evaluator`: [`QueryEvaluator`], the read side of the state store

pub mod envelope;
pub mod evaluator;

pub use envelope::{BundleValidator, EnvelopeValidator, QueryRequest};
pub use evaluator::QueryEvaluator;
