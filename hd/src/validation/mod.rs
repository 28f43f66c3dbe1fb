//! Pre-assembly validation
//!
//! Invariant checks over trigger and config snapshot, run before any Plan
//! object is constructed. Failures are fatal to the current trigger and
//! leave no partial state behind.

mod rules;

pub use rules::{DEFAULT_BACKPRESSURE_THRESHOLD, ValidationError, Validator};
