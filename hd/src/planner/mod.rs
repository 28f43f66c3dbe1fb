//! Planning pipeline
//!
//! Window resolution, slice strategies, assembly and the service gluing them
//! to the read-side ports. One call, one synchronous pure computation.

pub mod assemble;
pub mod persist;
pub mod service;
pub mod slicing;
pub mod window;

use thiserror::Error;

use crate::canonical::CanonicalError;
use crate::ports::PortError;
use crate::validation::ValidationError;

pub use assemble::{PlanAssembler, PlanAssembly};
pub use persist::{PersistError, persist_assembly};
pub use service::{ErrorCatalog, PlannerService};
pub use slicing::{
    DEFAULT_MAX_SLICES, SingleSlicePlanner, SliceContext, SliceDraft, SlicePlanner,
    TimeSlicePlanner, parse_iso8601_duration,
};

/// Failures of one planning call.
///
/// Zero-slice outcomes are not errors - they surface as a FAILED assembly so
/// the caller can persist the plan for observability.
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Canonical(#[from] CanonicalError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error("invalid step duration '{input}': {reason}")]
    InvalidStep { input: String, reason: String },

    #[error("slice budget exceeded: window requires more than {limit} slices")]
    SliceBudgetExceeded { limit: usize },
}
