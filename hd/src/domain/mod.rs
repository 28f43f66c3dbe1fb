//! Domain types for the planning core
//!
//! Plan, Slice and Task implement the planstore Record trait so the binding
//! step can stitch durable ids in after persistence.

mod expr;
mod plan;
mod priority;
mod slice;
mod task;
mod trigger;
mod window;

pub use expr::Expr;
pub use plan::{Plan, PlanStatus};
pub use priority::Priority;
pub use slice::Slice;
pub use task::Task;
pub use trigger::{OperationCode, TriggerNorm, TriggerType};
pub use window::{PlannerWindow, canonical_ts};

// Re-export planstore types for convenience
pub use planstore::{MemoryStore, Record, Store};
