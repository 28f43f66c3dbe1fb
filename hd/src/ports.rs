//! Read-side ports the planner depends on
//!
//! External adapters (cursor store, job queue) implement these. The core
//! never writes through them - watermark advancement and task dispatch are
//! caller responsibilities. `Fixed*` impls serve tests and one-shot CLI
//! planning.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::OperationCode;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("cursor backend error: {0}")]
    Cursor(String),

    #[error("backlog backend error: {0}")]
    Backlog(String),
}

/// Read access to the per-(provenance, operation) cursor watermark.
pub trait CursorReadPort {
    fn load_forward_watermark(
        &self,
        provenance: &str,
        operation: OperationCode,
    ) -> Result<Option<DateTime<Utc>>, PortError>;
}

/// Count of not-yet-executed tasks, the validator's backpressure input.
pub trait TaskBacklogPort {
    fn queued_task_count(
        &self,
        provenance: &str,
        operation: OperationCode,
    ) -> Result<usize, PortError>;
}

/// Fixed watermark, for tests and one-shot CLI planning.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCursor(pub Option<DateTime<Utc>>);

impl CursorReadPort for FixedCursor {
    fn load_forward_watermark(
        &self,
        _provenance: &str,
        _operation: OperationCode,
    ) -> Result<Option<DateTime<Utc>>, PortError> {
        Ok(self.0)
    }
}

/// Fixed queued-task count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedBacklog(pub usize);

impl TaskBacklogPort for FixedBacklog {
    fn queued_task_count(
        &self,
        _provenance: &str,
        _operation: OperationCode,
    ) -> Result<usize, PortError> {
        Ok(self.0)
    }
}
