//! Task domain type

use chrono::{DateTime, Utc};
use planstore::Record;
use serde::{Deserialize, Serialize};

use super::trigger::OperationCode;

/// Execution record derived 1:1 from a Slice, the unit handed downstream.
///
/// The outbox relay consumes persisted Tasks and emits exactly one
/// task-ready event per `idempotency_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub plan_id: Option<i64>,
    pub slice_id: Option<i64>,

    /// Mirrors the owning slice's sequence.
    pub sequence: u32,

    pub provenance_code: String,
    pub operation: OperationCode,

    /// Canonical JSON parameters for the fetch adapter.
    pub params_json: String,

    /// At-most-one live task per logical slice attempt.
    pub idempotency_key: String,

    pub expr_hash: String,

    /// Priority ordinal from the trigger, when one was supplied.
    pub priority: Option<i32>,

    pub requested_window_from: Option<DateTime<Utc>>,
}

impl Task {
    pub fn bind_parents(&mut self, plan_id: i64, slice_id: i64) {
        self.plan_id = Some(plan_id);
        self.slice_id = Some(slice_id);
    }
}

impl Record for Task {
    fn collection_name() -> &'static str {
        "tasks"
    }

    fn durable_id(&self) -> Option<i64> {
        self.id
    }

    fn bind_durable_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}
