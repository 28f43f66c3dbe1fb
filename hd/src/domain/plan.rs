//! Plan domain type
//!
//! A Plan is one scheduling cycle's unit of work for a (provenance,
//! operation) pair, parent of Slices and Tasks. Its durable id is assigned
//! by persistence; everything identity-bearing is derived from content.

use chrono::{DateTime, Utc};
use planstore::Record;
use serde::{Deserialize, Serialize};

use super::trigger::OperationCode;

/// Plan status state machine.
///
/// Draft -> Slicing -> Ready | Failed. Ready and Failed are terminal and set
/// exactly once per assembly call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Constructed, strategies not yet run.
    #[default]
    Draft,
    /// Slice strategies running.
    Slicing,
    /// Slices and tasks exist, ready for persistence and dispatch.
    Ready,
    /// Assembly produced no executable work.
    Failed,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Slicing => write!(f, "slicing"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One scheduling cycle's plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Durable id, assigned by persistence.
    pub id: Option<i64>,

    /// Scheduler firing this plan answers to.
    pub schedule_instance: String,

    /// Natural idempotency key for upsert-based dedup.
    pub plan_key: String,

    pub provenance_code: String,
    pub endpoint: String,
    pub operation: OperationCode,

    /// Canonical hash and snapshot of the base query expression.
    pub expr_hash: String,
    pub expr_snapshot: String,

    /// Canonical hash and snapshot of the window/offset config in force.
    pub config_snapshot_hash: String,
    pub config_snapshot: String,

    pub window_from: Option<DateTime<Utc>>,
    pub window_to: Option<DateTime<Utc>>,

    /// Code of the slice strategy that ran (TIME, SINGLE).
    pub slice_strategy: String,

    pub status: PlanStatus,
}

impl Plan {
    pub fn mark_slicing(&mut self) {
        self.status = PlanStatus::Slicing;
    }

    pub fn mark_ready(&mut self) {
        self.status = PlanStatus::Ready;
    }

    pub fn mark_failed(&mut self) {
        self.status = PlanStatus::Failed;
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, PlanStatus::Ready | PlanStatus::Failed)
    }
}

impl Record for Plan {
    fn collection_name() -> &'static str {
        "plans"
    }

    fn durable_id(&self) -> Option<i64> {
        self.id
    }

    fn bind_durable_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}
