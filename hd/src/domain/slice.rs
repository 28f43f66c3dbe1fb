//! Slice domain type

use planstore::Record;
use serde::{Deserialize, Serialize};

/// A bounded sub-unit of a Plan's window, carrying its own query expression.
///
/// Constructed unbound; `plan_id` and the durable id are stitched in by the
/// persistence binding step after the parent Plan is saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slice {
    pub id: Option<i64>,
    pub plan_id: Option<i64>,

    /// 1-based position within the plan, contiguous and ascending.
    pub sequence: u32,

    /// Content hash over (provenance, operation, canonical slice spec).
    pub signature_hash: String,

    /// Canonical JSON of the slice spec (strategy, sub-window, boundaries).
    pub spec_json: String,

    /// Canonical hash and snapshot of the combined query expression.
    pub expr_hash: String,
    pub expr_snapshot: String,
}

impl Slice {
    pub fn bind_plan(&mut self, plan_id: i64) {
        self.plan_id = Some(plan_id);
    }
}

impl Record for Slice {
    fn collection_name() -> &'static str {
        "slices"
    }

    fn durable_id(&self) -> Option<i64> {
        self.id
    }

    fn bind_durable_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}
