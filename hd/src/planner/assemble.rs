//! Plan assembly
//!
//! Glues window resolution output and slice strategies into the
//! Plan/Slice/Task graph and drives the Plan state machine. The whole
//! procedure is pure: identical logical inputs produce byte-identical
//! identities. True dedup under concurrent triggers belongs to the
//! persistence layer's unique constraints on plan_key, signature_hash and
//! idempotency_key.

use serde_json::json;
use tracing::{debug, info};

use crate::canonical::{self, CanonicalError};
use crate::config::WindowOffsetConfig;
use crate::domain::{
    Expr, OperationCode, Plan, PlanStatus, PlannerWindow, Slice, Task, TriggerNorm,
};

use super::PlanningError;
use super::slicing::{SingleSlicePlanner, SliceContext, SlicePlanner, TimeSlicePlanner};

/// Product of one assembly call, unbound until persisted.
#[derive(Debug, Clone)]
pub struct PlanAssembly {
    pub plan: Plan,
    pub slices: Vec<Slice>,
    pub tasks: Vec<Task>,
}

impl PlanAssembly {
    /// READY or FAILED - terminal by the time an assembly is returned.
    pub fn status(&self) -> PlanStatus {
        self.plan.status
    }
}

/// Builds the Plan/Slice/Task graph for a validated trigger.
#[derive(Debug, Clone, Default)]
pub struct PlanAssembler {
    time: TimeSlicePlanner,
    single: SingleSlicePlanner,
}

impl PlanAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assemble(
        &self,
        trigger: &TriggerNorm,
        window: PlannerWindow,
        config: &WindowOffsetConfig,
        base_expr: &Expr,
    ) -> Result<PlanAssembly, PlanningError> {
        let expr_snapshot =
            canonical::snapshot(&base_expr.to_value().map_err(CanonicalError::from)?)?;
        let config_snapshot =
            canonical::snapshot(&serde_json::to_value(config).map_err(CanonicalError::from)?)?;

        let strategy: &dyn SlicePlanner = match trigger.operation {
            OperationCode::Update => &self.single,
            OperationCode::Harvest | OperationCode::Backfill => &self.time,
        };

        let mut plan = Plan {
            id: None,
            schedule_instance: trigger.schedule_instance(),
            plan_key: plan_key(trigger, &window),
            provenance_code: trigger.provenance_code.clone(),
            endpoint: trigger.endpoint.clone(),
            operation: trigger.operation,
            expr_hash: expr_snapshot.hash.clone(),
            expr_snapshot: expr_snapshot.canonical_json.clone(),
            config_snapshot_hash: config_snapshot.hash,
            config_snapshot: config_snapshot.canonical_json,
            window_from: window.from,
            window_to: window.to,
            slice_strategy: strategy.code().to_string(),
            status: PlanStatus::Draft,
        };

        plan.mark_slicing();
        debug!(plan_key = %plan.plan_key, strategy = strategy.code(), "slicing plan");

        let ctx = SliceContext {
            trigger,
            window: &window,
            base_expr,
            config,
        };
        let drafts = strategy.slice(&ctx)?;

        let operation = trigger.operation.to_string();
        let mut slices = Vec::with_capacity(drafts.len());
        let mut tasks = Vec::with_capacity(drafts.len());

        for draft in drafts {
            let spec_snapshot = canonical::snapshot(&draft.spec)?;
            let signature_hash = canonical::hash_parts(&[
                &trigger.provenance_code,
                &operation,
                &spec_snapshot.hash,
            ]);
            let combined =
                canonical::snapshot(&draft.expr.to_value().map_err(CanonicalError::from)?)?;

            let params = json!({
                "endpoint": trigger.endpoint,
                "query": combined.value,
                "spec": spec_snapshot.value,
            });
            let params_json = serde_json::to_string(&params).map_err(CanonicalError::from)?;

            tasks.push(Task {
                id: None,
                plan_id: None,
                slice_id: None,
                sequence: draft.sequence,
                provenance_code: trigger.provenance_code.clone(),
                operation: trigger.operation,
                params_json,
                idempotency_key: canonical::hash_parts(&[
                    &trigger.provenance_code,
                    &operation,
                    &signature_hash,
                ]),
                expr_hash: combined.hash.clone(),
                priority: trigger.priority.map(|p| p.ordinal()),
                requested_window_from: trigger.requested_from,
            });

            slices.push(Slice {
                id: None,
                plan_id: None,
                sequence: draft.sequence,
                signature_hash,
                spec_json: spec_snapshot.canonical_json,
                expr_hash: combined.hash,
                expr_snapshot: combined.canonical_json,
            });
        }

        if slices.is_empty() || tasks.is_empty() {
            plan.mark_failed();
            info!(plan_key = %plan.plan_key, "assembly produced no executable work, marking plan failed");
            return Ok(PlanAssembly {
                plan,
                slices: Vec::new(),
                tasks: Vec::new(),
            });
        }

        plan.mark_ready();
        info!(
            plan_key = %plan.plan_key,
            slices = slices.len(),
            "plan assembled"
        );
        Ok(PlanAssembly { plan, slices, tasks })
    }
}

// Natural idempotency key: stable for the same logical cycle so concurrent
// duplicate triggers upsert into one row.
fn plan_key(trigger: &TriggerNorm, window: &PlannerWindow) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        trigger.provenance_code,
        trigger.operation,
        trigger.endpoint,
        PlannerWindow::key_part(window.from),
        PlannerWindow::key_part(window.to),
    )
}
