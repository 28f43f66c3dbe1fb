//! Planner service
//!
//! Synchronous orchestration of one trigger: backlog check, validation,
//! watermark load, window resolution, assembly. All I/O sits behind the
//! injected read ports; given the same port answers the service is as
//! deterministic as the assembler underneath it.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::ProvenanceConfigSnapshot;
use crate::domain::{Expr, TriggerNorm};
use crate::ports::{CursorReadPort, TaskBacklogPort};
use crate::validation::{ValidationError, Validator};

use super::assemble::{PlanAssembler, PlanAssembly};
use super::{PlanningError, window};

/// Stable error codes attached to planning failures for observability.
///
/// Built once at process start and injected; planner code never consults
/// global state for enrichment.
#[derive(Debug, Clone, Default)]
pub struct ErrorCatalog;

impl ErrorCatalog {
    pub fn code(&self, err: &PlanningError) -> &'static str {
        match err {
            PlanningError::Validation(ValidationError::InvertedWindow { .. }) => "PLN-VAL-001",
            PlanningError::Validation(ValidationError::WindowSizeOutOfRange { .. }) => {
                "PLN-VAL-002"
            }
            PlanningError::Validation(ValidationError::Backpressure { .. }) => "PLN-VAL-003",
            PlanningError::Validation(ValidationError::FullModeWithoutWindow { .. }) => {
                "PLN-VAL-004"
            }
            PlanningError::Validation(ValidationError::MissingOffsetField { .. }) => "PLN-VAL-005",
            PlanningError::Canonical(_) => "PLN-CAN-001",
            PlanningError::Port(_) => "PLN-PRT-001",
            PlanningError::InvalidStep { .. } => "PLN-SLC-001",
            PlanningError::SliceBudgetExceeded { .. } => "PLN-SLC-002",
        }
    }
}

/// One-stop entry point used by trigger adapters.
pub struct PlannerService<'a> {
    validator: Validator,
    assembler: PlanAssembler,
    catalog: ErrorCatalog,
    cursor: &'a dyn CursorReadPort,
    backlog: &'a dyn TaskBacklogPort,
}

impl<'a> PlannerService<'a> {
    pub fn new(cursor: &'a dyn CursorReadPort, backlog: &'a dyn TaskBacklogPort) -> Self {
        Self {
            validator: Validator::default(),
            assembler: PlanAssembler::new(),
            catalog: ErrorCatalog,
            cursor,
            backlog,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Plan one trigger against a config snapshot.
    ///
    /// `now` is passed in rather than read from the clock so replays are
    /// exact.
    pub fn plan(
        &self,
        trigger: &TriggerNorm,
        snapshot: &ProvenanceConfigSnapshot,
        base_expr: &Expr,
        now: DateTime<Utc>,
    ) -> Result<PlanAssembly, PlanningError> {
        match self.plan_inner(trigger, snapshot, base_expr, now) {
            Ok(assembly) => Ok(assembly),
            Err(err) => {
                warn!(
                    code = self.catalog.code(&err),
                    provenance = %trigger.provenance_code,
                    operation = %trigger.operation,
                    error = %err,
                    "planning failed"
                );
                Err(err)
            }
        }
    }

    fn plan_inner(
        &self,
        trigger: &TriggerNorm,
        snapshot: &ProvenanceConfigSnapshot,
        base_expr: &Expr,
        now: DateTime<Utc>,
    ) -> Result<PlanAssembly, PlanningError> {
        let queued = self
            .backlog
            .queued_task_count(&trigger.provenance_code, trigger.operation)?;
        self.validator.validate(trigger, &snapshot.window, queued)?;

        let watermark = self
            .cursor
            .load_forward_watermark(&trigger.provenance_code, trigger.operation)?;
        let window = window::resolve(trigger, &snapshot.window, watermark, now);

        info!(
            provenance = %trigger.provenance_code,
            operation = %trigger.operation,
            window = %window,
            "planning trigger"
        );
        self.assembler
            .assemble(trigger, window, &snapshot.window, base_expr)
    }
}
