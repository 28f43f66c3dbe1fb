//! Normalized trigger input
//!
//! Scheduler adapters (cron, XXL-style) translate their firing payloads into
//! this shape before the planner sees them. The planner never talks to a
//! scheduler directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::priority::Priority;

/// Operation kind a trigger requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationCode {
    /// Forward ingest from the watermark toward now.
    Harvest,
    /// Historical ingest below the forward watermark.
    Backfill,
    /// Re-fetch of already-known records.
    Update,
}

impl std::fmt::Display for OperationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Harvest => write!(f, "HARVEST"),
            Self::Backfill => write!(f, "BACKFILL"),
            Self::Update => write!(f, "UPDATE"),
        }
    }
}

impl std::str::FromStr for OperationCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HARVEST" => Ok(Self::Harvest),
            "BACKFILL" => Ok(Self::Backfill),
            "UPDATE" => Ok(Self::Update),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}

/// How the trigger was fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerType {
    #[default]
    Schedule,
    Manual,
    Replay,
}

/// Normalized trigger, the planner's sole scheduling input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TriggerNorm {
    pub provenance_code: String,
    pub endpoint: String,
    pub operation: OperationCode,

    /// ISO-8601 slicing step override, e.g. "PT30M".
    #[serde(default)]
    pub step: Option<String>,

    #[serde(default)]
    pub trigger_type: TriggerType,

    /// Scheduler identity for audit: name plus job/log ids where known.
    pub scheduler: String,
    #[serde(default)]
    pub scheduler_job_id: Option<i64>,
    #[serde(default)]
    pub scheduler_log_id: Option<i64>,

    /// Manually requested window override.
    #[serde(default)]
    pub requested_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub requested_to: Option<DateTime<Utc>>,

    #[serde(default)]
    pub priority: Option<Priority>,

    pub triggered_at: DateTime<Utc>,
}

impl TriggerNorm {
    /// Trigger with only the required fields set, for tests and manual runs.
    pub fn new(
        provenance_code: impl Into<String>,
        endpoint: impl Into<String>,
        operation: OperationCode,
        triggered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            provenance_code: provenance_code.into(),
            endpoint: endpoint.into(),
            operation,
            step: None,
            trigger_type: TriggerType::Schedule,
            scheduler: "manual".to_string(),
            scheduler_job_id: None,
            scheduler_log_id: None,
            requested_from: None,
            requested_to: None,
            priority: None,
            triggered_at,
        }
    }

    /// Stable reference to the scheduler firing that produced this trigger.
    pub fn schedule_instance(&self) -> String {
        let job = self
            .scheduler_job_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let log = self
            .scheduler_log_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!("{}:{}:{}", self.scheduler, job, log)
    }

    /// True when the trigger carries a fully manual window.
    pub fn has_manual_window(&self) -> bool {
        self.requested_from.is_some() && self.requested_to.is_some()
    }
}
