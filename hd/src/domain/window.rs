//! Planner window type

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Half-open execution window `[from, to)`.
///
/// Both ends absent means a full, unbounded scan. Only UPDATE operations
/// against a FULL-mode source ever resolve to that shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlannerWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl PlannerWindow {
    /// Window with both ends known.
    pub fn bounded(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Full-scan window with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// True when both ends are present and `from < to`.
    pub fn is_positive(&self) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => from < to,
            _ => false,
        }
    }

    /// Key fragment for one end: canonical timestamp, or "-" for an open end.
    pub fn key_part(end: Option<DateTime<Utc>>) -> String {
        end.map(canonical_ts).unwrap_or_else(|| "-".to_string())
    }
}

impl std::fmt::Display for PlannerWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            Self::key_part(self.from),
            Self::key_part(self.to)
        )
    }
}

/// Canonical timestamp form used in keys, slice specs and expressions.
pub fn canonical_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
