//! Slice planning strategies
//!
//! A strategy decomposes a resolved window plus base expression into ordered
//! slice drafts. TIME tiles the window into step-sized sub-windows; SINGLE
//! wraps the whole scope into one slice for operations where windowing is
//! not meaningful.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::{OffsetType, WindowOffsetConfig};
use crate::domain::{Expr, PlannerWindow, TriggerNorm, canonical_ts};

use super::PlanningError;

/// Ceiling protecting against misconfigured step sizes producing unbounded
/// slice counts.
pub const DEFAULT_MAX_SLICES: usize = 1_000;

/// Everything a strategy may consult when decomposing a window.
pub struct SliceContext<'a> {
    pub trigger: &'a TriggerNorm,
    pub window: &'a PlannerWindow,
    pub base_expr: &'a Expr,
    pub config: &'a WindowOffsetConfig,
}

/// A slice before canonicalization and persistence.
#[derive(Debug, Clone)]
pub struct SliceDraft {
    /// 1-based position, contiguous and ascending.
    pub sequence: u32,
    /// Strategy-specific spec; its canonical form seeds the slice signature.
    pub spec: Value,
    /// Combined query expression for this slice.
    pub expr: Expr,
    pub sub_from: Option<DateTime<Utc>>,
    pub sub_to: Option<DateTime<Utc>>,
}

/// Strategy decomposing a window into ordered slice drafts.
///
/// An empty draft list is a legal outcome - the assembler turns it into a
/// FAILED plan, not an error.
pub trait SlicePlanner {
    fn code(&self) -> &'static str;

    fn slice(&self, ctx: &SliceContext<'_>) -> Result<Vec<SliceDraft>, PlanningError>;
}

/// Tiles `[from, to)` into step-sized sub-windows over a date field.
#[derive(Debug, Clone)]
pub struct TimeSlicePlanner {
    pub max_slices: usize,
}

impl Default for TimeSlicePlanner {
    fn default() -> Self {
        Self {
            max_slices: DEFAULT_MAX_SLICES,
        }
    }
}

impl SlicePlanner for TimeSlicePlanner {
    fn code(&self) -> &'static str {
        "TIME"
    }

    fn slice(&self, ctx: &SliceContext<'_>) -> Result<Vec<SliceDraft>, PlanningError> {
        let Some(field) = resolve_time_field(ctx.config) else {
            debug!(provenance = %ctx.trigger.provenance_code, "no resolvable time field, yielding no slices");
            return Ok(Vec::new());
        };
        let (Some(from), Some(to)) = (ctx.window.from, ctx.window.to) else {
            debug!("unbounded window cannot be time-sliced, yielding no slices");
            return Ok(Vec::new());
        };

        let step = match &ctx.trigger.step {
            Some(raw) => parse_iso8601_duration(raw)?,
            None => Duration::hours(1),
        };

        let mut drafts = Vec::new();
        let mut cursor = from;
        while cursor < to {
            if drafts.len() >= self.max_slices {
                return Err(PlanningError::SliceBudgetExceeded {
                    limit: self.max_slices,
                });
            }

            let upper = (cursor + step).min(to);
            let spec = json!({
                "strategy": "TIME",
                "window": { "from": canonical_ts(cursor), "to": canonical_ts(upper) },
                "boundary": { "from": "CLOSED", "to": "OPEN" },
            });
            let expr = Expr::and(vec![
                ctx.base_expr.clone(),
                Expr::date_range(field.as_str(), cursor, upper),
            ]);

            drafts.push(SliceDraft {
                sequence: (drafts.len() + 1) as u32,
                spec,
                expr,
                sub_from: Some(cursor),
                sub_to: Some(upper),
            });
            cursor = upper;
        }

        Ok(drafts)
    }
}

/// Emits the whole scope as one slice with the base expression untouched.
#[derive(Debug, Clone, Default)]
pub struct SingleSlicePlanner;

impl SlicePlanner for SingleSlicePlanner {
    fn code(&self) -> &'static str {
        "SINGLE"
    }

    fn slice(&self, ctx: &SliceContext<'_>) -> Result<Vec<SliceDraft>, PlanningError> {
        Ok(vec![SliceDraft {
            sequence: 1,
            spec: json!({ "strategy": "SINGLE" }),
            expr: ctx.base_expr.clone(),
            sub_from: None,
            sub_to: None,
        }])
    }
}

// The cursor field wins when the source paginates on dates; otherwise the
// configured default date field. Neither resolving is the strategy's cue to
// yield nothing.
fn resolve_time_field(config: &WindowOffsetConfig) -> Option<String> {
    if config.offset_type == OffsetType::Date
        && let Some(field) = &config.offset_field
    {
        return Some(field.clone());
    }
    config.default_date_field.clone()
}

/// Parse the subset of ISO-8601 durations schedulers send: `PnDTnHnMnS`.
pub fn parse_iso8601_duration(input: &str) -> Result<Duration, PlanningError> {
    let invalid = |reason: &str| PlanningError::InvalidStep {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let src = input.trim();
    let rest = src
        .strip_prefix('P')
        .or_else(|| src.strip_prefix('p'))
        .ok_or_else(|| invalid("missing leading 'P'"))?;

    let (date_part, time_part) = match rest.split_once(['T', 't']) {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut seconds: i64 = 0;
    let mut saw_component = false;

    for (part, units) in [
        (Some(date_part), &[('W', 604_800i64), ('D', 86_400)][..]),
        (time_part, &[('H', 3_600i64), ('M', 60), ('S', 1)][..]),
    ] {
        let Some(part) = part else { continue };
        let mut digits = String::new();
        for ch in part.chars() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            let scale = units
                .iter()
                .find(|(unit, _)| *unit == ch.to_ascii_uppercase())
                .map(|(_, scale)| *scale)
                .ok_or_else(|| invalid(&format!("unexpected designator '{}'", ch)))?;
            let value: i64 = digits
                .parse()
                .map_err(|_| invalid(&format!("missing value before '{}'", ch)))?;
            seconds = seconds
                .checked_add(value.checked_mul(scale).ok_or_else(|| invalid("overflow"))?)
                .ok_or_else(|| invalid("overflow"))?;
            digits.clear();
            saw_component = true;
        }
        if !digits.is_empty() {
            return Err(invalid("trailing digits without a designator"));
        }
    }

    if !saw_component {
        return Err(invalid("no duration components"));
    }
    if seconds <= 0 {
        return Err(invalid("step must be positive"));
    }
    Ok(Duration::seconds(seconds))
}
