//! Window resolution
//!
//! Pure translation of (trigger, config, watermark, now) into the half-open
//! execution window. No I/O: the caller supplies every external fact, so
//! replaying a trigger with the same inputs reproduces the same window.

use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Timelike, Utc};
use tracing::{debug, warn};

use crate::config::{CalendarAnchor, WindowMode, WindowOffsetConfig};
use crate::domain::{OperationCode, PlannerWindow, TriggerNorm};

/// Resolve the execution window for a trigger.
pub fn resolve(
    trigger: &TriggerNorm,
    config: &WindowOffsetConfig,
    watermark: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> PlannerWindow {
    let now_safe = now - config.watermark_lag();

    let window = match trigger.operation {
        OperationCode::Harvest => resolve_harvest(trigger, config, watermark, now_safe),
        OperationCode::Backfill => resolve_backfill(trigger, config, watermark, now_safe),
        OperationCode::Update => resolve_update(trigger, config, watermark, now_safe),
    };

    let window = clamp_span(window, config);
    let window = ensure_positive(window);

    debug!(
        operation = %trigger.operation,
        provenance = %trigger.provenance_code,
        window = %window,
        "resolved window"
    );
    window
}

fn resolve_harvest(
    trigger: &TriggerNorm,
    config: &WindowOffsetConfig,
    watermark: Option<DateTime<Utc>>,
    now_safe: DateTime<Utc>,
) -> PlannerWindow {
    let to = trigger.requested_to.map(|t| t.min(now_safe)).unwrap_or(now_safe);

    let from = match watermark {
        Some(wm) => {
            let base = wm - config.lookback();
            match trigger.requested_from {
                Some(user_from) => base.max(user_from),
                None => base,
            }
        }
        None => trigger
            .requested_from
            .unwrap_or_else(|| to - config.window_size_duration()),
    };

    align_calendar(config, from, to)
}

fn resolve_backfill(
    trigger: &TriggerNorm,
    config: &WindowOffsetConfig,
    watermark: Option<DateTime<Utc>>,
    now_safe: DateTime<Utc>,
) -> PlannerWindow {
    // Upper anchor: the user bound capped at safe-now. A forward watermark
    // would cap it further, but only one watermark is threaded through the
    // cursor port.
    let upper = trigger.requested_to.map(|t| t.min(now_safe)).unwrap_or(now_safe);

    let from = match watermark {
        Some(wm) => match trigger.requested_from {
            Some(user_from) => wm.max(user_from),
            None => wm,
        },
        None => trigger
            .requested_from
            .unwrap_or_else(|| upper - config.window_size_duration()),
    };

    let from = from.min(upper);
    align_calendar(config, from, upper)
}

fn resolve_update(
    trigger: &TriggerNorm,
    config: &WindowOffsetConfig,
    watermark: Option<DateTime<Utc>>,
    now_safe: DateTime<Utc>,
) -> PlannerWindow {
    use crate::config::OffsetType;

    let user_window = trigger.requested_from.is_some() || trigger.requested_to.is_some();

    // FULL-mode sources have no incremental semantics: an unconstrained
    // UPDATE walks the whole corpus.
    if config.mode == WindowMode::Full && !user_window {
        return PlannerWindow::unbounded();
    }

    if user_window || config.offset_type == OffsetType::Date {
        let to = trigger.requested_to.map(|t| t.min(now_safe)).unwrap_or(now_safe);
        let from = match (watermark, trigger.requested_from) {
            (Some(wm), Some(user_from)) => wm.max(user_from),
            (Some(wm), None) => wm,
            (None, Some(user_from)) => user_from,
            (None, None) => now_safe - config.window_size_duration(),
        };
        return PlannerWindow::bounded(from, to);
    }

    // ID-driven sources carry no date semantics; the window only scopes the
    // fetch recency.
    PlannerWindow::bounded(now_safe - config.window_size_duration(), now_safe)
}

// Floor both ends to the calendar anchor in the source-local offset.
// Alignment only applies to CALENDAR mode; a collapsed window degrades to
// the minimal guard window downstream.
fn align_calendar(
    config: &WindowOffsetConfig,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> PlannerWindow {
    if config.mode != WindowMode::Calendar {
        return PlannerWindow::bounded(from, to);
    }

    let floored_from = floor_to_anchor(from, config.calendar_anchor, config.utc_offset_secs);
    let floored_to = floor_to_anchor(to, config.calendar_anchor, config.utc_offset_secs);
    PlannerWindow::bounded(floored_from, floored_to)
}

fn floor_to_anchor(ts: DateTime<Utc>, anchor: CalendarAnchor, utc_offset_secs: i32) -> DateTime<Utc> {
    let Some(offset) = FixedOffset::east_opt(utc_offset_secs.clamp(-86_399, 86_399)) else {
        return ts;
    };
    let local = ts.with_timezone(&offset).naive_local();

    let floored = match anchor {
        CalendarAnchor::Hour => local.date().and_hms_opt(local.hour(), 0, 0),
        CalendarAnchor::Day => local.date().and_hms_opt(0, 0, 0),
        CalendarAnchor::Week => {
            let monday = local.date() - Duration::days(local.weekday().num_days_from_monday() as i64);
            monday.and_hms_opt(0, 0, 0)
        }
        CalendarAnchor::Month => local.date().with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
    };

    floored
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(ts)
}

fn clamp_span(window: PlannerWindow, config: &WindowOffsetConfig) -> PlannerWindow {
    if let (Some(from), Some(to), Some(max)) = (window.from, window.to, config.max_window_span())
        && to - from > max
    {
        warn!(window = %window, max_secs = max.num_seconds(), "window exceeds max span, clamping");
        return PlannerWindow::bounded(from, from + max);
    }
    window
}

// A non-positive resolved window substitutes the minimal guard window
// [from, from + 1s) instead of raising; downstream validation decides
// whether that is acceptable.
fn ensure_positive(window: PlannerWindow) -> PlannerWindow {
    match (window.from, window.to) {
        (Some(from), Some(to)) if from >= to => {
            warn!(window = %window, "resolved window non-positive, substituting minimal guard window");
            PlannerWindow::bounded(from, from + Duration::seconds(1))
        }
        _ => window,
    }
}
