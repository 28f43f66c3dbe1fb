//! Validation rules over trigger and config

use chrono::Duration;
use thiserror::Error;

use crate::config::{OffsetType, WindowMode, WindowOffsetConfig};
use crate::domain::{OperationCode, TriggerNorm, canonical_ts};

/// Queued tasks per (provenance, operation) tolerated before new plans are
/// refused.
pub const DEFAULT_BACKPRESSURE_THRESHOLD: usize = 50;

const MIN_WINDOW_SIZE_SECS: i64 = 60;
const MAX_WINDOW_SIZE_SECS: i64 = 30 * 24 * 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("requested window is empty or inverted: {from} >= {to}")]
    InvertedWindow { from: String, to: String },

    #[error("window size {actual_secs}s outside allowed range [{min_secs}s, {max_secs}s]")]
    WindowSizeOutOfRange {
        actual_secs: i64,
        min_secs: i64,
        max_secs: i64,
    },

    #[error("{queued} queued tasks for {provenance}/{operation} exceed threshold {threshold}")]
    Backpressure {
        provenance: String,
        operation: OperationCode,
        queued: usize,
        threshold: usize,
    },

    #[error("window mode FULL cannot serve {operation} without a manual window")]
    FullModeWithoutWindow { operation: OperationCode },

    #[error("offset type {offset_type} requires an offset field or a default date field")]
    MissingOffsetField { offset_type: OffsetType },
}

/// Pre-assembly invariant checks.
#[derive(Debug, Clone)]
pub struct Validator {
    pub backpressure_threshold: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            backpressure_threshold: DEFAULT_BACKPRESSURE_THRESHOLD,
        }
    }
}

impl Validator {
    pub fn new(backpressure_threshold: usize) -> Self {
        Self {
            backpressure_threshold,
        }
    }

    /// Check a trigger against its config snapshot and the current backlog.
    pub fn validate(
        &self,
        trigger: &TriggerNorm,
        config: &WindowOffsetConfig,
        queued: usize,
    ) -> Result<(), ValidationError> {
        self.check_requested_window(trigger)?;
        self.check_window_size(config)?;
        self.check_backpressure(trigger, queued)?;
        self.check_full_mode(trigger, config)?;
        self.check_offset_fields(config)?;
        Ok(())
    }

    // An explicitly requested zero or inverted window can never plan work
    // for incremental operations.
    fn check_requested_window(&self, trigger: &TriggerNorm) -> Result<(), ValidationError> {
        if trigger.operation == OperationCode::Update {
            return Ok(());
        }
        if let (Some(from), Some(to)) = (trigger.requested_from, trigger.requested_to)
            && from >= to
        {
            return Err(ValidationError::InvertedWindow {
                from: canonical_ts(from),
                to: canonical_ts(to),
            });
        }
        Ok(())
    }

    fn check_window_size(&self, config: &WindowOffsetConfig) -> Result<(), ValidationError> {
        let size = config.window_size_duration();
        if size < Duration::seconds(MIN_WINDOW_SIZE_SECS)
            || size > Duration::seconds(MAX_WINDOW_SIZE_SECS)
        {
            return Err(ValidationError::WindowSizeOutOfRange {
                actual_secs: size.num_seconds(),
                min_secs: MIN_WINDOW_SIZE_SECS,
                max_secs: MAX_WINDOW_SIZE_SECS,
            });
        }
        Ok(())
    }

    fn check_backpressure(
        &self,
        trigger: &TriggerNorm,
        queued: usize,
    ) -> Result<(), ValidationError> {
        if queued > self.backpressure_threshold {
            return Err(ValidationError::Backpressure {
                provenance: trigger.provenance_code.clone(),
                operation: trigger.operation,
                queued,
                threshold: self.backpressure_threshold,
            });
        }
        Ok(())
    }

    // A source without incremental capability can only serve HARVEST or
    // BACKFILL when the operator supplies the bounds by hand.
    fn check_full_mode(
        &self,
        trigger: &TriggerNorm,
        config: &WindowOffsetConfig,
    ) -> Result<(), ValidationError> {
        if config.mode == WindowMode::Full
            && trigger.operation != OperationCode::Update
            && !trigger.has_manual_window()
        {
            return Err(ValidationError::FullModeWithoutWindow {
                operation: trigger.operation,
            });
        }
        Ok(())
    }

    fn check_offset_fields(&self, config: &WindowOffsetConfig) -> Result<(), ValidationError> {
        if matches!(config.offset_type, OffsetType::Date | OffsetType::Composite)
            && config.offset_field.is_none()
            && config.default_date_field.is_none()
        {
            return Err(ValidationError::MissingOffsetField {
                offset_type: config.offset_type,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeSpec;
    use chrono::{TimeZone, Utc};

    fn trigger(operation: OperationCode) -> TriggerNorm {
        TriggerNorm::new(
            "pubmed",
            "esearch",
            operation,
            Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        )
    }

    fn config() -> WindowOffsetConfig {
        WindowOffsetConfig {
            window_size: SizeSpec::new(24, "HOURS"),
            default_date_field: Some("PDAT".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_trigger_passes() {
        let validator = Validator::default();
        assert!(validator.validate(&trigger(OperationCode::Harvest), &config(), 0).is_ok());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut t = trigger(OperationCode::Harvest);
        t.requested_from = Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        t.requested_to = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        let err = Validator::default().validate(&t, &config(), 0).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedWindow { .. }));
    }

    #[test]
    fn test_inverted_window_allowed_for_update() {
        let mut t = trigger(OperationCode::Update);
        t.requested_from = Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        t.requested_to = Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());

        assert!(Validator::default().validate(&t, &config(), 0).is_ok());
    }

    #[test]
    fn test_window_size_too_small() {
        let mut c = config();
        c.window_size = SizeSpec::new(30, "SECONDS");

        let err = Validator::default()
            .validate(&trigger(OperationCode::Harvest), &c, 0)
            .unwrap_err();
        assert!(matches!(err, ValidationError::WindowSizeOutOfRange { .. }));
    }

    #[test]
    fn test_window_size_too_large() {
        let mut c = config();
        c.window_size = SizeSpec::new(31, "DAYS");

        let err = Validator::default()
            .validate(&trigger(OperationCode::Harvest), &c, 0)
            .unwrap_err();
        assert!(matches!(err, ValidationError::WindowSizeOutOfRange { .. }));
    }

    #[test]
    fn test_backpressure_threshold() {
        let validator = Validator::default();
        assert!(validator.validate(&trigger(OperationCode::Harvest), &config(), 50).is_ok());

        let err = validator
            .validate(&trigger(OperationCode::Harvest), &config(), 51)
            .unwrap_err();
        assert!(matches!(err, ValidationError::Backpressure { queued: 51, .. }));
    }

    #[test]
    fn test_full_mode_needs_manual_window() {
        let mut c = config();
        c.mode = WindowMode::Full;

        let err = Validator::default()
            .validate(&trigger(OperationCode::Harvest), &c, 0)
            .unwrap_err();
        assert!(matches!(err, ValidationError::FullModeWithoutWindow { .. }));

        // Manual window makes it plannable
        let mut t = trigger(OperationCode::Harvest);
        t.requested_from = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        t.requested_to = Some(Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap());
        assert!(Validator::default().validate(&t, &c, 0).is_ok());

        // UPDATE never needs one
        assert!(Validator::default().validate(&trigger(OperationCode::Update), &c, 0).is_ok());
    }

    #[test]
    fn test_date_offset_requires_a_field() {
        let mut c = config();
        c.offset_type = OffsetType::Date;
        c.offset_field = None;
        c.default_date_field = None;

        let err = Validator::default()
            .validate(&trigger(OperationCode::Harvest), &c, 0)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingOffsetField {
                offset_type: OffsetType::Date
            }
        );
    }

    #[test]
    fn test_id_offset_needs_no_field() {
        let mut c = config();
        c.offset_type = OffsetType::Id;
        c.offset_field = None;
        c.default_date_field = None;

        assert!(Validator::default().validate(&trigger(OperationCode::Update), &c, 0).is_ok());
    }
}
