//! Registry configuration types and loading
//!
//! The registry service owns per-provenance window/offset policy; the planner
//! only ever sees read-only snapshots of it. For the CLI driver the same
//! shape loads from a YAML file with the usual fallback chain.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Windowing capability a source supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum WindowMode {
    /// Window slides forward from the watermark.
    #[default]
    Sliding,
    /// Window ends align to calendar boundaries in the source timezone.
    Calendar,
    /// No incremental capability; only full scans.
    Full,
}

/// What kind of cursor the source paginates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OffsetType {
    #[default]
    Date,
    Id,
    Composite,
}

impl std::fmt::Display for OffsetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Date => write!(f, "DATE"),
            Self::Id => write!(f, "ID"),
            Self::Composite => write!(f, "COMPOSITE"),
        }
    }
}

/// Calendar boundary windows floor-align to in CALENDAR mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalendarAnchor {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

/// Duration as value plus unit code.
///
/// Unit strings arrive from the registry verbatim; unknown codes fall back
/// to MINUTES so a registry typo degrades instead of halting ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSpec {
    pub value: i64,
    pub unit: String,
}

impl SizeSpec {
    pub fn new(value: i64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        match self.unit.to_uppercase().as_str() {
            "SECONDS" => chrono::Duration::seconds(self.value),
            "MINUTES" => chrono::Duration::minutes(self.value),
            "HOURS" => chrono::Duration::hours(self.value),
            "DAYS" => chrono::Duration::days(self.value),
            other => {
                warn!(unit = %other, value = self.value, "unknown window unit, defaulting to MINUTES");
                chrono::Duration::minutes(self.value)
            }
        }
    }
}

impl Default for SizeSpec {
    fn default() -> Self {
        Self::new(1, "DAYS")
    }
}

/// Per-provenance window/offset policy (read-only to the planner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct WindowOffsetConfig {
    pub mode: WindowMode,

    /// Width of a derived window when no watermark or user bound fixes it.
    pub window_size: SizeSpec,

    /// Re-read margin below the watermark for late-arriving records.
    pub lookback_secs: i64,

    /// Overlap between consecutive windows; registry parity, window math
    /// uses lookback.
    pub overlap_secs: i64,

    /// Safety margin subtracted from now before it becomes a window bound.
    pub watermark_lag_secs: i64,

    pub offset_type: OffsetType,

    /// Cursor field on the source, used for slicing when offset-type is DATE.
    pub offset_field: Option<String>,

    /// Date field to slice on when the cursor field does not apply.
    pub default_date_field: Option<String>,

    pub calendar_anchor: CalendarAnchor,

    /// Source-local UTC offset in seconds, used for calendar alignment.
    pub utc_offset_secs: i32,

    /// Hard ceiling on a resolved window's span.
    pub max_window_span_secs: Option<i64>,
}

impl WindowOffsetConfig {
    pub fn window_size_duration(&self) -> chrono::Duration {
        self.window_size.duration()
    }

    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lookback_secs)
    }

    pub fn watermark_lag(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.watermark_lag_secs)
    }

    pub fn max_window_span(&self) -> Option<chrono::Duration> {
        self.max_window_span_secs.map(chrono::Duration::seconds)
    }
}

/// Identity and policy snapshot for one provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProvenanceConfigSnapshot {
    pub provenance_code: String,
    pub display_name: Option<String>,
    pub base_url: Option<String>,
    pub window: WindowOffsetConfig,
}

/// Registry file consumed by the CLI driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistryConfig {
    pub provenances: Vec<ProvenanceConfigSnapshot>,
}

impl RegistryConfig {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: harvestd.yml
        let local_config = PathBuf::from("harvestd.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/harvestd/harvestd.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("harvestd").join("harvestd.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn provenance(&self, code: &str) -> Option<&ProvenanceConfigSnapshot> {
        self.provenances.iter().find(|p| p.provenance_code == code)
    }
}
