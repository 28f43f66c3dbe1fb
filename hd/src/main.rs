//! hd - harvest planning CLI entry point
//!
//! One-shot driver around the planning core: read a normalized trigger,
//! resolve it against the registry config and print the resulting assembly.
//! Watermark and backlog are supplied on the command line because no cursor
//! store is wired up here.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;
use eyre::{Context, Result, eyre};
use planstore::MemoryStore;
use serde::Serialize;

use harvestd::cli::{Cli, Command, OutputFormat};
use harvestd::config::RegistryConfig;
use harvestd::domain::{Expr, TriggerNorm};
use harvestd::planner::{PlannerService, persist_assembly};
use harvestd::ports::{FixedBacklog, FixedCursor};

fn setup_logging(cli_log_level: Option<&str>) -> Result<()> {
    let level = match cli_log_level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref())?;

    let config = RegistryConfig::load(cli.config.as_ref())?;

    match cli.command {
        Command::Plan {
            trigger,
            expr,
            now,
            watermark,
            queued,
            format,
        } => run_plan(&config, &trigger, expr.as_ref(), now, watermark, queued, format),
        Command::Provenances => run_provenances(&config),
    }
}

fn run_plan(
    config: &RegistryConfig,
    trigger_path: &PathBuf,
    expr_path: Option<&PathBuf>,
    now: Option<String>,
    watermark: Option<String>,
    queued: usize,
    format: OutputFormat,
) -> Result<()> {
    let trigger_raw = fs::read_to_string(trigger_path)
        .context(format!("Failed to read trigger from {}", trigger_path.display()))?;
    let trigger: TriggerNorm =
        serde_json::from_str(&trigger_raw).context("Failed to parse trigger JSON")?;

    let snapshot = config
        .provenance(&trigger.provenance_code)
        .ok_or_else(|| eyre!("provenance '{}' not in registry config", trigger.provenance_code))?;

    let base_expr = match expr_path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .context(format!("Failed to read expression from {}", path.display()))?;
            serde_json::from_str(&raw).context("Failed to parse expression JSON")?
        }
        None => Expr::everything(),
    };

    let now = match now {
        Some(raw) => parse_ts(&raw).context("Failed to parse --now")?,
        None => trigger.triggered_at,
    };
    let watermark = watermark
        .as_deref()
        .map(parse_ts)
        .transpose()
        .context("Failed to parse --watermark")?;

    let cursor = FixedCursor(watermark);
    let backlog = FixedBacklog(queued);
    let service = PlannerService::new(&cursor, &backlog);

    let assembly = service.plan(&trigger, snapshot, &base_expr, now)?;
    let mut store = MemoryStore::new();
    let bound = persist_assembly(&mut store, assembly)?;

    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Output<'a> {
                status: String,
                plan: &'a harvestd::domain::Plan,
                slices: &'a [harvestd::domain::Slice],
                tasks: &'a [harvestd::domain::Task],
            }
            let out = Output {
                status: bound.status().to_string(),
                plan: &bound.plan,
                slices: &bound.slices,
                tasks: &bound.tasks,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            let window = harvestd::domain::PlannerWindow {
                from: bound.plan.window_from,
                to: bound.plan.window_to,
            };
            println!("plan    {} [{}]", bound.plan.plan_key, bound.status());
            println!("window  {}", window);
            println!("strategy {}  slices {}  tasks {}", bound.plan.slice_strategy, bound.slices.len(), bound.tasks.len());
            for slice in &bound.slices {
                println!("  #{:<3} {}  {}", slice.sequence, &slice.signature_hash[..12], slice.spec_json);
            }
        }
    }
    Ok(())
}

fn run_provenances(config: &RegistryConfig) -> Result<()> {
    if config.provenances.is_empty() {
        println!("No provenances configured");
        return Ok(());
    }
    for p in &config.provenances {
        let name = p.display_name.as_deref().unwrap_or("-");
        println!("{:<12} {:<24} mode={:?}", p.provenance_code, name, p.window.mode);
    }
    Ok(())
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| eyre!("invalid RFC 3339 timestamp '{}': {}", raw, e))?
        .with_timezone(&Utc))
}
