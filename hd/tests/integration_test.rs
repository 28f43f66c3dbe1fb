//! Integration tests for the planning core
//!
//! These drive the full trigger -> service -> persistence flow the way a
//! scheduler adapter would.

use chrono::{DateTime, Utc};
use planstore::MemoryStore;

use harvestd::config::{OffsetType, ProvenanceConfigSnapshot, SizeSpec, WindowOffsetConfig};
use harvestd::domain::{Expr, OperationCode, PlanStatus, TriggerNorm};
use harvestd::planner::{PlannerService, persist_assembly};
use harvestd::ports::{FixedBacklog, FixedCursor};

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn pubmed_snapshot() -> ProvenanceConfigSnapshot {
    ProvenanceConfigSnapshot {
        provenance_code: "pubmed".to_string(),
        display_name: Some("PubMed".to_string()),
        base_url: Some("https://eutils.ncbi.nlm.nih.gov".to_string()),
        window: WindowOffsetConfig {
            window_size: SizeSpec::new(24, "HOURS"),
            offset_type: OffsetType::Date,
            offset_field: Some("EDAT".to_string()),
            default_date_field: Some("PDAT".to_string()),
            ..Default::default()
        },
    }
}

// =============================================================================
// Harvest flow
// =============================================================================

#[test]
fn test_harvest_flow_plans_slices_and_persists() {
    let mut trigger = TriggerNorm::new(
        "pubmed",
        "esearch",
        OperationCode::Harvest,
        ts("2024-01-01T03:10:00Z"),
    );
    trigger.step = Some("PT1H".to_string());
    trigger.requested_from = Some(ts("2024-01-01T00:00:00Z"));
    trigger.requested_to = Some(ts("2024-01-01T03:00:00Z"));

    let cursor = FixedCursor(None);
    let backlog = FixedBacklog(0);
    let service = PlannerService::new(&cursor, &backlog);

    let assembly = service
        .plan(&trigger, &pubmed_snapshot(), &Expr::everything(), trigger.triggered_at)
        .expect("planning should succeed");

    assert_eq!(assembly.status(), PlanStatus::Ready);
    assert_eq!(assembly.slices.len(), 3);
    assert_eq!(assembly.tasks.len(), 3);

    // Sub-windows tile [00:00, 03:00) hour by hour
    let windows: Vec<_> = assembly
        .slices
        .iter()
        .map(|s| s.spec_json.clone())
        .collect();
    assert!(windows[0].contains("2024-01-01T00:00:00Z"));
    assert!(windows[0].contains("2024-01-01T01:00:00Z"));
    assert!(windows[2].contains("2024-01-01T02:00:00Z"));
    assert!(windows[2].contains("2024-01-01T03:00:00Z"));

    // Persist and check the graph is fully bound
    let mut store = MemoryStore::new();
    let bound = persist_assembly(&mut store, assembly).expect("persist should bind ids");

    assert_eq!(bound.plan.id, Some(1));
    for (i, slice) in bound.slices.iter().enumerate() {
        assert_eq!(slice.sequence as usize, i + 1);
        assert_eq!(slice.plan_id, bound.plan.id);
    }
    for (task, slice) in bound.tasks.iter().zip(&bound.slices) {
        assert_eq!(task.slice_id, slice.id);
        assert_eq!(task.expr_hash, slice.expr_hash);
    }
}

// =============================================================================
// Replay determinism
// =============================================================================

#[test]
fn test_replaying_a_trigger_reproduces_identities() {
    let mut trigger = TriggerNorm::new(
        "pubmed",
        "esearch",
        OperationCode::Harvest,
        ts("2024-01-10T00:00:00Z"),
    );
    trigger.step = Some("PT6H".to_string());

    let cursor = FixedCursor(Some(ts("2024-01-09T12:00:00Z")));
    let backlog = FixedBacklog(3);
    let service = PlannerService::new(&cursor, &backlog);
    let base = Expr::in_list("lang", vec!["en".into(), "de".into()]);

    let first = service
        .plan(&trigger, &pubmed_snapshot(), &base, trigger.triggered_at)
        .unwrap();
    let second = service
        .plan(&trigger, &pubmed_snapshot(), &base, trigger.triggered_at)
        .unwrap();

    assert_eq!(first.plan.plan_key, second.plan.plan_key);
    assert_eq!(first.plan.expr_hash, second.plan.expr_hash);
    assert_eq!(first.plan.config_snapshot_hash, second.plan.config_snapshot_hash);

    let sigs = |a: &harvestd::planner::PlanAssembly| {
        a.slices
            .iter()
            .map(|s| s.signature_hash.clone())
            .collect::<Vec<_>>()
    };
    let keys = |a: &harvestd::planner::PlanAssembly| {
        a.tasks
            .iter()
            .map(|t| t.idempotency_key.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(sigs(&first), sigs(&second));
    assert_eq!(keys(&first), keys(&second));
}

// =============================================================================
// Update flow
// =============================================================================

#[test]
fn test_update_flow_single_slice() {
    let trigger = TriggerNorm::new(
        "crossref",
        "works",
        OperationCode::Update,
        ts("2024-01-10T00:00:00Z"),
    );

    let snapshot = ProvenanceConfigSnapshot {
        provenance_code: "crossref".to_string(),
        display_name: None,
        base_url: None,
        window: WindowOffsetConfig {
            window_size: SizeSpec::new(7, "DAYS"),
            offset_type: OffsetType::Id,
            ..Default::default()
        },
    };

    let cursor = FixedCursor(None);
    let backlog = FixedBacklog(0);
    let service = PlannerService::new(&cursor, &backlog);
    let base = Expr::term("type", "journal-article");

    let assembly = service
        .plan(&trigger, &snapshot, &base, trigger.triggered_at)
        .unwrap();

    assert_eq!(assembly.status(), PlanStatus::Ready);
    assert_eq!(assembly.plan.slice_strategy, "SINGLE");
    assert_eq!(assembly.slices.len(), 1);
    // Base expression flows through unmodified
    assert_eq!(assembly.slices[0].expr_hash, assembly.plan.expr_hash);
    // ID-driven recency window
    assert_eq!(assembly.plan.window_from, Some(ts("2024-01-03T00:00:00Z")));
    assert_eq!(assembly.plan.window_to, Some(ts("2024-01-10T00:00:00Z")));
}

// =============================================================================
// Failure shapes
// =============================================================================

#[test]
fn test_unresolvable_time_field_persists_failed_plan() {
    let trigger = TriggerNorm::new(
        "pubmed",
        "esearch",
        OperationCode::Harvest,
        ts("2024-01-10T00:00:00Z"),
    );

    let mut snapshot = pubmed_snapshot();
    snapshot.window.offset_type = OffsetType::Id;
    snapshot.window.offset_field = None;
    snapshot.window.default_date_field = None;

    let cursor = FixedCursor(None);
    let backlog = FixedBacklog(0);
    let service = PlannerService::new(&cursor, &backlog);

    let assembly = service
        .plan(&trigger, &snapshot, &Expr::everything(), trigger.triggered_at)
        .expect("no-field outcome is a failed plan, not an error");

    assert_eq!(assembly.status(), PlanStatus::Failed);
    assert!(assembly.slices.is_empty());
    assert!(assembly.tasks.is_empty());

    // A failed plan still persists for observability
    let mut store = MemoryStore::new();
    let bound = persist_assembly(&mut store, assembly).unwrap();
    assert_eq!(bound.plan.id, Some(1));
    assert_eq!(bound.plan.status, PlanStatus::Failed);
}

#[test]
fn test_backpressure_is_fatal_before_any_plan_exists() {
    let trigger = TriggerNorm::new(
        "pubmed",
        "esearch",
        OperationCode::Harvest,
        ts("2024-01-10T00:00:00Z"),
    );

    let cursor = FixedCursor(None);
    let backlog = FixedBacklog(500);
    let service = PlannerService::new(&cursor, &backlog);

    let result = service.plan(&trigger, &pubmed_snapshot(), &Expr::everything(), trigger.triggered_at);
    assert!(result.is_err());
}
