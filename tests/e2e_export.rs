//! End-to-end integration tests for cycle validation and JSON export.

use logos_k::export::write_json;
use logos_k::{Engine, ErrorKind, Error, FairCareMetadata, RuntimeConfig};
use pretty_assertions::assert_eq;

const PROGRAM: &str = r#"
    (Α dawn (intent first light))
    (Λ dawn dusk :kind "passage")
    (Σ dawn dusk :name "day")
    (Ω day (intent what holds))
"#;

fn check_of(err: Error) -> String {
    match err {
        Error::ValidationFailure { check, .. } => check,
        other => panic!("expected ValidationFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_export_after_run() {
    let engine = Engine::silent(RuntimeConfig { operator_id: "ada".into(), ..Default::default() }).unwrap();
    let report = engine.run(PROGRAM).await.unwrap();
    assert_eq!(report.failures().count(), 0);
    assert_eq!(report.cycle.operations_evaluated, 4);
    assert_eq!(report.cycle.events_recorded, 4);
    assert_eq!(report.cycle.final_coherence, report.summary.coherence);

    let record = engine.export(&report.cycle).await.unwrap();
    let names: Vec<&str> = record.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["dawn", "day", "dusk", "omega_day"]);
    assert_eq!(record.weights.len(), record.entities.len());
    assert_eq!(record.events.len(), 4);
    assert_eq!(record.coherence_history.len(), 4);

    let mut buf = Vec::new();
    write_json(&record, &mut buf).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(json["cycle"]["operator_id"], "ada");
    assert_eq!(json["cycle"]["cycle_id"], report.cycle.cycle_id.to_string());
    assert_eq!(json["entities"].as_array().unwrap().len(), 4);
    assert!(json["blind_spots"]["consciousness"].is_string());
}

#[tokio::test]
async fn test_report_serializes() {
    let engine = Engine::silent(RuntimeConfig::default()).unwrap();
    let report = engine.run("(Α dawn) (merge dawn dusk)").await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][0]["status"], "completed");
    assert_eq!(json["results"][1]["status"], "failed");
    assert_eq!(json["results"][1]["failure"]["kind"], "unknown_operator");
}

#[tokio::test]
async fn test_open_tensions_block_export() {
    let config = RuntimeConfig { max_tensions: 0, ..Default::default() };
    let engine = Engine::silent(config).unwrap();
    let report = engine.run("(Λ a b) (Λ b a)").await.unwrap();
    assert_eq!(report.stats.tensions_created, 1);

    let err = engine.export(&report.cycle).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(check_of(err), "tensions");

    // validation does not touch the run
    assert_eq!(engine.snapshot().await.tensions().len(), 1);
}

#[tokio::test]
async fn test_tampered_cycle_rejected() {
    let engine = Engine::silent(RuntimeConfig::default()).unwrap();
    let report = engine.run("(Α dawn)").await.unwrap();

    let mut cycle = report.cycle.clone();
    cycle.final_coherence = -0.1;
    assert_eq!(check_of(engine.export(&cycle).await.unwrap_err()), "final_coherence");

    cycle.final_coherence = 0.5;
    cycle.cycle_id = uuid::Uuid::nil();
    assert_eq!(check_of(engine.export(&cycle).await.unwrap_err()), "cycle_id");
}

#[tokio::test]
async fn test_fair_care_metadata_exported() {
    let meta = FairCareMetadata {
        license: "CC-BY-4.0".into(),
        creator: "ada".into(),
        community_standards: vec!["open inquiry".into()],
        ethics_statement: "held provisionally".into(),
    };
    let engine = Engine::silent(RuntimeConfig { fair_care: Some(meta.clone()), ..Default::default() }).unwrap();
    let report = engine.run("(Α dawn)").await.unwrap();
    let record = engine.export(&report.cycle).await.unwrap();
    assert_eq!(record.fair_care, Some(meta.clone()));

    let bad = FairCareMetadata { creator: " ".into(), ..meta };
    let engine = Engine::silent(RuntimeConfig { fair_care: Some(bad), ..Default::default() }).unwrap();
    let report = engine.run("(Α dawn)").await.unwrap();
    assert_eq!(check_of(engine.export(&report.cycle).await.unwrap_err()), "fair_care");
}
