//! End-to-end integration tests for the Dialogue gesture and its oracles.

use std::sync::Arc;
use std::time::Duration;

use logos_k::model::DialogueOutcome;
use logos_k::oracle::scripted::Reply;
use logos_k::{Engine, EntityKind, ReflectiveOracle, RuntimeConfig, ScriptedOracle, Value};
use pretty_assertions::assert_eq;

const GENERATIVE: &str =
    "Perhaps the interval itself speaks. Membrane threshold silence whispers across rivers.";

// ============================================================================
// 1. Silence
// ============================================================================

#[tokio::test]
async fn test_silence_is_idempotent() {
    let engine = Engine::silent(RuntimeConfig::default()).unwrap();
    let report = engine.run("(Φ) (Φ question)").await.unwrap();
    assert_eq!(report.completed(), 2);

    let ctx = engine.snapshot().await;
    let unknown = ctx.entity("phi_uncertainty").unwrap();
    assert_eq!(unknown.kind, EntityKind::Unknown);
    assert!(ctx.blind_spots().contains_key("phi_silence"));
    assert_eq!(ctx.blind_spots().len(), 4);
    assert_eq!(report.stats.blind_spots_registered, 1);
    assert_eq!(ctx.dialogues().len(), 2);
    assert!(ctx.dialogues().iter().all(|d| d.outcome == DialogueOutcome::Silence));
}

#[tokio::test]
async fn test_timeout_counts_as_silence() {
    let oracle = ScriptedOracle::new();
    oracle.push(Reply::Delayed(Duration::from_secs(2), GENERATIVE.into()));
    let config = RuntimeConfig { dialogue_timeout_ms: 50, ..Default::default() };
    let engine = Engine::new(config, oracle).unwrap();

    let report = engine.run("(dialogue)").await.unwrap();
    assert_eq!(report.results[0].result().unwrap().to_string(), "phi_uncertainty");
}

// ============================================================================
// 2. Generativity gate
// ============================================================================

#[tokio::test]
async fn test_generative_reply_integrated() {
    let oracle = Arc::new(ScriptedOracle::with_replies([GENERATIVE]));
    let engine = Engine::new(RuntimeConfig::default(), Arc::clone(&oracle)).unwrap();

    let report = engine.run("(phi river (intent what binds us))").await.unwrap();
    let name = report.results[0].result().unwrap().to_string();
    assert_eq!(name, "phi_Perhaps_the_interval");

    let ctx = engine.snapshot().await;
    let insight = ctx.entity(&name).unwrap();
    assert_eq!(insight.kind, EntityKind::GenerativeInsight);
    assert_eq!(insight.meaning.as_deref(), Some("Perhaps the interval itself speaks"));
    assert_eq!(ctx.events()[0].tensions_created, 0);

    let record = &ctx.dialogues()[0];
    assert_eq!(record.outcome, DialogueOutcome::Integrated);
    let score = record.score.unwrap();
    assert!(score.overall >= 0.7);
    assert!(score.is_bounded());

    let offering = &oracle.offerings()[0];
    assert!(offering.intent.starts_with("what binds us (acknowledging blind spots: "));
    assert_eq!(offering.operands, vec!["river"]);
}

#[tokio::test]
async fn test_instrumental_reply_attached() {
    let oracle = ScriptedOracle::with_replies(["what binds us is what binds us"]);
    let engine = Engine::new(RuntimeConfig::default(), oracle).unwrap();

    let report = engine.run("(phi river (intent what binds us))").await.unwrap();
    assert_eq!(report.results[0].result().unwrap().to_string(), "river");
    assert_eq!(report.stats.tensions_created, 1);

    let ctx = engine.snapshot().await;
    assert_eq!(
        ctx.entity("river").unwrap().get("phi_response"),
        Some(&Value::from("what binds us is what binds us"))
    );
    assert_eq!(ctx.dialogues()[0].outcome, DialogueOutcome::Attached);
}

#[tokio::test]
async fn test_threshold_is_configurable() {
    let oracle = ScriptedOracle::with_replies(["what binds us is what binds us"]);
    let config = RuntimeConfig { generativity_threshold: 0.0, ..Default::default() };
    let engine = Engine::new(config, oracle).unwrap();

    engine.run("(phi river (intent what binds us))").await.unwrap();
    let ctx = engine.snapshot().await;
    assert_eq!(ctx.dialogues()[0].outcome, DialogueOutcome::Integrated);
}

// ============================================================================
// 3. Reflective oracle
// ============================================================================

#[tokio::test]
async fn test_reflective_oracle_is_reproducible() {
    let run = || async {
        let engine = Engine::new(RuntimeConfig::default(), ReflectiveOracle).unwrap();
        engine.run("(Φ (intent the meaning of a boundary))").await.unwrap();
        let ctx = engine.snapshot().await;
        ctx.dialogues()[0].score.unwrap()
    };
    assert_eq!(run().await, run().await);
}
