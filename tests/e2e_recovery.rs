//! End-to-end integration tests for failure scoping, limits and recovery.

use logos_k::{
    Engine, EntityKind, ErrorKind, OperationResult, RecoveryAction, RecoveryPolicy, ResultRef,
    RuntimeConfig, Value,
};
use pretty_assertions::assert_eq;

fn recovery_of(result: &OperationResult) -> Option<&ResultRef> {
    match result {
        OperationResult::Failed { recovery, .. } => recovery.as_ref(),
        OperationResult::Completed { .. } => None,
    }
}

// ============================================================================
// 1. Prohibited phrasing
// ============================================================================

#[tokio::test]
async fn test_forbidden_term_recovers_with_extract() {
    let engine = Engine::silent(RuntimeConfig::default()).unwrap();
    let report = engine.run(r#"(Α "the only way")"#).await.unwrap();

    let failure = report.results[0].failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::ProhibitedPhrasing);
    assert_eq!(failure.message, "Prohibited phrasing: 'only'");
    assert_eq!(
        recovery_of(&report.results[0]),
        Some(&ResultRef::Entity("omega_error_coll".into()))
    );
    assert_eq!(report.stats.recoveries, 1);
    assert_eq!(report.events, 1);

    let ctx = engine.snapshot().await;
    assert!(!ctx.contains("the only way"));
    let checkpoint = ctx.entity("omega_error_coll").unwrap();
    assert_eq!(checkpoint.kind, EntityKind::Invariant);
    assert_eq!(checkpoint.get("trigger"), Some(&Value::from("Prohibited phrasing: 'only'")));
    assert_eq!(
        checkpoint.meaning.as_deref(),
        Some("recovery after prohibited_phrasing in collapse")
    );
}

#[tokio::test]
async fn test_forbidden_term_in_intent_is_caught() {
    let engine = Engine::silent(RuntimeConfig::default()).unwrap();
    let report = engine.run("(Λ a b (intent an ABSOLUTE bond))").await.unwrap();

    assert_eq!(report.results[0].failure().unwrap().kind, ErrorKind::ProhibitedPhrasing);
    let ctx = engine.snapshot().await;
    assert_eq!(ctx.relation_count(), 0);
    assert!(!ctx.contains("a"));
}

#[tokio::test]
async fn test_skip_all_policy_leaves_no_trace() {
    let config = RuntimeConfig { recovery: RecoveryPolicy::skip_all(), ..Default::default() };
    let engine = Engine::silent(config).unwrap();
    let report = engine.run(r#"(Α "the only way") (Α dawn)"#).await.unwrap();

    assert_eq!(recovery_of(&report.results[0]), None);
    assert!(report.results[1].is_completed());
    assert_eq!(report.stats.recoveries, 0);
    assert_eq!(engine.snapshot().await.entity_count(), 1);
}

// ============================================================================
// 2. Limits
// ============================================================================

#[tokio::test]
async fn test_entity_ceiling_holds_through_recovery() {
    let config = RuntimeConfig { max_entities: 2, ..Default::default() };
    let engine = Engine::silent(config).unwrap();
    let report = engine.run("(Α a) (Α b) (Α c)").await.unwrap();

    let failure = report.results[2].failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::LimitExceeded);
    assert_eq!(failure.message, "Limit exceeded: entity count 3 > 2");
    // the checkpoint would be a third entity too
    assert_eq!(recovery_of(&report.results[2]), None);
    assert_eq!(engine.snapshot().await.entity_count(), 2);
}

#[tokio::test]
async fn test_depth_checked_before_inner_forms_run() {
    let config = RuntimeConfig { max_depth: 1, ..Default::default() };
    let engine = Engine::silent(config).unwrap();
    let report = engine.run("(Α (Α (Α x)))").await.unwrap();

    let failure = report.results[0].failure().unwrap();
    assert_eq!(failure.message, "Limit exceeded: nesting depth 2 > 1");

    let ctx = engine.snapshot().await;
    assert!(!ctx.contains("x"));
    assert!(ctx.contains("omega_error_coll"));
}

// ============================================================================
// 3. Run control
// ============================================================================

#[tokio::test]
async fn test_stop_on_error_halts_the_run() {
    let config = RuntimeConfig { stop_on_error: true, ..Default::default() };
    let engine = Engine::silent(config).unwrap();
    let report = engine.run("(merge a b) (Α c)").await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.cycle.operations_evaluated, 1);
    assert_eq!(report.cycle.operations_failed, 1);
    assert!(!engine.snapshot().await.contains("c"));
}

#[tokio::test]
async fn test_failures_do_not_stop_later_operations() {
    let engine = Engine::silent(RuntimeConfig::default()).unwrap();
    let report = engine.run("(Σ) (∇) (Α a) (Σ a)").await.unwrap();

    let kinds: Vec<Option<ErrorKind>> =
        report.results.iter().map(|r| r.failure().map(|f| f.kind)).collect();
    assert_eq!(
        kinds,
        vec![Some(ErrorKind::InvalidOperand), Some(ErrorKind::InvalidOperand), None, Some(ErrorKind::InvalidOperand)]
    );
    assert_eq!(report.completed(), 1);
    assert_eq!(report.failures().count(), 3);
}

// ============================================================================
// 4. Configuration
// ============================================================================

#[tokio::test]
async fn test_toml_configuration() {
    let config = RuntimeConfig::from_toml_str(
        r#"
        operator_id = "night_shift"
        max_entities = 4

        [recovery]
        prohibited_phrasing = "skip"
        "#,
    )
    .unwrap();
    assert_eq!(config.recovery.prohibited_phrasing, RecoveryAction::Skip);
    assert_eq!(config.recovery.limit_exceeded, RecoveryAction::Extract);

    let engine = Engine::silent(config).unwrap();
    let report = engine.run(r#"(Α "absolute zero")"#).await.unwrap();
    assert_eq!(recovery_of(&report.results[0]), None);
    assert_eq!(report.cycle.operator_id, "night_shift");
}

#[test]
fn test_invalid_configuration_rejected() {
    let config = RuntimeConfig { generativity_threshold: 1.5, ..Default::default() };
    let err = Engine::silent(config).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Config);

    let err = RuntimeConfig::from_toml_str("max_depth = \"deep\"").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialization);
}
