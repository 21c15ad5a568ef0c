//! Dialogue `Φ`: consult the oracle and gate its answer on generativity.
//!
//! ```text
//! offering ──► invoke ──┬─ none / error / timeout ──► silence  (unknown entity)
//!                       └─ text ──► score ──┬─ ≥ threshold ──► insight entity
//!                                           └─ < threshold ──► phi_response attr
//! ```
//!
//! The oracle call is the only await point in a run. Nothing is written
//! to the context until the oracle has answered (or failed to).

use std::time::Duration;

use chrono::Utc;

use super::{GestureCall, Outcome, create_implicit, guard_call, truncate_chars};
use crate::axiom::AxiomGuard;
use crate::config::RuntimeConfig;
use crate::context::Context;
use crate::model::*;
use crate::nigc::GenerativityScorer;
use crate::oracle::Oracle;
use crate::Result;

pub const DEFAULT_INTENT: &str = "ontological inquiry";
pub const SILENCE_BLIND_SPOT: &str = "phi_silence";
pub const SILENCE_ENTITY: &str = "phi_uncertainty";
pub const FALLBACK_TARGET: &str = "philosophical_question";

const ACKNOWLEDGED_KEYS: usize = 2;
const NAME_SOURCE_CHARS: usize = 20;
const CORE_FALLBACK_CHARS: usize = 50;
const SOURCE_RESPONSE_CHARS: usize = 500;
const ATTACHED_RESPONSE_CHARS: usize = 200;

/// Dialogue knobs taken from [`RuntimeConfig`].
#[derive(Debug, Clone)]
pub struct DialogueSettings {
    pub threshold: f64,
    pub timeout: Duration,
    pub scorer: GenerativityScorer,
}

impl DialogueSettings {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            threshold: config.generativity_threshold,
            timeout: config.dialogue_timeout(),
            scorer: GenerativityScorer::default(),
        }
    }
}

pub async fn dialogue<O: Oracle + ?Sized>(
    ctx: &mut Context,
    guard: &AxiomGuard,
    call: &GestureCall,
    oracle: &O,
    settings: &DialogueSettings,
) -> Result<Outcome> {
    guard_call(guard, ctx, call, 0)?;

    let offering = prepare_offering(ctx, call);
    let response = invoke(oracle, &offering, settings.timeout).await;

    let Some(text) = response else {
        guard.check(call.depth, ctx.entity_count() + usize::from(!ctx.contains(SILENCE_ENTITY)))?;
        let implicated = implicated_by(ctx, call, SILENCE_ENTITY);
        return Ok(silence(ctx, call, offering).with_blind_spots(implicated).with_silence_key());
    };

    let score = settings.scorer.score(&text, &offering.intent, ctx.entity_names());
    tracing::info!(
        overall = score.overall,
        unpredictability = score.unpredictability,
        reflexivity = score.reflexivity,
        emergence = score.emergence,
        "dialogue response scored"
    );

    let (name, outcome) = if score.overall >= settings.threshold {
        let (name, core) = insight_name(&text);
        guard.check(call.depth, ctx.entity_count() + usize::from(!ctx.contains(&name)))?;

        let entity = Entity::new(name.as_str(), EntityKind::GenerativeInsight, GestureKind::Dialogue)
            .with_intent(&call.intent)
            .with_meaning(core)
            .with_attr("nigc_confirmed", true)
            .with_attr("generativity", score.overall)
            .with_attr("source_response", truncate_chars(&text, SOURCE_RESPONSE_CHARS));
        ctx.put_entity(entity, call.justification());
        (name, DialogueOutcome::Integrated)
    } else {
        let target = call.name(0).filter(|t| !t.is_empty()).unwrap_or(FALLBACK_TARGET).to_string();
        guard.check(call.depth, ctx.entity_count() + usize::from(!ctx.contains(&target)))?;

        if !ctx.contains(&target) {
            create_implicit(ctx, &target, GestureKind::Dialogue);
        }
        if let Some(entity) = ctx.entity_mut(&target) {
            entity
                .extra
                .insert("phi_response".into(), Value::from(truncate_chars(&text, ATTACHED_RESPONSE_CHARS)));
            entity.touch();
        }
        (target, DialogueOutcome::Attached)
    };

    ctx.record_dialogue(DialogueRecord {
        offering,
        response: Some(text),
        score: Some(score),
        outcome,
        result: name.clone(),
        recorded_at: Utc::now(),
    });

    let implicated = implicated_by(ctx, call, &name);
    let mut out = Outcome::entity(name.as_str())
        .touching([name.as_str()])
        .with_blind_spots(implicated);
    if outcome == DialogueOutcome::Attached {
        out.draft.tensions_created = 1;
    }
    Ok(out)
}

/// Build the offering. An intent that names no registered blind spot gets
/// an explicit acknowledgment of the first two.
pub fn prepare_offering(ctx: &Context, call: &GestureCall) -> Offering {
    let mut intent = call.intent_text().unwrap_or_else(|| DEFAULT_INTENT.to_string());
    let keys: Vec<String> = ctx.blind_spots().keys().cloned().collect();
    if ctx.blind_spots_mentioned(&intent).is_empty() && !keys.is_empty() {
        let ack: Vec<&str> = keys.iter().take(ACKNOWLEDGED_KEYS).map(String::as_str).collect();
        intent.push_str(&format!(" (acknowledging blind spots: {})", ack.join(", ")));
    }
    let summary = ctx.summary();
    Offering {
        intent,
        operands: call.operands.clone(),
        coherence: summary.coherence,
        active_tensions: summary.tension_count,
        blind_spots: keys,
        operator_id: ctx.operator_id().to_string(),
        attributes: call.attributes.clone(),
    }
}

/// Blind spots named by the caller's own intent or the result name. The
/// acknowledgment appended to the offering does not count.
fn implicated_by(ctx: &Context, call: &GestureCall, result: &str) -> NameSet {
    let intent = call.intent_text().unwrap_or_default();
    ctx.blind_spots_mentioned(&format!("{intent} {result}"))
}

/// Call the oracle with a bounded wait. Every failure mode is `None`.
async fn invoke<O: Oracle + ?Sized>(oracle: &O, offering: &Offering, timeout: Duration) -> Option<String> {
    match tokio::time::timeout(timeout, oracle.invoke(offering)).await {
        Ok(Ok(Some(text))) if !text.trim().is_empty() => Some(text),
        Ok(Ok(_)) => {
            tracing::info!(oracle = oracle.name(), "oracle stayed silent");
            None
        }
        Ok(Err(e)) => {
            tracing::warn!(oracle = oracle.name(), error = %e, "oracle call failed, treating as silence");
            None
        }
        Err(_) => {
            tracing::warn!(oracle = oracle.name(), timeout_ms = timeout.as_millis() as u64, "oracle timed out");
            None
        }
    }
}

fn silence(ctx: &mut Context, call: &GestureCall, offering: Offering) -> Outcome {
    if ctx.register_blind_spot(SILENCE_BLIND_SPOT, "the silence of the other as a form of answer") {
        tracing::info!(key = SILENCE_BLIND_SPOT, "blind spot registered by silence");
    }
    let mut entity = Entity::new(SILENCE_ENTITY, EntityKind::Unknown, GestureKind::Dialogue)
        .with_intent(&["the other did not answer".to_string()]);
    entity.boundary_recognition = true;
    ctx.put_entity(entity, call.justification());

    ctx.record_dialogue(DialogueRecord {
        offering,
        response: None,
        score: None,
        outcome: DialogueOutcome::Silence,
        result: SILENCE_ENTITY.to_string(),
        recorded_at: Utc::now(),
    });
    Outcome::entity(SILENCE_ENTITY).touching([SILENCE_ENTITY])
}

impl Outcome {
    fn with_silence_key(mut self) -> Self {
        if !self.draft.blind_spots.iter().any(|k| k == SILENCE_BLIND_SPOT) {
            self.draft.blind_spots.push(SILENCE_BLIND_SPOT.to_string());
        }
        self
    }
}

/// Entity name and core idea for an integrated response: `phi_` plus the
/// sanitised first 20 characters of the first sentence.
pub fn insight_name(response: &str) -> (String, String) {
    let core = response
        .split('.')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| truncate_chars(response.trim(), CORE_FALLBACK_CHARS));

    let slug: String = core
        .chars()
        .take(NAME_SOURCE_CHARS)
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let slug = slug.trim().split_whitespace().collect::<Vec<_>>().join("_");
    let name = if slug.is_empty() { "phi_insight".to_string() } else { format!("phi_{slug}") };
    (name, core)
}
