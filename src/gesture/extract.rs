//! Extract `Ω`: snapshot the run's state into an invariant entity.
//!
//! The checkpoint gesture. It never fails on a missing target: the target
//! only names the invariant and, when it takes part in open tensions,
//! marks those tensions for review so a later Enrich can clear them.

use super::{GestureCall, Outcome, guard_call, truncate_chars};
use crate::axiom::AxiomGuard;
use crate::context::Context;
use crate::context::metrics::DIALOGUE_ADVISORY_THRESHOLD;
use crate::model::{Analysis, Entity, EntityKind, GestureKind, LimitType};
use crate::Result;

const TARGET_PREFIX_CHARS: usize = 10;
const LIMIT_SUFFIX_CHARS: usize = 4;

pub fn extract(ctx: &mut Context, guard: &AxiomGuard, call: &GestureCall) -> Result<Outcome> {
    let target = call.name(0).filter(|t| !t.is_empty());
    let summary = ctx.summary();
    let analysis = Analysis {
        coherence: summary.coherence,
        active_tensions: summary.tension_count,
        dialogues: summary.dialogue_count,
        entities: summary.node_count,
        isolated_entities: summary.isolated_node_count,
        blind_spots: summary.blind_spot_count,
        limit_type: summary.limit_type,
        target: target.map(str::to_string),
        taken_at: chrono::Utc::now(),
    };
    let name = invariant_name(target, analysis.limit_type);

    guard_call(guard, ctx, call, usize::from(!ctx.contains(&name)))?;

    let mut entity = Entity::new(name.as_str(), EntityKind::Invariant, GestureKind::Extract)
        .with_intent(&call.intent)
        .with_attr("coherence_at_return", analysis.coherence)
        .with_attr("tensions_at_return", analysis.active_tensions);
    if let Some(text) = call.intent_text() {
        entity.meaning = Some(text);
    }
    entity.apply_overrides(&call.attributes);
    // overrides may not lift the boundary
    entity.boundary_recognition = true;
    entity.analysis = Some(analysis.clone());
    ctx.put_entity(entity, call.justification());

    if let Some(t) = target {
        let marked = ctx.annotate_tensions(t, &format!("under review by {name}"));
        if marked > 0 {
            tracing::debug!(target = t, invariant = %name, marked, "tensions marked for review");
        }
    }

    tracing::info!(
        invariant = %name,
        limit = %analysis.limit_type,
        coherence = analysis.coherence,
        tensions = analysis.active_tensions,
        "invariant extracted"
    );

    let mut out = Outcome::entity(name.as_str()).touching([name.as_str()]);
    if let Some(t) = target.filter(|t| ctx.contains(t)) {
        out = out.touching([t]);
    }
    out.draft.crisis = true;
    if analysis.active_tensions > DIALOGUE_ADVISORY_THRESHOLD {
        tracing::warn!(tensions = analysis.active_tensions, "high tension: a dialogue is advised next");
        out.draft.advisory = Some(format!(
            "{} open tensions at {name}: prefer a dialogue gesture next",
            analysis.active_tensions
        ));
    }
    let text = format!("{name} {}", call.intent.join(" "));
    out.draft.blind_spots = ctx.blind_spots_mentioned(&text);
    Ok(out)
}

/// `omega_limit` or `omega_<target prefix>`, suffixed with the limit type
/// prefix when the run is not in a normal state.
pub fn invariant_name(target: Option<&str>, limit: LimitType) -> String {
    let mut name = match target {
        Some(t) => format!("omega_{}", truncate_chars(t, TARGET_PREFIX_CHARS)),
        None => "omega_limit".to_string(),
    };
    if limit != LimitType::Normal {
        name.push('_');
        name.push_str(&truncate_chars(limit.as_str(), LIMIT_SUFFIX_CHARS));
    }
    name
}
