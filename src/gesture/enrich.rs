//! Enrich `∇`: fold an invariant back into a target.

use super::{GestureCall, Outcome, create_implicit, guard_call};
use crate::axiom::AxiomGuard;
use crate::context::Context;
use crate::model::{GestureKind, PropertyMap, RelationType, Value};
use crate::Result;

pub fn enrich(ctx: &mut Context, guard: &AxiomGuard, call: &GestureCall) -> Result<Outcome> {
    let target = match call.name(0) {
        None => return Err(call.invalid("enrich needs a target")),
        Some("") => return Err(call.invalid("enrich target must not be empty")),
        Some(t) => t,
    };
    // Only an invariant (or boundary-recognising) entity qualifies as a source.
    let source = call
        .name(1)
        .filter(|s| *s != target)
        .filter(|s| ctx.entity(s).is_some_and(|e| e.is_invariant_source()));

    guard_call(guard, ctx, call, usize::from(!ctx.contains(target)))?;

    if !ctx.contains(target) {
        create_implicit(ctx, target, GestureKind::Enrich);
    }

    let mut out = Outcome::entity(target).touching([target]);

    if let Some(inv) = source {
        let mut props = PropertyMap::new();
        props.insert("meaning".into(), Value::from("invariant integrated into the ground"));
        ctx.add_relation(inv, target, RelationType::Integration, props)?;
        let resolved = ctx.resolve_tensions(target, inv);
        if resolved > 0 {
            tracing::info!(invariant = inv, target, resolved, "tensions resolved by integration");
        }
        out.draft.tensions_resolved = resolved;
        out = out.touching([inv]);
    } else if let Some(candidate) = call.name(1) {
        tracing::debug!(candidate, "enrich source is not an invariant, enriching directly");
    }

    if let Some(entity) = ctx.entity_mut(target) {
        if let Some(inv) = source {
            entity.enriched_by = Some(inv.to_string());
        }
        entity.intent.extend(call.intent.iter().cloned());
        entity.extra.insert("nabla_integration".into(), Value::Bool(source.is_some()));
        entity.apply_overrides(&call.attributes);
        entity.touch();
    }

    if ctx.coherence_improved() {
        tracing::info!(target, coherence = ctx.coherence(), "coherence improved by enrichment");
    }

    let text = format!("{} {}", call.operands.join(" "), call.intent.join(" "));
    out.draft.blind_spots = ctx.blind_spots_mentioned(&text);
    Ok(out)
}
