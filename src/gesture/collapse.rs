//! Collapse `Α`: bring a named entity into the graph.

use super::{GestureCall, Outcome, guard_call, truncate_chars};
use crate::axiom::AxiomGuard;
use crate::context::Context;
use crate::model::{Entity, EntityKind, GestureKind};
use crate::Result;

/// Derived meanings are cut to this many characters.
pub const MEANING_MAX_CHARS: usize = 200;

pub fn collapse(ctx: &mut Context, guard: &AxiomGuard, call: &GestureCall) -> Result<Outcome> {
    let name = match call.name(0) {
        None => return Err(call.invalid("collapse needs a name")),
        Some("") => return Err(call.invalid("entity name must not be empty")),
        Some(name) => name,
    };
    guard_call(guard, ctx, call, usize::from(!ctx.contains(name)))?;

    if ctx.blind_spots().contains_key(name) {
        tracing::info!(entity = name, "collapsing a registered blind spot");
    }

    let mut entity = Entity::new(name, EntityKind::Plain, GestureKind::Collapse).with_intent(&call.intent);
    if let Some(text) = call.intent_text() {
        entity.meaning = Some(truncate_chars(&text, MEANING_MAX_CHARS));
    }
    entity.apply_overrides(&call.attributes);
    ctx.put_entity(entity, call.justification());

    let mentioned = ctx.blind_spots_mentioned(&format!("{name} {}", call.intent.join(" ")));
    Ok(Outcome::entity(name).touching([name]).with_blind_spots(mentioned))
}
