//! Link `Λ`: relate two entities, creating missing endpoints.

use super::{GestureCall, Outcome, create_implicit, guard_call, missing};
use crate::axiom::AxiomGuard;
use crate::context::Context;
use crate::model::{GestureKind, RelationType, Tension};
use crate::Result;

/// Concept pairs whose joint appearance in a link marks a blind spot.
pub const SENSITIVE_PAIRS: &[(&str, &str, &str)] = &[
    ("human", "artificial", "human_ai_boundary"),
    ("consciousness", "machine", "machine_consciousness"),
    ("quality", "quantity", "quality_quantity"),
    ("chaos", "order", "chaos_order"),
];

pub fn link(ctx: &mut Context, guard: &AxiomGuard, call: &GestureCall) -> Result<Outcome> {
    if call.operands.len() < 2 {
        return Err(call.invalid("link needs a source and a target"));
    }
    let (source, target) = match (call.name(0), call.name(1)) {
        (Some(s), Some(t)) if !s.is_empty() && !t.is_empty() => (s, t),
        _ => return Err(call.invalid("link endpoints must not be empty")),
    };

    let absent = missing(ctx, [source, target]);
    guard_call(guard, ctx, call, absent.len())?;

    for name in &absent {
        create_implicit(ctx, name, GestureKind::Link);
    }

    let reverse_exists = ctx.has_relation(target, source);
    let id = ctx.add_relation(source, target, RelationType::Link, call.attributes.clone())?;
    if let Some(rel) = ctx.relation(id) {
        tracing::debug!(rel = %id, source = %rel.source, target = %rel.target, "link created");
    }

    let text = format!("{source} {target} {}", call.intent.join(" "));
    let mut implicated = ctx.blind_spots_mentioned(&text);
    for key in sensitive_keys(&text) {
        if ctx.register_blind_spot(key, format!("a link touched the unknowable: {key}")) {
            tracing::info!(key, "blind spot registered by link");
        }
        if !implicated.iter().any(|k| k == key) {
            implicated.push(key.to_string());
        }
    }

    let mut out = Outcome::relation(id)
        .touching([source, target])
        .with_blind_spots(implicated);

    if reverse_exists {
        ctx.add_tension(Tension::bidirectional(source, target));
        out.draft.tensions_created = 1;
        tracing::info!(source, target, "bidirectional tension");
    }
    Ok(out)
}

/// Keys of every sensitive pair whose two words both occur in `text`.
pub fn sensitive_keys(text: &str) -> Vec<&'static str> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    let has = |w: &str| words.iter().any(|x| x == w);
    SENSITIVE_PAIRS
        .iter()
        .filter(|(a, b, _)| has(a) && has(b))
        .map(|(_, _, key)| *key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::testing::*;
    use crate::model::{EntityKind, TensionKind};
    use crate::Error;

    fn call(a: &str, b: &str) -> GestureCall {
        GestureCall::new(GestureKind::Link).operand(a).operand(b)
    }

    #[test]
    fn test_auto_creates_exactly_missing_endpoints() {
        let mut c = ctx();
        super::super::collapse::collapse(
            &mut c,
            &guard(),
            &GestureCall::new(GestureKind::Collapse).operand("a"),
        )
        .unwrap();

        let out = link(&mut c, &guard(), &call("a", "b")).unwrap();
        assert_eq!(c.entity_count(), 2);
        assert_eq!(c.entity("a").unwrap().kind, EntityKind::Plain);
        assert_eq!(c.entity("b").unwrap().kind, EntityKind::Implicit);
        assert_eq!(c.relation_count(), 1);
        assert_eq!(out.draft.tensions_created, 0);
        assert!(out.result.relation().is_some());
    }

    #[test]
    fn test_reverse_link_creates_tension() {
        let mut c = ctx();
        link(&mut c, &guard(), &call("a", "b")).unwrap();
        let out = link(&mut c, &guard(), &call("b", "a")).unwrap();

        assert_eq!(out.draft.tensions_created, 1);
        assert_eq!(c.tensions().len(), 1);
        assert_eq!(c.tensions()[0].kind, TensionKind::Bidirectional);
        assert_eq!(c.relation_count(), 2);
    }

    #[test]
    fn test_arity_and_empty_names() {
        let mut c = ctx();
        let one = GestureCall::new(GestureKind::Link).operand("a");
        assert!(matches!(link(&mut c, &guard(), &one), Err(Error::InvalidOperand { .. })));
        assert!(matches!(link(&mut c, &guard(), &call("a", " ")), Err(Error::InvalidOperand { .. })));
        assert_eq!(c.entity_count(), 0);
    }

    #[test]
    fn test_sensitive_pair_registers_blind_spot() {
        let mut c = ctx();
        let out = link(&mut c, &guard(), &call("human", "artificial_mind")).unwrap();
        assert!(c.blind_spots().contains_key("human_ai_boundary"));
        assert!(out.draft.blind_spots.contains(&"human_ai_boundary".to_string()));

        let before = c.blind_spots().len();
        link(&mut c, &guard(), &call("human", "artificial_mind")).unwrap();
        assert_eq!(c.blind_spots().len(), before);
    }

    #[test]
    fn test_sensitive_keys_need_both_words() {
        assert_eq!(sensitive_keys("chaos and order"), vec!["chaos_order"]);
        assert!(sensitive_keys("chaos alone").is_empty());
        assert!(sensitive_keys("disorderly chaos").is_empty());
    }

    #[test]
    fn test_entity_ceiling_blocks_whole_link() {
        let mut c = ctx();
        let tight = AxiomGuard::new(8, 1, &[]);
        assert!(matches!(link(&mut c, &tight, &call("a", "b")), Err(Error::LimitExceeded { .. })));
        assert_eq!(c.entity_count(), 0);
    }
}
