//! Synthesize `Σ`: a new whole from two or more parts.

use super::{GestureCall, Outcome, create_implicit, guard_call, missing};
use crate::axiom::AxiomGuard;
use crate::context::Context;
use crate::model::{Entity, EntityKind, GestureKind, PropertyMap, RelationType, Value};
use crate::{Error, Result};

/// Attribute that names the result explicitly.
pub const NAME_ATTR: &str = "name";

pub fn synthesize(ctx: &mut Context, guard: &AxiomGuard, call: &GestureCall) -> Result<Outcome> {
    if call.operands.len() < 2 {
        return Err(call.invalid("synthesize needs at least two operands"));
    }
    let parts: Vec<&str> = call.operands.iter().map(|s| s.trim()).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(call.invalid("synthesis operands must not be empty"));
    }

    let name = match call.attributes.get(NAME_ATTR) {
        Some(v) => v.to_text().trim().to_string(),
        None => derived_name(&parts),
    };
    if name.is_empty() {
        return Err(call.invalid("synthesis name must not be empty"));
    }
    if parts.contains(&name.as_str()) {
        return Err(Error::SelfReference { name });
    }

    let absent = missing(ctx, parts.iter().copied());
    let planned = absent.len() + usize::from(!ctx.contains(&name));
    guard_call(guard, ctx, call, planned)?;
    guard.scan_forbidden(&name)?;

    for part in &absent {
        create_implicit(ctx, part, GestureKind::Synthesize);
    }

    let meaning = match call.intent_text() {
        Some(text) => format!("Synthesis: {text}"),
        None => format!("New whole from {} components", parts.len()),
    };
    let overrides: PropertyMap = call
        .attributes
        .iter()
        .filter(|(k, _)| k.as_str() != NAME_ATTR)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut entity = Entity::new(name.as_str(), EntityKind::Synthesis, GestureKind::Synthesize)
        .with_intent(&call.intent)
        .with_meaning(meaning)
        .with_attr("nigc_potential", !call.intent.is_empty());
    entity.components = parts.iter().map(|p| p.to_string()).collect();
    entity.apply_overrides(&overrides);
    ctx.put_entity(entity, call.justification());

    for part in &parts {
        let mut props = PropertyMap::new();
        props.insert("role".into(), Value::from("part of synthesis"));
        ctx.add_relation(part, &name, RelationType::Component, props)?;
    }
    tracing::debug!(synthesis = %name, parts = parts.len(), "synthesis created");

    let text = format!("{name} {} {}", parts.join(" "), call.intent.join(" "));
    let mentioned = ctx.blind_spots_mentioned(&text);
    Ok(Outcome::entity(name.as_str())
        .touching(parts.iter().copied())
        .touching([name.as_str()])
        .with_blind_spots(mentioned))
}

/// `Σ_` followed by the first three characters of up to three operands.
pub fn derived_name(parts: &[&str]) -> String {
    let short: Vec<String> = parts.iter().take(3).map(|p| p.chars().take(3).collect()).collect();
    format!("Σ_{}", short.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::testing::*;

    fn call(parts: &[&str]) -> GestureCall {
        parts
            .iter()
            .fold(GestureCall::new(GestureKind::Synthesize), |c, p| c.operand(*p))
    }

    #[test]
    fn test_auto_creates_parts_on_empty_graph() {
        let mut c = ctx();
        let out = synthesize(&mut c, &guard(), &call(&["a", "b"])).unwrap();

        assert_eq!(out.result.entity(), Some("Σ_a_b"));
        assert_eq!(c.entity("a").unwrap().kind, EntityKind::Implicit);
        assert_eq!(c.entity("b").unwrap().kind, EntityKind::Implicit);
        let s = c.entity("Σ_a_b").unwrap();
        assert_eq!(s.kind, EntityKind::Synthesis);
        assert_eq!(s.components, vec!["a", "b"]);
        assert_eq!(s.meaning.as_deref(), Some("New whole from 2 components"));
        assert_eq!(c.relation_count(), 2);
        assert!(c.relations().all(|r| r.rel_type == RelationType::Component && r.target == "Σ_a_b"));
    }

    #[test]
    fn test_intent_drives_meaning() {
        let mut c = ctx();
        let out = synthesize(&mut c, &guard(), &call(&["wave", "particle"]).intent(["duality"])).unwrap();
        let name = out.result.entity().unwrap().to_string();
        assert_eq!(name, "Σ_wav_par");
        assert_eq!(c.entity(&name).unwrap().meaning.as_deref(), Some("Synthesis: duality"));
    }

    #[test]
    fn test_explicit_name_self_reference() {
        let mut c = ctx();
        let bad = call(&["x", "y"]).attr(NAME_ATTR, "x");
        assert!(matches!(
            synthesize(&mut c, &guard(), &bad),
            Err(Error::SelfReference { name }) if name == "x"
        ));
        assert_eq!(c.entity_count(), 0);
    }

    #[test]
    fn test_derived_name_self_reference() {
        let mut c = ctx();
        // derives "Σ_a_Σ_a", which is the second operand
        assert!(matches!(
            synthesize(&mut c, &guard(), &call(&["a", "Σ_a_Σ_a"])),
            Err(Error::SelfReference { name }) if name == "Σ_a_Σ_a"
        ));
        assert_eq!(c.entity_count(), 0);
    }

    #[test]
    fn test_explicit_name_not_stored_as_attribute() {
        let mut c = ctx();
        synthesize(&mut c, &guard(), &call(&["a", "b"]).attr(NAME_ATTR, "whole")).unwrap();
        let whole = c.entity("whole").unwrap();
        assert!(whole.get(NAME_ATTR).is_none());
        assert_eq!(whole.get("nigc_potential"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_single_operand_rejected() {
        let mut c = ctx();
        assert!(matches!(
            synthesize(&mut c, &guard(), &call(&["a"])),
            Err(Error::InvalidOperand { .. })
        ));
    }

    #[test]
    fn test_derived_name_uses_three_operands() {
        assert_eq!(derived_name(&["alpha", "beta", "gamma", "delta"]), "Σ_alp_bet_gam");
        assert_eq!(derived_name(&["ΑΛΣΩ", "b"]), "Σ_ΑΛΣ_b");
    }
}
