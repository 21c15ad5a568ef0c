//! # Gesture Handlers
//!
//! The six gestures are the only mutators of a [`Context`]. Each one is a
//! function over `(&mut Context, &AxiomGuard, &GestureCall)` that either
//! commits all of its mutations and returns an [`Outcome`], or fails before
//! the first write.
//!
//! | Gesture | Module | Result |
//! |---------|--------|--------|
//! | Collapse `Α` | `collapse` | new plain entity |
//! | Link `Λ` | `link` | new relation |
//! | Synthesize `Σ` | `synthesize` | new synthesis entity |
//! | Extract `Ω` | `extract` | new invariant entity |
//! | Enrich `∇` | `enrich` | the enriched target |
//! | Dialogue `Φ` | `dialogue` | insight, annotated operand, or unknown |
//!
//! The dispatcher turns each [`Outcome`] into an [`Event`](crate::model::Event)
//! by adding the coherence samples around the call.

pub mod collapse;
pub mod link;
pub mod synthesize;
pub mod extract;
pub mod enrich;
pub mod dialogue;

use crate::axiom::AxiomGuard;
use crate::context::Context;
use crate::model::*;
use crate::{Error, Result};

pub use crate::model::GestureKind;
pub use dialogue::DialogueSettings;

// ============================================================================
// GestureCall
// ============================================================================

/// One resolved gesture invocation: nested forms already evaluated,
/// operands flattened to names.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureCall {
    pub kind: GestureKind,
    pub operands: Vec<String>,
    pub intent: Vec<String>,
    pub attributes: PropertyMap,
    /// Nesting depth of the form this call came from (top level is 0).
    pub depth: usize,
}

impl GestureCall {
    pub fn new(kind: GestureKind) -> Self {
        Self {
            kind,
            operands: Vec::new(),
            intent: Vec::new(),
            attributes: PropertyMap::new(),
            depth: 0,
        }
    }

    pub fn operand(mut self, name: impl Into<String>) -> Self {
        self.operands.push(name.into());
        self
    }

    pub fn intent<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intent.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn at_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Positional operand `i`, trimmed.
    pub fn name(&self, i: usize) -> Option<&str> {
        self.operands.get(i).map(|s| s.trim())
    }

    /// Intent tokens joined by single spaces, `None` when there are none.
    pub fn intent_text(&self) -> Option<String> {
        if self.intent.is_empty() {
            None
        } else {
            Some(self.intent.join(" "))
        }
    }

    /// Weight justification recorded for entities this call creates.
    pub(crate) fn justification(&self) -> String {
        match self.intent_text() {
            Some(text) => format!("{}: {}", self.kind.symbol(), text),
            None => format!("{}: no intent given", self.kind.symbol()),
        }
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidOperand { gesture: self.kind, message: message.into() }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Everything an Event needs that only the gesture knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub entities_touched: NameSet,
    pub blind_spots: NameSet,
    pub tensions_resolved: usize,
    pub tensions_created: usize,
    pub crisis: bool,
    /// Non-binding hint surfaced in the run report.
    pub advisory: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub result: ResultRef,
    pub draft: EventDraft,
}

impl Outcome {
    pub fn entity(name: impl Into<String>) -> Self {
        Self { result: ResultRef::Entity(name.into()), draft: EventDraft::default() }
    }

    pub fn relation(id: RelId) -> Self {
        Self { result: ResultRef::Relation(id), draft: EventDraft::default() }
    }

    pub(crate) fn touching<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.draft.entities_touched.contains(&name) {
                self.draft.entities_touched.push(name);
            }
        }
        self
    }

    pub(crate) fn with_blind_spots(mut self, keys: NameSet) -> Self {
        self.draft.blind_spots = keys;
        self
    }
}

// ============================================================================
// Shared checks and helpers
// ============================================================================

/// Run both axiom checks for a call that would add `new_entities` entities.
/// Scans the operands and the intent text.
pub(crate) fn guard_call(
    guard: &AxiomGuard,
    ctx: &Context,
    call: &GestureCall,
    new_entities: usize,
) -> Result<()> {
    guard.check(call.depth, ctx.entity_count() + new_entities)?;
    for operand in &call.operands {
        guard.scan_forbidden(operand)?;
    }
    if let Some(text) = call.intent_text() {
        guard.scan_forbidden(&text)?;
    }
    Ok(())
}

/// Distinct names among `names` that the context does not hold yet.
pub(crate) fn missing<'a>(ctx: &Context, names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for name in names {
        if !ctx.contains(name) && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Create `name` as an implicit entity. Caller has checked it is absent.
pub(crate) fn create_implicit(ctx: &mut Context, name: &str, gesture: GestureKind) {
    let entity = Entity::new(name, EntityKind::Implicit, gesture)
        .with_intent(&[format!("implicitly created by {}", gesture.symbol())]);
    ctx.put_entity(entity, format!("{}: auto-created missing operand", gesture.symbol()));
    tracing::debug!(entity = name, gesture = %gesture, "implicit entity created");
}

/// First `max` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
