//! Gesture identity and the immutable event ledger entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::RelId;

/// The six gestures. The only legal ways to mutate a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Collapse,
    Link,
    Synthesize,
    Extract,
    Enrich,
    Dialogue,
}

impl GestureKind {
    pub const ALL: [GestureKind; 6] = [
        GestureKind::Collapse,
        GestureKind::Link,
        GestureKind::Synthesize,
        GestureKind::Extract,
        GestureKind::Enrich,
        GestureKind::Dialogue,
    ];

    /// Resolve an operator symbol. Greek, short and long names are accepted.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let kind = match symbol {
            "Α" | "alpha" | "collapse" => GestureKind::Collapse,
            "Λ" | "lambda" | "link" => GestureKind::Link,
            "Σ" | "sigma" | "synthesize" => GestureKind::Synthesize,
            "Ω" | "omega" | "extract" => GestureKind::Extract,
            "∇" | "nabla" | "enrich" => GestureKind::Enrich,
            "Φ" | "phi" | "dialogue" => GestureKind::Dialogue,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical operator symbol recorded on events.
    pub fn symbol(&self) -> &'static str {
        match self {
            GestureKind::Collapse => "Α",
            GestureKind::Link => "Λ",
            GestureKind::Synthesize => "Σ",
            GestureKind::Extract => "Ω",
            GestureKind::Enrich => "∇",
            GestureKind::Dialogue => "Φ",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GestureKind::Collapse => "collapse",
            GestureKind::Link => "link",
            GestureKind::Synthesize => "synthesize",
            GestureKind::Extract => "extract",
            GestureKind::Enrich => "enrich",
            GestureKind::Dialogue => "dialogue",
        }
    }
}

impl std::fmt::Display for GestureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What a gesture produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ResultRef {
    Entity(String),
    Relation(RelId),
}

impl ResultRef {
    pub fn entity(&self) -> Option<&str> {
        match self {
            ResultRef::Entity(name) => Some(name),
            ResultRef::Relation(_) => None,
        }
    }

    pub fn relation(&self) -> Option<RelId> {
        match self {
            ResultRef::Relation(id) => Some(*id),
            ResultRef::Entity(_) => None,
        }
    }
}

impl std::fmt::Display for ResultRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultRef::Entity(name) => f.write_str(name),
            ResultRef::Relation(id) => write!(f, "rel:{id}"),
        }
    }
}

/// Small name set; most gestures touch one to three entities.
pub type NameSet = SmallVec<[String; 4]>;

/// Immutable record of one executed gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub gesture: GestureKind,
    pub operator: String,
    pub operands: Vec<String>,
    pub result: ResultRef,
    pub entities_touched: NameSet,
    pub blind_spots: NameSet,
    pub coherence_before: f64,
    pub coherence_after: f64,
    pub tensions_resolved: usize,
    pub tensions_created: usize,
    pub intent: Option<String>,
    /// Set only by Extract.
    pub crisis: bool,
    pub recorded_at: DateTime<Utc>,
}

impl Event {
    pub fn coherence_delta(&self) -> f64 {
        self.coherence_after - self.coherence_before
    }
}
