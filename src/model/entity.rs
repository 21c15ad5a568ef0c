//! Entity (node) in the context graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GestureKind, PropertyMap, Value};

/// Kind tag carried by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Created directly by Collapse.
    Plain,
    /// Auto-created as a missing endpoint or operand.
    Implicit,
    /// Snapshot produced by Extract.
    Invariant,
    /// Result of Synthesize.
    Synthesis,
    /// Dialogue response that passed the generativity gate.
    GenerativeInsight,
    /// Placeholder for a dialogue that got no answer.
    Unknown,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Plain => "plain",
            EntityKind::Implicit => "implicit",
            EntityKind::Invariant => "invariant",
            EntityKind::Synthesis => "synthesis",
            EntityKind::GenerativeInsight => "generative-insight",
            EntityKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limit state of a run, classified from the metrics at Extract time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimitType {
    Normal,
    TensionCrisis,
    Fragmentation,
    CoherenceCollapse,
}

impl LimitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitType::Normal => "normal",
            LimitType::TensionCrisis => "tension-crisis",
            LimitType::Fragmentation => "fragmentation",
            LimitType::CoherenceCollapse => "coherence-collapse",
        }
    }
}

impl std::fmt::Display for LimitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of context health taken by Extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub coherence: f64,
    pub active_tensions: usize,
    pub dialogues: usize,
    pub entities: usize,
    pub isolated_entities: usize,
    pub blind_spots: usize,
    pub limit_type: LimitType,
    pub target: Option<String>,
    pub taken_at: DateTime<Utc>,
}

/// A node in the context graph.
///
/// Known attributes are typed fields; everything a program supplies
/// beyond them lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    /// Gesture that first brought the entity into the graph.
    pub origin: GestureKind,
    pub intent: Vec<String>,
    pub meaning: Option<String>,
    pub boundary_recognition: bool,
    /// Synthesis inputs, in operand order.
    pub components: Vec<String>,
    /// Invariant integrated by the last Enrich, if any.
    pub enriched_by: Option<String>,
    pub analysis: Option<Analysis>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub extra: PropertyMap,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind, origin: GestureKind) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            kind,
            origin,
            intent: Vec::new(),
            meaning: None,
            boundary_recognition: false,
            components: Vec::new(),
            enriched_by: None,
            analysis: None,
            created_at: now,
            updated_at: now,
            extra: PropertyMap::new(),
        }
    }

    pub fn with_intent(mut self, intent: &[String]) -> Self {
        self.intent = intent.to_vec();
        self
    }

    pub fn with_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.meaning = Some(meaning.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Apply program-supplied overrides. `meaning` goes to its typed
    /// field, everything else to `extra`.
    pub fn apply_overrides(&mut self, overrides: &PropertyMap) {
        for (key, value) in overrides {
            match key.as_str() {
                "meaning" => self.meaning = Some(value.to_text()),
                "boundary_recognition" => {
                    self.boundary_recognition = value.is_truthy();
                }
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// True for entities Enrich may integrate.
    pub fn is_invariant_source(&self) -> bool {
        self.kind == EntityKind::Invariant || self.boundary_recognition
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Per-entity justification record required by the export boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub entity: String,
    pub gesture: GestureKind,
    pub justification: String,
    pub recorded_at: DateTime<Utc>,
}
