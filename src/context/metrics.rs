//! Metrics Engine: coherence and the graph counts it is built from.
//!
//! Everything here is a pure function of the current graph shape.
//! Coherence is never stored as mutable state; it is sampled into
//! events and the coherence history by the dispatcher.

use serde::{Deserialize, Serialize};

use crate::model::LimitType;
use super::Context;

// ============================================================================
// Weights and thresholds
// ============================================================================

const W_CONNECTIVITY: f64 = 0.4;
const W_DENSITY: f64 = 0.2;
const W_CALM: f64 = 0.2;
const W_COVERAGE: f64 = 0.2;

/// Open tensions above this classify the run as a tension crisis.
pub const TENSION_CRISIS_THRESHOLD: usize = 5;
/// Isolated entities above this classify the run as fragmented.
pub const FRAGMENTATION_THRESHOLD: usize = 10;
/// Coherence below this classifies the run as collapsing.
pub const COHERENCE_COLLAPSE_THRESHOLD: f64 = 0.3;
/// Open tensions above this make Extract advise a dialogue next.
pub const DIALOGUE_ADVISORY_THRESHOLD: usize = 3;

// ============================================================================
// GraphMetrics
// ============================================================================

/// Raw shape counts the coherence score is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub nodes: usize,
    pub edges: usize,
    pub isolated: usize,
    pub tensions: usize,
    pub blind_spots: usize,
    pub required_present: usize,
    pub required_total: usize,
    pub dialogues: usize,
}

impl GraphMetrics {
    pub fn of(ctx: &Context) -> Self {
        let required_present = ctx
            .required_blind_spots()
            .iter()
            .filter(|k| ctx.blind_spots().contains_key(k.as_str()))
            .count();
        Self {
            nodes: ctx.entity_count(),
            edges: ctx.relation_count(),
            isolated: ctx.isolated_count(),
            tensions: ctx.tensions().len(),
            blind_spots: ctx.blind_spots().len(),
            required_present,
            required_total: ctx.required_blind_spots().len(),
            dialogues: ctx.dialogues().len(),
        }
    }

    /// Fraction of required blind-spot keys that are registered.
    pub fn coverage(&self) -> f64 {
        if self.required_total == 0 {
            1.0
        } else {
            self.required_present as f64 / self.required_total as f64
        }
    }

    /// Coherence in [0, 1].
    pub fn coherence(&self) -> f64 {
        let connectivity = if self.nodes == 0 {
            1.0
        } else {
            1.0 - self.isolated as f64 / self.nodes as f64
        };
        let density = if self.nodes == 0 {
            0.0
        } else {
            (self.edges as f64 / self.nodes as f64).min(1.0)
        };
        let tension_ratio = (self.tensions as f64 / self.edges.max(1) as f64).min(1.0);

        let score = W_CONNECTIVITY * connectivity
            + W_DENSITY * density
            + W_CALM * (1.0 - tension_ratio)
            + W_COVERAGE * self.coverage();
        score.clamp(0.0, 1.0)
    }
}

/// Classify the limit state with fixed thresholds, first match wins.
pub fn classify(tensions: usize, isolated: usize, coherence: f64) -> LimitType {
    if tensions > TENSION_CRISIS_THRESHOLD {
        LimitType::TensionCrisis
    } else if isolated > FRAGMENTATION_THRESHOLD {
        LimitType::Fragmentation
    } else if coherence < COHERENCE_COLLAPSE_THRESHOLD {
        LimitType::CoherenceCollapse
    } else {
        LimitType::Normal
    }
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub coherence: f64,
    pub tension_count: usize,
    pub dialogue_count: usize,
    pub node_count: usize,
    pub isolated_node_count: usize,
    pub blind_spot_count: usize,
    pub limit_type: LimitType,
}

impl From<GraphMetrics> for Summary {
    fn from(m: GraphMetrics) -> Self {
        let coherence = m.coherence();
        Self {
            coherence,
            tension_count: m.tensions,
            dialogue_count: m.dialogues,
            node_count: m.nodes,
            isolated_node_count: m.isolated,
            blind_spot_count: m.blind_spots,
            limit_type: classify(m.tensions, m.isolated, coherence),
        }
    }
}
