//! Dialogue exchange records: the offering, the score, the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PropertyMap;

/// What the Dialogue gesture hands to the external text source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub intent: String,
    pub operands: Vec<String>,
    pub coherence: f64,
    pub active_tensions: usize,
    /// Every registered blind-spot key at offering time.
    pub blind_spots: Vec<String>,
    pub operator_id: String,
    pub attributes: PropertyMap,
}

/// Three-part generativity score plus its mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerativityScore {
    pub unpredictability: f64,
    pub reflexivity: f64,
    pub emergence: f64,
    pub overall: f64,
}

impl GenerativityScore {
    /// Build from sub-scores, clamping each to [0, 1]. `overall` is their exact mean.
    pub fn from_parts(unpredictability: f64, reflexivity: f64, emergence: f64) -> Self {
        let unpredictability = unpredictability.clamp(0.0, 1.0);
        let reflexivity = reflexivity.clamp(0.0, 1.0);
        let emergence = emergence.clamp(0.0, 1.0);
        Self {
            unpredictability,
            reflexivity,
            emergence,
            overall: (unpredictability + reflexivity + emergence) / 3.0,
        }
    }

    /// True when every component lies in [0, 1].
    pub fn is_bounded(&self) -> bool {
        [self.unpredictability, self.reflexivity, self.emergence, self.overall]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

/// How a dialogue ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueOutcome {
    /// No answer: an unknown entity was created.
    Silence,
    /// Score met the threshold: a generative insight was created.
    Integrated,
    /// Score missed the threshold: response attached as an attribute.
    Attached,
}

/// One Dialogue-gesture exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueRecord {
    pub offering: Offering,
    pub response: Option<String>,
    pub score: Option<GenerativityScore>,
    pub outcome: DialogueOutcome,
    pub result: String,
    pub recorded_at: DateTime<Utc>,
}
