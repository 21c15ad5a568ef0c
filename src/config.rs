//! Runtime configuration.
//!
//! Supplied by the host (struct literal or TOML) and validated once when
//! the dispatcher is built.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::execution::recovery::RecoveryPolicy;
use crate::{Error, Result};

/// A blind-spot key every context must acknowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindSpotSeed {
    pub key: String,
    pub description: String,
}

impl BlindSpotSeed {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self { key: key.into(), description: description.into() }
    }
}

/// What happens when a gesture creates an entity whose name is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityPolicy {
    /// New attributes win, intent is appended, `implicit` kinds are upgraded.
    #[default]
    Merge,
    /// The record is replaced. Relations are kept.
    Overwrite,
}

/// FAIR/CARE metadata checked at export time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FairCareMetadata {
    pub license: String,
    pub creator: String,
    pub community_standards: Vec<String>,
    pub ethics_statement: String,
}

/// Configuration surfaced to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub operator_id: String,
    /// Overall generativity score a dialogue response must reach to become an entity.
    pub generativity_threshold: f64,
    /// Deepest allowed nesting of gesture forms (top level is 0).
    pub max_depth: usize,
    /// Maximum number of entities a context may hold.
    pub max_entities: usize,
    /// Open tensions tolerated at export.
    pub max_tensions: usize,
    pub required_blind_spots: Vec<BlindSpotSeed>,
    pub forbidden_terms: Vec<String>,
    pub entity_policy: EntityPolicy,
    pub dialogue_timeout_ms: u64,
    pub stop_on_error: bool,
    pub recovery: RecoveryPolicy,
    pub fair_care: Option<FairCareMetadata>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            operator_id: "anonymous_operator".into(),
            generativity_threshold: 0.7,
            max_depth: 8,
            max_entities: 10_000,
            max_tensions: 50,
            required_blind_spots: vec![
                BlindSpotSeed::new("consciousness", "the nature of subjective experience"),
                BlindSpotSeed::new("qualia", "what it is like to perceive from the inside"),
                BlindSpotSeed::new("other_minds", "access to the inner states of another"),
            ],
            forbidden_terms: ["only", "absolute", "absolutely", "inviolable", "unquestionable", "undeniable"]
                .into_iter()
                .map(String::from)
                .collect(),
            entity_policy: EntityPolicy::Merge,
            dialogue_timeout_ms: 5_000,
            stop_on_error: false,
            recovery: RecoveryPolicy::default(),
            fair_care: None,
        }
    }
}

impl RuntimeConfig {
    /// Parse from TOML. Missing fields take their defaults. Not validated.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        Ok(toml::from_str(src)?)
    }

    pub fn dialogue_timeout(&self) -> Duration {
        Duration::from_millis(self.dialogue_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.generativity_threshold) {
            return Err(Error::Config(format!(
                "generativity_threshold must be in [0, 1], got {}",
                self.generativity_threshold
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be > 0".into()));
        }
        if self.max_depth >= crate::syntax::MAX_NESTING {
            return Err(Error::Config(format!(
                "max_depth must be below {}, got {}",
                crate::syntax::MAX_NESTING,
                self.max_depth
            )));
        }
        if self.max_entities == 0 {
            return Err(Error::Config("max_entities must be > 0".into()));
        }
        if self.required_blind_spots.is_empty() {
            return Err(Error::Config("required_blind_spots must not be empty".into()));
        }
        if let Some(seed) = self.required_blind_spots.iter().find(|s| s.key.trim().is_empty()) {
            return Err(Error::Config(format!(
                "required blind spot with empty key (description: {:?})",
                seed.description
            )));
        }
        if self.forbidden_terms.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Config("forbidden_terms must not contain empty entries".into()));
        }
        if self.dialogue_timeout_ms == 0 {
            return Err(Error::Config("dialogue_timeout_ms must be > 0".into()));
        }
        if self.operator_id.trim().is_empty() {
            return Err(Error::Config("operator_id must not be empty".into()));
        }
        Ok(())
    }
}
