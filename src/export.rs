//! Cycle export: the summary of a finished run, the checks a run must
//! pass before it leaves the process, and a JSON writer.
//!
//! ```text
//! Dispatcher::run ──► RunReport.cycle ──► CycleRecord::build ──► write_json
//!                                          (validate_cycle)
//! ```
//!
//! Validation never touches the context; a failing check leaves the run
//! exactly as it was.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::axiom::AxiomGuard;
use crate::config::{FairCareMetadata, RuntimeConfig};
use crate::context::{CoherenceSample, Context};
use crate::model::*;
use crate::{Error, Result};

/// Counts, timestamps and final coherence of one execution cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub operator_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub operations_evaluated: usize,
    pub operations_failed: usize,
    pub events_recorded: usize,
    pub final_coherence: f64,
}

impl CycleSummary {
    /// Fresh cycle id, finished now, all counts zero.
    pub fn begin(operator_id: &str, started_at: DateTime<Utc>, final_coherence: f64) -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            operator_id: operator_id.to_string(),
            started_at,
            finished_at: Utc::now(),
            operations_evaluated: 0,
            operations_failed: 0,
            events_recorded: 0,
            final_coherence,
        }
    }
}

fn failure(check: &str, message: impl Into<String>) -> Error {
    Error::ValidationFailure { check: check.to_string(), message: message.into() }
}

/// Every check a cycle must pass before export, first failure wins.
pub fn validate_cycle(summary: &CycleSummary, ctx: &Context, config: &RuntimeConfig) -> Result<()> {
    // structure
    if summary.cycle_id.is_nil() {
        return Err(failure("cycle_id", "cycle id is empty"));
    }
    if !(0.0..=1.0).contains(&summary.final_coherence) {
        return Err(failure(
            "final_coherence",
            format!("{} is outside [0, 1]", summary.final_coherence),
        ));
    }

    // blind spots
    if ctx.blind_spots().is_empty() {
        return Err(failure("blind_spots", "no blind spots acknowledged"));
    }
    let missing: Vec<&str> = config
        .required_blind_spots
        .iter()
        .map(|s| s.key.as_str())
        .filter(|k| !ctx.blind_spots().contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(failure("blind_spots", format!("required blind spots missing: {}", missing.join(", "))));
    }

    // integrity
    if ctx.entity_count() > config.max_entities {
        return Err(failure(
            "entity_count",
            format!("{} entities exceed the ceiling of {}", ctx.entity_count(), config.max_entities),
        ));
    }
    if ctx.tensions().len() > config.max_tensions {
        return Err(failure(
            "tensions",
            format!("{} open tensions exceed the limit of {}", ctx.tensions().len(), config.max_tensions),
        ));
    }

    // habeas weights
    let mut unweighted: Vec<&str> = ctx.entity_names().filter(|n| !ctx.weights().contains_key(*n)).collect();
    if !unweighted.is_empty() {
        unweighted.sort_unstable();
        return Err(failure("weights", format!("entities without a weight: {}", unweighted.join(", "))));
    }

    // dialogue scores
    for (i, record) in ctx.dialogues().iter().enumerate() {
        if record.score.is_some_and(|s| !s.is_bounded()) {
            return Err(failure("dialogues", format!("dialogue {i} has a score outside [0, 1]")));
        }
    }

    if let Some(meta) = &config.fair_care {
        validate_fair_care(meta, config)?;
    }
    Ok(())
}

fn validate_fair_care(meta: &FairCareMetadata, config: &RuntimeConfig) -> Result<()> {
    if meta.license.trim().is_empty() {
        return Err(failure("fair_care", "license is empty"));
    }
    if meta.creator.trim().is_empty() {
        return Err(failure("fair_care", "creator is empty"));
    }
    if meta.community_standards.iter().all(|s| s.trim().is_empty()) {
        return Err(failure("fair_care", "community_standards is empty"));
    }
    AxiomGuard::from_config(config)
        .scan_forbidden(&meta.ethics_statement)
        .map_err(|e| failure("fair_care", format!("ethics statement: {e}")))
}

// ============================================================================
// CycleRecord
// ============================================================================

/// Serializable hand-off of a validated cycle. Collections are sorted so
/// the same run always serializes the same way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle: CycleSummary,
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
    pub tensions: Vec<Tension>,
    pub blind_spots: BTreeMap<String, String>,
    pub dialogues: Vec<DialogueRecord>,
    pub events: Vec<Event>,
    pub weights: Vec<Weight>,
    pub coherence_history: Vec<CoherenceSample>,
    pub fair_care: Option<FairCareMetadata>,
}

impl CycleRecord {
    /// Validate, then snapshot the context.
    pub fn build(summary: &CycleSummary, ctx: &Context, config: &RuntimeConfig) -> Result<Self> {
        validate_cycle(summary, ctx, config)?;

        let mut entities: Vec<Entity> = ctx.entities().cloned().collect();
        entities.sort_by(|a, b| a.name.cmp(&b.name));
        let mut weights: Vec<Weight> = ctx.weights().values().cloned().collect();
        weights.sort_by(|a, b| a.entity.cmp(&b.entity));

        Ok(Self {
            cycle: summary.clone(),
            entities,
            relations: ctx.relations().cloned().collect(),
            tensions: ctx.tensions().to_vec(),
            blind_spots: ctx.blind_spots().clone(),
            dialogues: ctx.dialogues().to_vec(),
            events: ctx.events().to_vec(),
            weights,
            coherence_history: ctx.coherence_history().to_vec(),
            fair_care: config.fair_care.clone(),
        })
    }
}

/// Write a record as pretty JSON.
pub fn write_json(record: &CycleRecord, writer: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, record)?;
    writeln!(writer)?;
    Ok(())
}
