//! # Context Store
//!
//! The single mutable unit a run works on: the attributed graph plus the
//! tension log, blind-spot registry, dialogue log, event ledger, weight
//! records and coherence history.
//!
//! Gestures receive it by exclusive `&mut` for the span of one call.
//! Reads are public; writes are crate-private so that only gestures and
//! the dispatcher can mutate.
//!
//! ## Invariants
//!
//! - entity names are unique (re-creation follows [`EntityPolicy`])
//! - every relation's endpoints exist before it is recorded
//! - the blind-spot registry never shrinks
//! - every entity has a weight record

pub mod metrics;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use serde::{Deserialize, Serialize};

use crate::config::{EntityPolicy, RuntimeConfig};
use crate::model::*;
use crate::{Error, Result};

pub use metrics::{GraphMetrics, Summary};

/// One coherence sample, taken after each event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoherenceSample {
    pub seq: u64,
    pub coherence: f64,
}

// ============================================================================
// Context
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    operator_id: String,
    created_at: DateTime<Utc>,
    policy: EntityPolicy,

    entities: HashMap<String, Entity>,
    relations: BTreeMap<RelId, Relation>,
    /// entity name → ids of every relation touching it
    adjacency: HashMap<String, Vec<RelId>>,
    next_rel_id: u64,

    tensions: Vec<Tension>,
    blind_spots: BTreeMap<String, String>,
    required_blind_spots: Vec<String>,
    dialogues: Vec<DialogueRecord>,
    events: Vec<Event>,
    weights: HashMap<String, Weight>,
    coherence_history: Vec<CoherenceSample>,
}

impl Context {
    /// Fresh context with the required blind spots already acknowledged.
    pub fn new(config: &RuntimeConfig) -> Self {
        let mut blind_spots = BTreeMap::new();
        for seed in &config.required_blind_spots {
            blind_spots.insert(seed.key.clone(), seed.description.clone());
        }
        Self {
            operator_id: config.operator_id.clone(),
            created_at: Utc::now(),
            policy: config.entity_policy,
            entities: HashMap::new(),
            relations: BTreeMap::new(),
            adjacency: HashMap::new(),
            next_rel_id: 1,
            tensions: Vec::new(),
            blind_spots,
            required_blind_spots: config.required_blind_spots.iter().map(|s| s.key.clone()).collect(),
            dialogues: Vec::new(),
            events: Vec::new(),
            weights: HashMap::new(),
            coherence_history: Vec::new(),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn operator_id(&self) -> &str { &self.operator_id }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn policy(&self) -> EntityPolicy { self.policy }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relation(&self, id: RelId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    /// All relations in creation order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Relations touching `name`, in creation order.
    pub fn relations_of(&self, name: &str) -> Vec<&Relation> {
        self.adjacency
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.relations.get(id)).collect())
            .unwrap_or_default()
    }

    /// True when any relation runs `source → target`.
    pub fn has_relation(&self, source: &str, target: &str) -> bool {
        self.relations_of(source)
            .iter()
            .any(|r| r.source == source && r.target == target)
    }

    /// Entities with no relation at all.
    pub fn isolated_count(&self) -> usize {
        self.entities
            .keys()
            .filter(|name| self.adjacency.get(name.as_str()).is_none_or(|ids| ids.is_empty()))
            .count()
    }

    pub fn tensions(&self) -> &[Tension] { &self.tensions }
    pub fn blind_spots(&self) -> &BTreeMap<String, String> { &self.blind_spots }
    pub fn required_blind_spots(&self) -> &[String] { &self.required_blind_spots }
    pub fn dialogues(&self) -> &[DialogueRecord] { &self.dialogues }
    pub fn events(&self) -> &[Event] { &self.events }
    pub fn weights(&self) -> &HashMap<String, Weight> { &self.weights }
    pub fn coherence_history(&self) -> &[CoherenceSample] { &self.coherence_history }

    /// Blind-spot keys that occur in `text` (case-insensitive), in key order.
    pub fn blind_spots_mentioned(&self, text: &str) -> NameSet {
        let lower = text.to_lowercase();
        self.blind_spots
            .keys()
            .filter(|k| lower.contains(k.as_str()))
            .cloned()
            .collect()
    }

    // ========================================================================
    // Metrics
    // ========================================================================

    pub fn metrics(&self) -> GraphMetrics {
        GraphMetrics::of(self)
    }

    pub fn coherence(&self) -> f64 {
        self.metrics().coherence()
    }

    pub fn summary(&self) -> Summary {
        Summary::from(self.metrics())
    }

    /// True when the current coherence is strictly above the last sample.
    /// With no samples yet, any coherence counts as an improvement over nothing.
    pub fn coherence_improved(&self) -> bool {
        match self.coherence_history.last() {
            Some(last) => self.coherence() > last.coherence,
            None => true,
        }
    }

    // ========================================================================
    // Writes (gestures + dispatcher only)
    // ========================================================================

    /// Insert or re-create an entity under the context's policy, refreshing
    /// its weight record. Returns true when the name was new.
    pub(crate) fn put_entity(&mut self, entity: Entity, justification: impl Into<String>) -> bool {
        let name = entity.name.clone();
        let gesture = entity.origin;
        let created = match self.entities.entry(name.clone()) {
            Entry::Occupied(mut slot) => {
                match self.policy {
                    EntityPolicy::Merge => merge_into(slot.get_mut(), entity),
                    EntityPolicy::Overwrite => {
                        let created_at = slot.get().created_at;
                        let replaced = slot.get_mut();
                        *replaced = entity;
                        replaced.created_at = created_at;
                        replaced.touch();
                    }
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(entity);
                self.adjacency.entry(name.clone()).or_default();
                true
            }
        };
        self.weights.insert(name.clone(), Weight {
            entity: name,
            gesture,
            justification: justification.into(),
            recorded_at: Utc::now(),
        });
        created
    }

    pub(crate) fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }

    /// Record a relation. Both endpoints must already exist.
    pub(crate) fn add_relation(
        &mut self,
        source: &str,
        target: &str,
        rel_type: RelationType,
        properties: PropertyMap,
    ) -> Result<RelId> {
        if !self.contains(source) {
            return Err(Error::NotFound(format!("relation source '{source}'")));
        }
        if !self.contains(target) {
            return Err(Error::NotFound(format!("relation target '{target}'")));
        }

        let id = RelId(self.next_rel_id);
        self.next_rel_id += 1;

        let mut rel = Relation::new(id, source, target, rel_type);
        rel.properties = properties;
        self.relations.insert(id, rel);

        self.adjacency.entry(source.to_string()).or_default().push(id);
        if source != target {
            self.adjacency.entry(target.to_string()).or_default().push(id);
        }
        Ok(id)
    }

    /// Insert-if-absent. Returns true when the key is new.
    pub(crate) fn register_blind_spot(&mut self, key: &str, description: impl Into<String>) -> bool {
        if self.blind_spots.contains_key(key) {
            return false;
        }
        self.blind_spots.insert(key.to_string(), description.into());
        true
    }

    pub(crate) fn add_tension(&mut self, tension: Tension) {
        self.tensions.push(tension);
    }

    /// Append `note` to every open tension involving `entity`. Returns how many.
    pub(crate) fn annotate_tensions(&mut self, entity: &str, note: &str) -> usize {
        let mut count = 0;
        for t in self.tensions.iter_mut().filter(|t| t.involves(entity)) {
            t.notes.push(note.to_string());
            count += 1;
        }
        count
    }

    /// Remove every tension involving `entity` that mentions `reference`.
    pub(crate) fn resolve_tensions(&mut self, entity: &str, reference: &str) -> usize {
        let before = self.tensions.len();
        self.tensions.retain(|t| !(t.involves(entity) && t.mentions(reference)));
        before - self.tensions.len()
    }

    pub(crate) fn record_dialogue(&mut self, record: DialogueRecord) {
        self.dialogues.push(record);
    }

    pub(crate) fn next_event_seq(&self) -> u64 {
        self.events.len() as u64 + 1
    }

    /// Append an event and sample its after-coherence into the history.
    pub(crate) fn push_event(&mut self, event: Event) {
        self.coherence_history.push(CoherenceSample {
            seq: event.seq,
            coherence: event.coherence_after,
        });
        self.events.push(event);
    }
}

fn merge_into(existing: &mut Entity, incoming: Entity) {
    if incoming.kind != EntityKind::Implicit {
        existing.kind = incoming.kind;
    }
    existing.intent.extend(incoming.intent);
    if incoming.meaning.is_some() {
        existing.meaning = incoming.meaning;
    }
    existing.boundary_recognition |= incoming.boundary_recognition;
    if !incoming.components.is_empty() {
        existing.components = incoming.components;
    }
    if incoming.enriched_by.is_some() {
        existing.enriched_by = incoming.enriched_by;
    }
    if incoming.analysis.is_some() {
        existing.analysis = incoming.analysis;
    }
    existing.extra.extend(incoming.extra);
    existing.touch();
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(policy: EntityPolicy) -> Context {
        Context::new(&RuntimeConfig { entity_policy: policy, ..Default::default() })
    }

    fn plain(name: &str) -> Entity {
        Entity::new(name, EntityKind::Plain, GestureKind::Collapse)
    }

    #[test]
    fn test_new_context_seeds_required_blind_spots() {
        let ctx = ctx_with(EntityPolicy::Merge);
        assert_eq!(ctx.blind_spots().len(), 3);
        assert!(ctx.blind_spots().contains_key("qualia"));
        assert_eq!(ctx.metrics().coverage(), 1.0);
    }

    #[test]
    fn test_merge_policy_keeps_single_entity() {
        let mut ctx = ctx_with(EntityPolicy::Merge);
        assert!(ctx.put_entity(plain("a").with_attr("x", 1).with_meaning("first"), "test"));
        assert!(!ctx.put_entity(plain("a").with_attr("y", 2), "test"));

        assert_eq!(ctx.entity_count(), 1);
        let a = ctx.entity("a").unwrap();
        assert_eq!(a.get("x"), Some(&Value::Int(1)));
        assert_eq!(a.get("y"), Some(&Value::Int(2)));
        assert_eq!(a.meaning.as_deref(), Some("first"));
    }

    #[test]
    fn test_overwrite_policy_replaces_record() {
        let mut ctx = ctx_with(EntityPolicy::Overwrite);
        ctx.put_entity(plain("a").with_attr("x", 1), "test");
        ctx.put_entity(plain("a").with_attr("y", 2), "test");

        assert_eq!(ctx.entity_count(), 1);
        let a = ctx.entity("a").unwrap();
        assert!(a.get("x").is_none());
        assert_eq!(a.get("y"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_merge_upgrades_implicit_kind() {
        let mut ctx = ctx_with(EntityPolicy::Merge);
        ctx.put_entity(Entity::new("a", EntityKind::Implicit, GestureKind::Link), "auto");
        ctx.put_entity(plain("a"), "explicit");
        assert_eq!(ctx.entity("a").unwrap().kind, EntityKind::Plain);
    }

    #[test]
    fn test_relation_requires_endpoints() {
        let mut ctx = ctx_with(EntityPolicy::Merge);
        ctx.put_entity(plain("a"), "test");
        assert!(matches!(
            ctx.add_relation("a", "b", RelationType::Link, PropertyMap::new()),
            Err(Error::NotFound(_))
        ));
        assert_eq!(ctx.relation_count(), 0);

        ctx.put_entity(plain("b"), "test");
        let id = ctx.add_relation("a", "b", RelationType::Link, PropertyMap::new()).unwrap();
        assert_eq!(id, RelId(1));
        assert!(ctx.has_relation("a", "b"));
        assert!(!ctx.has_relation("b", "a"));
        assert_eq!(ctx.isolated_count(), 0);
    }

    #[test]
    fn test_blind_spot_registry_is_insert_if_absent() {
        let mut ctx = ctx_with(EntityPolicy::Merge);
        assert!(ctx.register_blind_spot("phi_silence", "first"));
        assert!(!ctx.register_blind_spot("phi_silence", "second"));
        assert_eq!(ctx.blind_spots()["phi_silence"], "first");
    }

    #[test]
    fn test_weights_track_entities() {
        let mut ctx = ctx_with(EntityPolicy::Merge);
        ctx.put_entity(plain("a"), "one");
        ctx.put_entity(plain("b"), "two");
        ctx.put_entity(plain("a"), "again");
        assert_eq!(ctx.weights().len(), ctx.entity_count());
        assert_eq!(ctx.weights()["a"].justification, "again");
    }

    #[test]
    fn test_tension_annotation_and_resolution() {
        let mut ctx = ctx_with(EntityPolicy::Merge);
        ctx.add_tension(Tension::bidirectional("a", "b"));
        ctx.add_tension(Tension::bidirectional("c", "d"));

        assert_eq!(ctx.resolve_tensions("a", "omega_a"), 0);
        assert_eq!(ctx.annotate_tensions("a", "under review by omega_a"), 1);
        assert_eq!(ctx.resolve_tensions("a", "omega_a"), 1);
        assert_eq!(ctx.tensions().len(), 1);
    }

    #[test]
    fn test_resolution_needs_the_exact_invariant() {
        let mut ctx = ctx_with(EntityPolicy::Merge);
        ctx.add_tension(Tension::bidirectional("a", "b"));
        ctx.annotate_tensions("a", "under review by omega_ab");

        assert_eq!(ctx.resolve_tensions("a", "omega_a"), 0);
        assert_eq!(ctx.resolve_tensions("a", "omega_ab"), 1);
    }

    #[test]
    fn test_coherence_improved_against_last_sample() {
        let mut ctx = ctx_with(EntityPolicy::Merge);
        assert!(ctx.coherence_improved());

        ctx.coherence_history.push(CoherenceSample { seq: 1, coherence: ctx.coherence() });
        assert!(!ctx.coherence_improved());

        ctx.coherence_history.push(CoherenceSample { seq: 2, coherence: 0.1 });
        assert!(ctx.coherence_improved());
    }

    #[test]
    fn test_blind_spots_mentioned() {
        let ctx = ctx_with(EntityPolicy::Merge);
        let found = ctx.blind_spots_mentioned("On QUALIA and consciousness");
        assert_eq!(found.as_slice(), ["consciousness".to_string(), "qualia".to_string()]);
    }
}
