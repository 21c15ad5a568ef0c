//! Relation (edge) in the context graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{PropertyMap, Value};

/// Opaque relation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelId(pub u64);

impl std::fmt::Display for RelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relation-type symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Created by Link.
    Link,
    /// Synthesis input → synthesis result.
    Component,
    /// Invariant → enriched target.
    Integration,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Link => "link",
            RelationType::Component => "component",
            RelationType::Integration => "integration",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed relation between two existing entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelId,
    pub source: String,
    pub target: String,
    pub rel_type: RelationType,
    pub properties: PropertyMap,
    pub created_at: DateTime<Utc>,
}

impl Relation {
    pub fn new(
        id: RelId,
        source: impl Into<String>,
        target: impl Into<String>,
        rel_type: RelationType,
    ) -> Self {
        Self {
            id,
            source: source.into(),
            target: target.into(),
            rel_type,
            properties: PropertyMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The "other" end of the relation from the given entity.
    pub fn other_end(&self, from: &str) -> Option<&str> {
        if from == self.source { Some(&self.target) }
        else if from == self.target { Some(&self.source) }
        else { None }
    }

    /// True when `other` runs exactly the opposite way.
    pub fn is_reverse_of(&self, other: &Relation) -> bool {
        self.source == other.target && self.target == other.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_end() {
        let r = Relation::new(RelId(1), "a", "b", RelationType::Link);
        assert_eq!(r.other_end("a"), Some("b"));
        assert_eq!(r.other_end("b"), Some("a"));
        assert_eq!(r.other_end("c"), None);
    }

    #[test]
    fn test_reverse() {
        let ab = Relation::new(RelId(1), "a", "b", RelationType::Link);
        let ba = Relation::new(RelId(2), "b", "a", RelationType::Link);
        let ac = Relation::new(RelId(3), "a", "c", RelationType::Link);
        assert!(ab.is_reverse_of(&ba));
        assert!(!ab.is_reverse_of(&ac));
    }
}
