//! Tension: an unresolved structural conflict between two entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensionKind {
    /// A relation and its exact reverse exist at the same time.
    Bidirectional,
}

impl TensionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TensionKind::Bidirectional => "bidirectional",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tension {
    pub kind: TensionKind,
    pub entities: [String; 2],
    pub description: String,
    /// Annotations added while the tension is open (e.g. by Extract).
    pub notes: Vec<String>,
    pub detected_at: DateTime<Utc>,
}

impl Tension {
    pub fn bidirectional(source: &str, target: &str) -> Self {
        Self {
            kind: TensionKind::Bidirectional,
            entities: [source.to_string(), target.to_string()],
            description: format!("bidirectional links between {source} and {target}"),
            notes: Vec::new(),
            detected_at: Utc::now(),
        }
    }

    pub fn involves(&self, entity: &str) -> bool {
        self.entities.iter().any(|e| e == entity)
    }

    /// True when the description or any note names `name` as a whole
    /// token: `omega_a` does not match inside `omega_ab`.
    pub fn mentions(&self, name: &str) -> bool {
        names(&self.description, name) || self.notes.iter().any(|n| names(n, name))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn names(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    text.match_indices(name).any(|(i, _)| {
        let before = text[..i].chars().next_back();
        let after = text[i + name.len()..].chars().next();
        !before.is_some_and(is_name_char) && !after.is_some_and(is_name_char)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_notes() {
        let mut t = Tension::bidirectional("a", "b");
        assert!(t.involves("a") && t.involves("b"));
        assert!(!t.mentions("omega_a"));
        t.notes.push("under review by omega_a".into());
        assert!(t.mentions("omega_a"));
    }

    #[test]
    fn test_mentions_whole_names_only() {
        let mut t = Tension::bidirectional("a", "b");
        t.notes.push("under review by omega_ab".into());
        assert!(!t.mentions("omega_a"));
        assert!(t.mentions("omega_ab"));
        assert!(!t.mentions("mega_ab"));
        assert!(!t.mentions(""));
    }
}
