//! Axiom Guard: pre-mutation checks every gesture runs.
//!
//! Two checks, both cheap and side-effect free:
//! - resource ceilings (nesting depth, entity count)
//! - a deny-list scan for absolutist phrasing

use crate::config::RuntimeConfig;
use crate::{Error, Result};

/// Which ceiling was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    Depth,
    EntityCount,
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitKind::Depth => f.write_str("nesting depth"),
            LimitKind::EntityCount => f.write_str("entity count"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AxiomGuard {
    max_depth: usize,
    max_entities: usize,
    /// Lower-cased, whitespace-normalised terms.
    forbidden: Vec<String>,
}

impl AxiomGuard {
    pub fn new(max_depth: usize, max_entities: usize, forbidden: &[String]) -> Self {
        Self {
            max_depth,
            max_entities,
            forbidden: forbidden.iter().map(|t| normalize(t)).filter(|t| !t.is_empty()).collect(),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.max_depth, config.max_entities, &config.forbidden_terms)
    }

    pub fn max_entities(&self) -> usize {
        self.max_entities
    }

    /// `entity_count` is the count the context would hold after the gesture.
    pub fn check(&self, depth: usize, entity_count: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(Error::LimitExceeded {
                limit: LimitKind::Depth,
                value: depth,
                ceiling: self.max_depth,
            });
        }
        if entity_count > self.max_entities {
            return Err(Error::LimitExceeded {
                limit: LimitKind::EntityCount,
                value: entity_count,
                ceiling: self.max_entities,
            });
        }
        Ok(())
    }

    /// Fails on the first deny-listed term found as whole word(s) in `text`.
    pub fn scan_forbidden(&self, text: &str) -> Result<()> {
        let haystack = format!(" {} ", normalize(text));
        for term in &self.forbidden {
            if haystack.contains(&format!(" {term} ")) {
                return Err(Error::ProhibitedPhrasing { term: term.clone() });
            }
        }
        Ok(())
    }
}

/// Lower-case and collapse every run of non-alphanumeric characters to one space.
fn normalize(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> AxiomGuard {
        AxiomGuard::from_config(&RuntimeConfig {
            max_depth: 2,
            max_entities: 3,
            forbidden_terms: vec!["only".into(), "beyond doubt".into()],
            ..Default::default()
        })
    }

    #[test]
    fn test_limits() {
        let g = guard();
        g.check(2, 3).unwrap();
        assert!(matches!(
            g.check(3, 0),
            Err(Error::LimitExceeded { limit: LimitKind::Depth, value: 3, ceiling: 2 })
        ));
        assert!(matches!(
            g.check(0, 4),
            Err(Error::LimitExceeded { limit: LimitKind::EntityCount, .. })
        ));
    }

    #[test]
    fn test_forbidden_whole_words() {
        let g = guard();
        assert!(matches!(
            g.scan_forbidden("the ONLY way"),
            Err(Error::ProhibitedPhrasing { term }) if term == "only"
        ));
        // substrings of longer words pass
        g.scan_forbidden("a lonely road").unwrap();
        g.scan_forbidden("").unwrap();
    }

    #[test]
    fn test_forbidden_multi_word() {
        let g = guard();
        assert!(g.scan_forbidden("true, beyond   doubt!").is_err());
        g.scan_forbidden("beyond the doubt").unwrap();
    }
}
