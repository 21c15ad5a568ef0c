//! Generativity scorer (NIGC).
//!
//! Scores a dialogue response on three bounded heuristics and averages
//! them. Deterministic: the same response, intent and entity set always
//! produce the same score.

use std::collections::HashSet;

use crate::model::GenerativityScore;

/// Hedging and boundary-acknowledging phrases counted by reflexivity.
pub const REFLEXIVE_PHRASES: &[&str] = &[
    "i think",
    "perhaps",
    "maybe",
    "boundary",
    "unknowable",
    "limitation",
    "i do not know",
    "guess",
    "suppose",
];

/// Reflexive phrases needed for a full reflexivity score.
const REFLEXIVITY_DENOMINATOR: f64 = 2.0;
/// Novel tokens needed for a full emergence score.
const EMERGENCE_DENOMINATOR: f64 = 5.0;
/// Tokens this short or shorter never count as novel.
const MIN_NOVEL_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone)]
pub struct GenerativityScorer {
    phrases: Vec<String>,
}

impl Default for GenerativityScorer {
    fn default() -> Self {
        Self::with_phrases(REFLEXIVE_PHRASES.iter().copied())
    }
}

impl GenerativityScorer {
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Score `response` against the offering's `intent` and the names
    /// already present in the graph.
    pub fn score<'a, I>(&self, response: &str, intent: &str, entity_names: I) -> GenerativityScore
    where
        I: IntoIterator<Item = &'a str>,
    {
        GenerativityScore::from_parts(
            self.unpredictability(response, intent),
            self.reflexivity(response),
            self.emergence(response, entity_names),
        )
    }

    /// 1 minus the fraction of intent keywords that reappear as words of the response.
    pub fn unpredictability(&self, response: &str, intent: &str) -> f64 {
        let keywords = words(intent);
        if keywords.is_empty() {
            return 1.0;
        }
        let said: HashSet<String> = words(response).into_iter().collect();
        let overlap = keywords.iter().filter(|k| said.contains(*k)).count();
        (1.0 - overlap as f64 / keywords.len() as f64).max(0.0)
    }

    /// Distinct reflexive phrases present, normalised and capped at 1.
    pub fn reflexivity(&self, response: &str) -> f64 {
        let lower = response.to_lowercase();
        let found = self.phrases.iter().filter(|p| lower.contains(p.as_str())).count();
        (found as f64 / REFLEXIVITY_DENOMINATOR).min(1.0)
    }

    /// Distinct alphanumeric response tokens longer than three characters
    /// that are not entity names, normalised and capped at 1.
    pub fn emergence<'a, I>(&self, response: &str, entity_names: I) -> f64
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: HashSet<&str> = entity_names.into_iter().collect();
        let novel: HashSet<&str> = response
            .split_whitespace()
            .filter(|w| w.chars().all(char::is_alphanumeric))
            .filter(|w| w.chars().count() > MIN_NOVEL_TOKEN_CHARS)
            .filter(|w| !known.contains(w))
            .collect();
        (novel.len() as f64 / EMERGENCE_DENOMINATOR).min(1.0)
    }
}

/// Lower-cased alphanumeric words, in order, duplicates kept.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
