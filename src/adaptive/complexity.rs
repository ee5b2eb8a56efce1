//! Word complexity estimation.
//!
//! Every sub-metric lands on a 0-10 scale; the composite is a fixed-weight
//! blend of the five. `ComplexityAnalyzer::analyze` never fails: internal
//! errors degrade to a length-based estimate.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const PREFIXES: &[&str] = &[
    "pre", "anti", "super", "inter", "trans", "contra", "re", "des", "in", "im",
];

const SUFFIXES: &[&str] = &[
    "ção", "ismo", "ista", "mente", "dade", "ável", "ível", "oso", "izar", "ecer",
];

const CONCRETE_MARKERS: &[&str] = &[
    "objeto",
    "coisa",
    "lugar",
    "pessoa",
    "animal",
    "parte",
    "ferramenta",
    "comida",
    "corpo",
];

const ABSTRACT_MARKERS: &[&str] = &[
    "conceito",
    "ideia",
    "sentimento",
    "qualidade",
    "estado",
    "processo",
    "sistema",
    "propriedade",
    "característica",
    "princípio",
    "teoria",
    "emoção",
    "relação",
];

const VOWELS: &str = "aeiouyáéíóúàâêôãõü";

pub const EASY_UPPER_BOUND: f64 = 3.5;
pub const MEDIUM_UPPER_BOUND: f64 = 7.0;

const NEUTRAL_SEMANTIC: f64 = 5.0;
const NEUTRAL_DEFINITION: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordComplexityMetrics {
    pub lexical_length: u32,
    pub syllabic_complexity: u32,
    pub morphological_density: f64,
    pub semantic_abstraction: f64,
    pub definition_complexity: f64,
    pub composite_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyLevel {
    #[serde(rename = "fácil")]
    Easy,
    #[serde(rename = "média")]
    Medium,
    #[serde(rename = "difícil")]
    Hard,
}

impl DifficultyLevel {
    pub fn from_score(composite: f64) -> Self {
        if composite < EASY_UPPER_BOUND {
            Self::Easy
        } else if composite < MEDIUM_UPPER_BOUND {
            Self::Medium
        } else {
            Self::Hard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "fácil",
            Self::Medium => "média",
            Self::Hard => "difícil",
        }
    }
}

pub fn difficulty_level(metrics: &WordComplexityMetrics) -> DifficultyLevel {
    DifficultyLevel::from_score(metrics.composite_score)
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ComplexityError {
    #[error("word text is empty")]
    EmptyWord,
    #[error("text has no readable words")]
    NoReadableWords,
    #[error("metric {metric} produced a non-finite value")]
    NonFinite { metric: &'static str },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeWeights {
    pub lexical: f64,
    pub syllabic: f64,
    pub morphological: f64,
    pub semantic: f64,
    pub definition: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            lexical: 0.20,
            syllabic: 0.15,
            morphological: 0.25,
            semantic: 0.25,
            definition: 0.15,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComplexityAnalyzer {
    weights: CompositeWeights,
}

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, word: &str, definition: Option<&str>) -> WordComplexityMetrics {
        let word = word.trim();
        match self.try_analyze(word, definition.unwrap_or("").trim()) {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::warn!(word, error = %e, "Complexity analysis failed, using length fallback");
                length_fallback(word)
            }
        }
    }

    pub fn try_analyze(
        &self,
        word: &str,
        definition: &str,
    ) -> Result<WordComplexityMetrics, ComplexityError> {
        if word.is_empty() {
            return Err(ComplexityError::EmptyWord);
        }

        let syllables = count_syllables(word);
        let lexical = lexical_score(word.chars().count());
        let syllabic = syllabic_score(syllables);
        let morphological = morphological_density(word);
        let semantic = semantic_abstraction(word, definition);
        let definition_score = definition_complexity(definition);

        let w = &self.weights;
        let composite = lexical * w.lexical
            + syllabic * w.syllabic
            + morphological * w.morphological
            + semantic * w.semantic
            + definition_score * w.definition;

        for (metric, value) in [
            ("morphological_density", morphological),
            ("semantic_abstraction", semantic),
            ("definition_complexity", definition_score),
            ("composite_score", composite),
        ] {
            if !value.is_finite() {
                return Err(ComplexityError::NonFinite { metric });
            }
        }

        let metrics = WordComplexityMetrics {
            lexical_length: word.chars().count() as u32,
            syllabic_complexity: syllables,
            morphological_density: morphological.clamp(0.0, 10.0),
            semantic_abstraction: semantic.clamp(0.0, 10.0),
            definition_complexity: definition_score.clamp(0.0, 10.0),
            composite_score: composite.clamp(0.0, 10.0),
        };
        tracing::debug!(word, composite = metrics.composite_score, "Word complexity analyzed");
        Ok(metrics)
    }
}

pub fn lexical_score(length: usize) -> f64 {
    match length {
        0 => 0.0,
        1..=3 => 1.0,
        4..=5 => 3.0,
        6..=7 => 5.0,
        8..=9 => 7.0,
        10..=12 => 8.5,
        _ => 10.0,
    }
}

pub fn syllabic_score(syllables: u32) -> f64 {
    match syllables {
        0 | 1 => 1.0,
        2 => 3.0,
        3 => 5.0,
        4 => 7.0,
        5 => 8.5,
        _ => 10.0,
    }
}

/// Counts vowel groups; adjacent vowels are treated as one nucleus.
pub fn count_syllables(word: &str) -> u32 {
    let mut count = 0u32;
    let mut in_vowel_group = false;
    for c in word.chars().flat_map(char::to_lowercase) {
        let is_vowel = VOWELS.contains(c);
        if is_vowel && !in_vowel_group {
            count += 1;
        }
        in_vowel_group = is_vowel;
    }
    if count == 0 && word.chars().any(char::is_alphabetic) {
        1
    } else {
        count
    }
}

/// At most one prefix and one suffix are counted.
pub fn morphological_density(word: &str) -> f64 {
    let lower = word.to_lowercase();
    let prefix = PREFIXES.iter().any(|p| lower.starts_with(p));
    let suffix = SUFFIXES.iter().any(|s| lower.ends_with(s));
    match (prefix as u8) + (suffix as u8) {
        0 => 1.0,
        1 => 5.0,
        _ => 9.0,
    }
}

pub fn semantic_abstraction(word: &str, definition: &str) -> f64 {
    let word_lower = word.to_lowercase();
    let mut score = NEUTRAL_SEMANTIC;

    // abstract marker wins when a word carries both
    if ABSTRACT_MARKERS.iter().any(|m| word_lower.contains(m)) {
        score += 2.5;
    } else if CONCRETE_MARKERS.iter().any(|m| word_lower.contains(m)) {
        score -= 2.5;
    }

    if !definition.is_empty() {
        let def_lower = definition.to_lowercase();
        let abstract_hits = ABSTRACT_MARKERS.iter().filter(|m| def_lower.contains(**m)).count() as f64;
        let concrete_hits = CONCRETE_MARKERS.iter().filter(|m| def_lower.contains(**m)).count() as f64;
        score += (abstract_hits - concrete_hits) * 1.5;
    }

    score.clamp(0.0, 10.0)
}

pub fn definition_complexity(definition: &str) -> f64 {
    if definition.is_empty() {
        return NEUTRAL_DEFINITION;
    }
    match reading_ease(definition) {
        Ok(ease) => ((100.0 - ease) / 10.0).clamp(0.0, 10.0),
        Err(e) => {
            tracing::debug!(error = %e, "Readability unavailable, scoring definition by length");
            definition_length_score(definition.chars().count())
        }
    }
}

fn definition_length_score(length: usize) -> f64 {
    match length {
        0..=49 => 1.5,
        50..=99 => 3.0,
        100..=149 => 5.0,
        150..=249 => 7.0,
        _ => 9.0,
    }
}

/// Flesch reading ease adapted to Portuguese: `248.835 - 1.015*ASL - 84.6*ASW`.
pub fn reading_ease(text: &str) -> Result<f64, ComplexityError> {
    let sentences = text
        .split(['.', '!', '?', ';'])
        .filter(|s| s.chars().any(char::is_alphabetic))
        .count()
        .max(1);

    let words: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphabetic()))
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return Err(ComplexityError::NoReadableWords);
    }

    let syllables: u32 = words.iter().map(|w| count_syllables(w)).sum();
    let asl = words.len() as f64 / sentences as f64;
    let asw = syllables as f64 / words.len() as f64;
    let ease = 248.835 - 1.015 * asl - 84.6 * asw;
    if ease.is_finite() {
        Ok(ease)
    } else {
        Err(ComplexityError::NonFinite {
            metric: "reading_ease",
        })
    }
}

pub fn length_fallback(word: &str) -> WordComplexityMetrics {
    let length = word.chars().count();
    let basic = (length as f64 * 0.8).min(10.0);
    let share = |neutral: f64| if basic > 0.0 { basic / 3.0 } else { neutral };
    let syllables = if length == 0 {
        0
    } else {
        (length as u32 / 3).max(1)
    };

    WordComplexityMetrics {
        lexical_length: length as u32,
        syllabic_complexity: syllables,
        morphological_density: share(1.0),
        semantic_abstraction: share(3.0),
        definition_complexity: share(3.0),
        composite_score: basic,
    }
}

struct CacheInner {
    entries: HashMap<String, WordComplexityMetrics>,
    order: VecDeque<String>,
}

/// Bounded analysis cache keyed by word and definition digest.
/// Eviction drops the oldest inserted key once capacity is exceeded.
pub struct ComplexityCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl ComplexityCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn key(word: &str, definition: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(definition.unwrap_or("").as_bytes());
        format!("{}:{}", word, hex::encode(hasher.finalize()))
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the metrics and whether they came from the cache.
    pub fn get_or_analyze(
        &self,
        analyzer: &ComplexityAnalyzer,
        word: &str,
        definition: Option<&str>,
    ) -> (WordComplexityMetrics, bool) {
        let key = Self::key(word, definition);
        if let Some(hit) = self.lock().entries.get(&key) {
            return (hit.clone(), true);
        }

        // analysis runs outside the lock; a racing insert of the same key is harmless
        let metrics = analyzer.analyze(word, definition);

        let mut inner = self.lock();
        if inner.entries.insert(key.clone(), metrics.clone()).is_none() {
            inner.order.push_back(key);
        }
        while inner.entries.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        (metrics, false)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
