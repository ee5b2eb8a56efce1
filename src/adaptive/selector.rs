//! Word pool construction and candidate expansion.
//!
//! The pool holds previously attempted words that need reinforcement, topped
//! up with unseen master words whose complexity suits the learner.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::adaptive::complexity::WordComplexityMetrics;
use crate::adaptive::config::{AdaptiveConfig, DifficultyConfig, ReinforcementConfig};
use crate::adaptive::scoring::{LearnerSnapshot, ScoringService};
use crate::adaptive::types::{ExerciseCandidate, ExerciseType};
use crate::store::operations::master_words::MasterWord;
use crate::store::operations::progress::UserProgress;

/// Whether one (word, type) pair is due for practice.
///
/// Missing or empty progress counts as due.
pub fn needs_reinforcement(
    progress: Option<&UserProgress>,
    now: DateTime<Utc>,
    config: &ReinforcementConfig,
) -> bool {
    let Some(progress) = progress else {
        return true;
    };
    let Some(accuracy) = progress.accuracy() else {
        return true;
    };
    if accuracy < config.correct_threshold {
        return true;
    }
    let elapsed_hours =
        (now - progress.last_seen_on_word).num_milliseconds() as f64 / 3_600_000.0;
    elapsed_hours > config.interval_hours
}

pub type ProgressIndex<'a> = HashMap<(&'a str, ExerciseType), &'a UserProgress>;

pub fn index_progress(history: &[UserProgress]) -> ProgressIndex<'_> {
    history
        .iter()
        .map(|p| ((p.word_text.as_str(), p.exercise_type), p))
        .collect()
}

/// Attempted words with at least one exercise type due, in alphabetical order.
pub fn reinforcement_pool(
    history: &[UserProgress],
    now: DateTime<Utc>,
    config: &ReinforcementConfig,
) -> Vec<String> {
    let index = index_progress(history);
    let attempted: BTreeSet<&str> = history.iter().map(|p| p.word_text.as_str()).collect();

    attempted
        .into_iter()
        .filter(|word| {
            ExerciseType::ALL
                .iter()
                .any(|t| needs_reinforcement(index.get(&(*word, *t)).copied(), now, config))
        })
        .map(str::to_string)
        .collect()
}

/// Composite-score band `[min, max]` for introducing new words.
///
/// Inverts `difficulty = baseline + factor * complexity` over the proximal
/// zone, clamps to [0,10], then widens inside [0,10] so sparse pools still match.
pub fn new_word_band(ability: f64, config: &DifficultyConfig) -> (f64, f64) {
    let factor = if config.complexity_factor > 0.0 {
        config.complexity_factor
    } else {
        1.0
    };
    let to_complexity =
        |offset: f64| ((ability + offset - config.introductory_baseline) / factor).clamp(0.0, 10.0);

    let mut min = to_complexity(config.proximal_zone_low);
    let mut max = to_complexity(config.proximal_zone_high);
    let width = config.min_band_width.min(10.0);
    if max - min < width {
        let centre = (min + max) / 2.0;
        min = centre - width / 2.0;
        max = centre + width / 2.0;
        if min < 0.0 {
            max -= min;
            min = 0.0;
        }
        if max > 10.0 {
            min -= max - 10.0;
            max = 10.0;
        }
    }
    (min, max)
}

/// Randomly draws up to `needed` master words the learner has never attempted.
pub fn sample_new_words<R: Rng + ?Sized>(
    masters: &[MasterWord],
    attempted: &HashSet<&str>,
    needed: usize,
    rng: &mut R,
) -> Vec<String> {
    let fresh: Vec<&MasterWord> = masters
        .iter()
        .filter(|m| !attempted.contains(m.text.as_str()))
        .collect();
    fresh
        .choose_multiple(rng, needed)
        .map(|m| m.text.clone())
        .collect()
}

pub fn candidate_difficulty(
    exercise_type: ExerciseType,
    complexity: f64,
    config: &DifficultyConfig,
) -> f64 {
    config.base.get(exercise_type) + complexity * config.complexity_factor
}

/// Unscored candidate for one (word, type) pair.
pub fn build_candidate(
    word: &str,
    exercise_type: ExerciseType,
    metrics: &WordComplexityMetrics,
    config: &DifficultyConfig,
) -> ExerciseCandidate {
    ExerciseCandidate {
        word_text: word.to_string(),
        exercise_type,
        word_complexity_score: metrics.composite_score,
        complexity_metrics: metrics.clone(),
        difficulty: candidate_difficulty(exercise_type, metrics.composite_score, config),
        learning_efficiency: 0.0,
        engagement_factor: 0.0,
        frustration_risk: 0.0,
        final_composite_score: 0.0,
    }
}

/// Builds and scores one candidate per exercise type for a word.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    difficulty: DifficultyConfig,
    scoring: ScoringService,
}

impl CandidateGenerator {
    pub fn new(config: &AdaptiveConfig) -> Self {
        Self {
            difficulty: config.difficulty.clone(),
            scoring: ScoringService::new(config),
        }
    }

    pub fn candidate(
        &self,
        word: &str,
        exercise_type: ExerciseType,
        metrics: &WordComplexityMetrics,
    ) -> ExerciseCandidate {
        build_candidate(word, exercise_type, metrics, &self.difficulty)
    }

    pub fn expand(
        &self,
        word: &str,
        metrics: &WordComplexityMetrics,
        learner: &LearnerSnapshot<'_>,
        progress: &ProgressIndex<'_>,
    ) -> Vec<ExerciseCandidate> {
        ExerciseType::ALL
            .iter()
            .map(|&exercise_type| {
                let mut candidate = self.candidate(word, exercise_type, metrics);
                let word_progress = progress.get(&(word, exercise_type)).copied();
                let scores = self.scoring.score(&candidate, learner, word_progress);
                candidate.learning_efficiency = scores.learning_efficiency;
                candidate.engagement_factor = scores.engagement_factor;
                candidate.frustration_risk = scores.frustration_risk;
                candidate.final_composite_score = scores.final_composite_score;
                candidate
            })
            .collect()
    }
}
