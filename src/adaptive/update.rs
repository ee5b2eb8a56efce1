//! Cognitive state and progress updates after a submission.
//!
//! Pure functions: the engine loads, calls these, and persists the result.

use chrono::{DateTime, Utc};

use crate::adaptive::config::UpdateConfig;
use crate::adaptive::types::{ExerciseCandidate, ExerciseSubmission};
use crate::store::operations::cognitive_states::{UserCognitiveState, OVERALL_DOMAIN};
use crate::store::operations::progress::UserProgress;

const ABILITY_MAX: f64 = 10.0;
const SPEED_MAX: f64 = 10.0;
const CONFIDENCE_STEP_LIMIT: f64 = 0.2;
const FATIGUE_TIME_SCALE_SECS: f64 = 30.0;

fn clamp_finite(value: f64, fallback: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback.clamp(min, max)
    }
}

/// Applies one submission to a state. Fields are updated in order, and the
/// confidence step reads the already-updated ability.
pub fn update_cognitive_state(
    state: &UserCognitiveState,
    candidate: &ExerciseCandidate,
    submission: &ExerciseSubmission,
    config: &UpdateConfig,
) -> UserCognitiveState {
    let mut next = state.clone();
    let impact = config.type_impact.get(candidate.exercise_type);
    let accuracy = submission.accuracy;

    let ability_step = ability_adjustment(candidate, accuracy, impact);
    next.vocabular_ability = clamp_finite(
        state.vocabular_ability + ability_step,
        state.vocabular_ability,
        0.0,
        ABILITY_MAX,
    );

    next.processing_speed = updated_speed(
        state.processing_speed,
        candidate.difficulty,
        submission.time_taken_seconds,
        config,
    );

    next.confidence_level = updated_confidence(
        state.confidence_level,
        candidate.difficulty,
        next.vocabular_ability,
        accuracy,
    );

    let time_load = (submission.time_taken_seconds / FATIGUE_TIME_SCALE_SECS).min(1.0);
    let fatigue_step = (time_load * 0.4 + candidate.difficulty / 10.0 * 0.4 + impact * 0.2) * 0.1;
    next.fatigue_factor = clamp_finite(
        state.fatigue_factor + fatigue_step.max(0.0),
        state.fatigue_factor,
        0.0,
        1.0,
    );

    let expertise_step = (accuracy - 0.5)
        * (candidate.word_complexity_score / 10.0)
        * config.domain_expertise_rate;
    for domain in [OVERALL_DOMAIN, candidate.exercise_type.as_str()] {
        let current = next
            .domain_expertise
            .get(domain)
            .copied()
            .unwrap_or(next.vocabular_ability);
        next.domain_expertise.insert(
            domain.to_string(),
            clamp_finite(current + expertise_step, current, 0.0, ABILITY_MAX),
        );
    }

    next
}

fn ability_adjustment(candidate: &ExerciseCandidate, accuracy: f64, impact: f64) -> f64 {
    let metrics = &candidate.complexity_metrics;
    let base = (accuracy - 0.5) * 0.5;
    let complexity_term = if accuracy > 0.75 {
        (metrics.semantic_abstraction / 10.0 * 0.4 + metrics.morphological_density / 10.0 * 0.3)
            * 0.1
    } else if accuracy < 0.25 {
        -(metrics.definition_complexity / 10.0) * 0.05
    } else {
        0.0
    };
    (base + complexity_term) * impact
}

/// Expected time grows with difficulty and with a slower learner.
pub fn expected_time_secs(difficulty: f64, speed: f64, config: &UpdateConfig) -> f64 {
    let base = config.base_expected_time_secs;
    let raw = (base + difficulty / 10.0 * base) * (1.0 + (SPEED_MAX - speed) / SPEED_MAX * 0.5);
    raw.max(config.min_expected_time_secs)
}

fn updated_speed(speed: f64, difficulty: f64, time_taken: f64, config: &UpdateConfig) -> f64 {
    if time_taken <= 0.0 {
        return speed;
    }
    let expected = expected_time_secs(difficulty, speed, config);
    let step = (expected - time_taken) / expected.max(time_taken) * 0.5;
    clamp_finite(speed + step, speed, 0.0, SPEED_MAX)
}

fn updated_confidence(confidence: f64, difficulty: f64, ability: f64, accuracy: f64) -> f64 {
    let perceived = (difficulty - ability).clamp(-5.0, 5.0);
    let normalized = (accuracy - 0.5) * 2.0;
    let step = (normalized * (perceived / 5.0) * 0.05)
        .clamp(-CONFIDENCE_STEP_LIMIT, CONFIDENCE_STEP_LIMIT);
    clamp_finite(confidence + step, confidence, 0.0, 1.0)
}

/// Folds one submission into the (word, type) aggregate.
pub fn apply_progress(
    previous: Option<&UserProgress>,
    user_id: &str,
    submission: &ExerciseSubmission,
    now: DateTime<Utc>,
    correct_threshold: f64,
) -> UserProgress {
    let (correct, total, mean) = previous
        .map(|p| (p.correct_attempts, p.total_attempts, p.average_time_seconds))
        .unwrap_or((0, 0, 0.0));

    let new_total = total.saturating_add(1);
    let is_correct = submission.accuracy >= correct_threshold;
    let new_correct = if is_correct {
        correct.saturating_add(1).min(new_total)
    } else {
        correct.min(new_total)
    };
    let average = (mean * total as f64 + submission.time_taken_seconds) / new_total as f64;

    UserProgress {
        user_id: user_id.to_string(),
        word_text: submission.word_text.clone(),
        exercise_type: submission.exercise_type,
        correct_attempts: new_correct,
        total_attempts: new_total,
        average_time_seconds: average,
        last_seen_on_word: now,
    }
}
