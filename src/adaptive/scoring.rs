//! Multi-factor candidate scoring.
//!
//! Three independent weighted sums: learning efficiency, engagement and
//! frustration risk. Every sub-score is clamped to [0,1] before weighting.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::types::{ExerciseCandidate, ExerciseType};
use crate::store::operations::attempts::AttemptRecord;
use crate::store::operations::cognitive_states::UserCognitiveState;
use crate::store::operations::progress::UserProgress;

const IDEAL_ABSTRACTION: f64 = 6.0;
const FLOAT_SLACK: f64 = 1e-9;

/// Everything the scorer knows about a learner during one selection call.
#[derive(Debug, Clone, Copy)]
pub struct LearnerSnapshot<'a> {
    pub state: &'a UserCognitiveState,
    /// Full progress history, oldest first.
    pub history: &'a [UserProgress],
    /// Most recent attempts, oldest first.
    pub recent_attempts: &'a [AttemptRecord],
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub learning_efficiency: f64,
    pub engagement_factor: f64,
    pub frustration_risk: f64,
    pub final_composite_score: f64,
}

#[derive(Debug, Clone)]
pub struct ScoringService {
    config: AdaptiveConfig,
}

impl ScoringService {
    pub fn new(config: &AdaptiveConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn score(
        &self,
        candidate: &ExerciseCandidate,
        learner: &LearnerSnapshot<'_>,
        word_progress: Option<&UserProgress>,
    ) -> ScoreBreakdown {
        let learning_efficiency = self.learning_efficiency(candidate, learner, word_progress);
        let engagement_factor = self.engagement_factor(candidate, learner);
        let frustration_risk = self.frustration_risk(candidate, learner);

        let c = &self.config.combination;
        let final_composite_score = learning_efficiency * c.learning_efficiency
            + engagement_factor * c.engagement
            - frustration_risk * c.frustration;

        ScoreBreakdown {
            learning_efficiency,
            engagement_factor,
            frustration_risk,
            final_composite_score,
        }
    }

    pub fn learning_efficiency(
        &self,
        candidate: &ExerciseCandidate,
        learner: &LearnerSnapshot<'_>,
        word_progress: Option<&UserProgress>,
    ) -> f64 {
        let w = &self.config.scoring.learning_efficiency;
        let d = &self.config.difficulty;

        let challenge = challenge_score(
            candidate.difficulty,
            learner.state.vocabular_ability,
            d.proximal_zone_low,
            d.proximal_zone_high,
        );
        let spacing = spacing_score(
            word_progress.map(|p| p.last_seen_on_word),
            learner.now,
            self.config.reinforcement.interval_hours,
        );
        let transfer = transfer_score(
            candidate.word_complexity_score,
            learner.state.expertise_in(candidate.exercise_type.as_str()),
        );

        challenge * w.challenge + spacing * w.spacing + transfer * w.transfer
    }

    pub fn engagement_factor(&self, candidate: &ExerciseCandidate, learner: &LearnerSnapshot<'_>) -> f64 {
        let w = &self.config.scoring.engagement;
        let window = self.config.selection.recent_attempt_window;

        let novelty = novelty_score(candidate.exercise_type, learner.recent_attempts, window);
        let interest = interest_score(
            candidate.complexity_metrics.semantic_abstraction,
            candidate.word_complexity_score,
            learner.state.overall_expertise(),
        );
        let achievement = achievement_score(learner.history);

        novelty * w.novelty + interest * w.interest + achievement * w.achievement
    }

    pub fn frustration_risk(&self, candidate: &ExerciseCandidate, learner: &LearnerSnapshot<'_>) -> f64 {
        let w = &self.config.scoring.frustration;
        let sel = &self.config.selection;
        let ability = learner.state.vocabular_ability;

        let failures = failure_risk(learner.recent_attempts);
        let jump = jump_risk(
            candidate.difficulty - ability,
            candidate.complexity_metrics.definition_complexity,
            candidate.complexity_metrics.morphological_density,
            ability,
        );
        let fatigue = fatigue_risk(
            learner.recent_attempts,
            learner.now,
            Duration::minutes(sel.fatigue_window_minutes),
        );
        let error_pattern = error_pattern_risk(learner.recent_attempts);

        failures * w.failures + jump * w.jump + fatigue * w.fatigue + error_pattern * w.error_pattern
    }
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// 1.0 inside the proximal zone `[low, high]` of `difficulty - ability`.
pub fn challenge_score(difficulty: f64, ability: f64, low: f64, high: f64) -> f64 {
    let gap = difficulty - ability;
    let score = if gap >= low - FLOAT_SLACK && gap <= high + FLOAT_SLACK {
        1.0
    } else if gap < low {
        (1.0 - (low - gap) * 1.5).max(0.1)
    } else {
        (1.0 - (gap - high) * 1.0).max(0.3)
    };
    unit(score)
}

/// Rewards returning close to the target interval; 0 for never-seen pairs.
pub fn spacing_score(
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval_hours: f64,
) -> f64 {
    let Some(last_seen) = last_seen else {
        return 0.0;
    };
    let elapsed_hours = (now - last_seen).num_milliseconds().max(0) as f64 / 3_600_000.0;
    let ratio = elapsed_hours / interval_hours;
    let score = if ratio <= 1.0 { ratio } else { 1.0 / ratio };
    unit(score.clamp(0.1, 1.0))
}

/// Best when word complexity sits 1-2 points above the learner's expertise.
pub fn transfer_score(word_complexity: f64, expertise: f64) -> f64 {
    let target_min = expertise + 1.0;
    let target_max = expertise + 2.0;
    let score = if word_complexity < target_min {
        (1.0 - (target_min - word_complexity) * (0.9 / 3.0)).max(0.1)
    } else if word_complexity > target_max {
        (1.0 - (word_complexity - target_max) * (0.7 / 4.0)).max(0.3)
    } else {
        1.0
    };
    unit(score)
}

/// `1 - same_type_count / window` over the last `window` attempts.
pub fn novelty_score(exercise_type: ExerciseType, recent: &[AttemptRecord], window: usize) -> f64 {
    if recent.is_empty() || window == 0 {
        return 1.0;
    }
    let start = recent.len().saturating_sub(window);
    let same = recent[start..]
        .iter()
        .filter(|a| a.exercise_type == exercise_type)
        .count();
    unit(1.0 - same as f64 / window as f64)
}

pub fn interest_score(semantic_abstraction: f64, word_complexity: f64, expertise: f64) -> f64 {
    let max_deviation = IDEAL_ABSTRACTION.max(10.0 - IDEAL_ABSTRACTION);
    let deviation = (semantic_abstraction - IDEAL_ABSTRACTION).abs();
    let mut interest = unit(1.0 - deviation / max_deviation);
    if word_complexity < expertise * 0.5 {
        interest *= 0.5;
    }
    unit(interest)
}

/// Overall historical accuracy; 0.5 without history.
pub fn achievement_score(history: &[UserProgress]) -> f64 {
    let (correct, total) = history.iter().fold((0u64, 0u64), |(c, t), p| {
        (c + p.correct_attempts as u64, t + p.total_attempts as u64)
    });
    if total == 0 {
        0.5
    } else {
        unit(correct as f64 / total as f64)
    }
}

/// Trailing failed attempts divided by 3.
pub fn failure_risk(recent: &[AttemptRecord]) -> f64 {
    let streak = recent.iter().rev().take_while(|a| !a.is_correct).count();
    unit(streak as f64 / 3.0)
}

pub fn jump_risk(
    difficulty_gap: f64,
    syntactic_proxy: f64,
    morphological_density: f64,
    ability: f64,
) -> f64 {
    let from_ability = unit((difficulty_gap - 1.0) / 2.0);

    let mut from_metrics: f64 = 0.0;
    if syntactic_proxy > 8.0 && ability < 5.0 {
        from_metrics += 0.2;
    }
    if morphological_density > 7.0 && ability < 6.0 {
        from_metrics += 0.2;
    }

    from_ability.max(unit(from_metrics))
}

/// Attempts inside the trailing `window` divided by 10.
pub fn fatigue_risk(recent: &[AttemptRecord], now: DateTime<Utc>, window: Duration) -> f64 {
    let since = now - window;
    let count = recent.iter().filter(|a| a.created_at >= since).count();
    unit(count as f64 / 10.0)
}

/// Population variance of recent accuracies, doubled.
pub fn error_pattern_risk(recent: &[AttemptRecord]) -> f64 {
    if recent.len() < 2 {
        return 0.0;
    }
    let n = recent.len() as f64;
    let mean = recent.iter().map(|a| a.accuracy).sum::<f64>() / n;
    let variance = recent.iter().map(|a| (a.accuracy - mean).powi(2)).sum::<f64>() / n;
    unit(variance * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive::complexity::length_fallback;

    fn attempt(exercise_type: ExerciseType, accuracy: f64, minutes_ago: i64, now: DateTime<Utc>) -> AttemptRecord {
        AttemptRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "u1".to_string(),
            word_text: "casa".to_string(),
            exercise_type,
            accuracy,
            is_correct: accuracy >= 0.5,
            time_taken_seconds: 5.0,
            created_at: now - Duration::minutes(minutes_ago),
        }
    }

    fn candidate(difficulty: f64, complexity: f64) -> ExerciseCandidate {
        let mut metrics = length_fallback("casa");
        metrics.composite_score = complexity;
        metrics.semantic_abstraction = 6.0;
        ExerciseCandidate {
            word_text: "casa".to_string(),
            exercise_type: ExerciseType::McqDefinition,
            word_complexity_score: complexity,
            complexity_metrics: metrics,
            difficulty,
            learning_efficiency: 0.0,
            engagement_factor: 0.0,
            frustration_risk: 0.0,
            final_composite_score: 0.0,
        }
    }

    #[test]
    fn challenge_is_maximal_inside_zone_only() {
        assert_eq!(challenge_score(5.2, 5.0, 0.2, 0.8), 1.0);
        assert_eq!(challenge_score(5.8, 5.0, 0.2, 0.8), 1.0);
        assert_eq!(challenge_score(0.5, 0.0, 0.2, 0.8), 1.0);
        assert!(challenge_score(0.19, 0.0, 0.2, 0.8) < 1.0);
        assert!(challenge_score(0.81, 0.0, 0.2, 0.8) < 1.0);
        // floors
        assert_eq!(challenge_score(0.0, 9.0, 0.2, 0.8), 0.1);
        assert_eq!(challenge_score(10.0, 0.0, 0.2, 0.8), 0.3);
    }

    #[test]
    fn spacing_peaks_at_interval() {
        let now = Utc::now();
        assert_eq!(spacing_score(None, now, 72.0), 0.0);
        let at_target = spacing_score(Some(now - Duration::hours(72)), now, 72.0);
        assert!((at_target - 1.0).abs() < 1e-9);
        let half = spacing_score(Some(now - Duration::hours(36)), now, 72.0);
        assert!((half - 0.5).abs() < 1e-9);
        let late = spacing_score(Some(now - Duration::hours(144)), now, 72.0);
        assert!((late - 0.5).abs() < 1e-9);
        // floor for very recent or very stale items
        assert_eq!(spacing_score(Some(now), now, 72.0), 0.1);
    }

    #[test]
    fn transfer_zone_and_floors() {
        assert_eq!(transfer_score(6.5, 5.0), 1.0);
        assert!((transfer_score(5.0, 5.0) - 0.7).abs() < 1e-9);
        assert_eq!(transfer_score(0.0, 9.0), 0.1);
        assert_eq!(transfer_score(10.0, 0.0), 0.3);
    }

    #[test]
    fn novelty_counts_same_type_in_window() {
        let now = Utc::now();
        assert_eq!(novelty_score(ExerciseType::Dictation, &[], 10), 1.0);
        let recent = vec![
            attempt(ExerciseType::Dictation, 1.0, 3, now),
            attempt(ExerciseType::McqImage, 1.0, 2, now),
            attempt(ExerciseType::Dictation, 1.0, 1, now),
        ];
        assert!((novelty_score(ExerciseType::Dictation, &recent, 10) - 0.8).abs() < 1e-9);
        assert_eq!(novelty_score(ExerciseType::DefineWord, &recent, 10), 1.0);
    }

    #[test]
    fn interest_halves_for_too_easy_words() {
        assert_eq!(interest_score(6.0, 5.0, 4.0), 1.0);
        assert_eq!(interest_score(6.0, 1.0, 4.0), 0.5);
        assert_eq!(interest_score(0.0, 5.0, 0.0), 0.0);
    }

    #[test]
    fn achievement_defaults_to_half() {
        assert_eq!(achievement_score(&[]), 0.5);
    }

    #[test]
    fn failures_count_trailing_streak() {
        let now = Utc::now();
        let recent = vec![
            attempt(ExerciseType::Dictation, 0.0, 5, now),
            attempt(ExerciseType::Dictation, 1.0, 4, now),
            attempt(ExerciseType::Dictation, 0.2, 3, now),
            attempt(ExerciseType::Dictation, 0.0, 2, now),
        ];
        assert!((failure_risk(&recent) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(failure_risk(&[]), 0.0);
    }

    #[test]
    fn jump_takes_larger_signal() {
        assert_eq!(jump_risk(0.5, 0.0, 0.0, 5.0), 0.0);
        assert!((jump_risk(2.0, 0.0, 0.0, 5.0) - 0.5).abs() < 1e-9);
        assert!((jump_risk(0.0, 9.0, 9.0, 1.0) - 0.4).abs() < 1e-9);
        assert_eq!(jump_risk(10.0, 9.0, 9.0, 1.0), 1.0);
    }

    #[test]
    fn fatigue_only_counts_window() {
        let now = Utc::now();
        let recent = vec![
            attempt(ExerciseType::Dictation, 1.0, 90, now),
            attempt(ExerciseType::Dictation, 1.0, 20, now),
            attempt(ExerciseType::Dictation, 1.0, 10, now),
        ];
        let risk = fatigue_risk(&recent, now, Duration::minutes(30));
        assert!((risk - 0.2).abs() < 1e-9);
    }

    #[test]
    fn error_pattern_needs_two_points() {
        let now = Utc::now();
        let one = vec![attempt(ExerciseType::Dictation, 0.0, 1, now)];
        assert_eq!(error_pattern_risk(&one), 0.0);
        let two = vec![
            attempt(ExerciseType::Dictation, 0.0, 2, now),
            attempt(ExerciseType::Dictation, 1.0, 1, now),
        ];
        // variance 0.25, doubled
        assert!((error_pattern_risk(&two) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn composite_combines_with_fixed_weights() {
        let service = ScoringService::new(&AdaptiveConfig::default());
        let mut state = UserCognitiveState::initial("u1", Utc::now());
        state.vocabular_ability = 5.0;
        let learner = LearnerSnapshot {
            state: &state,
            history: &[],
            recent_attempts: &[],
            now: Utc::now(),
        };

        let c = candidate(5.5, 6.5);
        let s = service.score(&c, &learner, None);
        // challenge 1.0, spacing 0.0, transfer 1.0
        assert!((s.learning_efficiency - 0.7).abs() < 1e-9);
        // novelty 1.0, interest 1.0, achievement 0.5
        assert!((s.engagement_factor - 0.9).abs() < 1e-9);
        assert_eq!(s.frustration_risk, 0.0);
        assert!((s.final_composite_score - (0.7 * 0.4 + 0.9 * 0.4)).abs() < 1e-9);
    }
}
