//! Exploration/exploitation policies over scored candidates.

use rand::{Rng, RngCore};

use crate::adaptive::types::{ExerciseCandidate, SelectionMode};

/// Picks one candidate index; `None` only for an empty slice.
pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select(
        &self,
        candidates: &[ExerciseCandidate],
        rng: &mut dyn RngCore,
    ) -> Option<(usize, SelectionMode)>;
}

/// Index of the highest final score. Ties keep the earliest candidate.
pub fn best_index(candidates: &[ExerciseCandidate]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let score = candidate.final_composite_score;
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl SelectionStrategy for EpsilonGreedy {
    fn name(&self) -> &'static str {
        "epsilon_greedy"
    }

    fn select(
        &self,
        candidates: &[ExerciseCandidate],
        rng: &mut dyn RngCore,
    ) -> Option<(usize, SelectionMode)> {
        if candidates.is_empty() {
            return None;
        }
        if rng.gen::<f64>() < self.epsilon {
            let idx = rng.gen_range(0..candidates.len());
            return Some((idx, SelectionMode::Explore));
        }
        best_index(candidates).map(|idx| (idx, SelectionMode::Exploit))
    }
}

/// Boltzmann sampling over final scores.
///
/// Low temperatures approach greedy, high temperatures approach uniform.
#[derive(Debug, Clone)]
pub struct SoftmaxStrategy {
    temperature: f64,
}

impl SoftmaxStrategy {
    pub fn new(temperature: f64) -> Self {
        Self {
            temperature: if temperature.is_finite() && temperature > 0.0 {
                temperature
            } else {
                1.0
            },
        }
    }
}

impl SelectionStrategy for SoftmaxStrategy {
    fn name(&self) -> &'static str {
        "softmax"
    }

    fn select(
        &self,
        candidates: &[ExerciseCandidate],
        rng: &mut dyn RngCore,
    ) -> Option<(usize, SelectionMode)> {
        let best = best_index(candidates)?;
        let top = candidates[best].final_composite_score;

        // 减去最大值防止 exp 溢出
        let weights: Vec<f64> = candidates
            .iter()
            .map(|c| ((c.final_composite_score - top) / self.temperature).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Some((best, SelectionMode::Exploit));
        }

        let mut target = rng.gen::<f64>() * total;
        let mut chosen = candidates.len() - 1;
        for (idx, weight) in weights.iter().enumerate() {
            if target < *weight {
                chosen = idx;
                break;
            }
            target -= weight;
        }

        let mode = if chosen == best {
            SelectionMode::Exploit
        } else {
            SelectionMode::Explore
        };
        Some((chosen, mode))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::adaptive::complexity::length_fallback;
    use crate::adaptive::types::ExerciseType;

    fn scored(score: f64) -> ExerciseCandidate {
        ExerciseCandidate {
            word_text: "casa".to_string(),
            exercise_type: ExerciseType::McqDefinition,
            word_complexity_score: 2.0,
            complexity_metrics: length_fallback("casa"),
            difficulty: 5.0,
            learning_efficiency: 0.0,
            engagement_factor: 0.0,
            frustration_risk: 0.0,
            final_composite_score: score,
        }
    }

    #[test]
    fn greedy_picks_first_maximum() {
        let candidates = vec![scored(0.2), scored(0.7), scored(0.7), scored(0.1)];
        assert_eq!(best_index(&candidates), Some(1));
        assert_eq!(best_index(&[]), None);

        let strategy = EpsilonGreedy::new(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(
                strategy.select(&candidates, &mut rng),
                Some((1, SelectionMode::Exploit))
            );
        }
    }

    #[test]
    fn full_exploration_reaches_every_candidate() {
        let candidates = vec![scored(0.9), scored(0.1), scored(0.2)];
        let strategy = EpsilonGreedy::new(1.0);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let (idx, mode) = strategy.select(&candidates, &mut rng).unwrap();
            assert_eq!(mode, SelectionMode::Explore);
            seen[idx] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn full_exploration_is_uniform() {
        let candidates = vec![scored(0.9), scored(0.1), scored(0.5), scored(0.3), scored(0.7)];
        let strategy = EpsilonGreedy::new(1.0);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut counts = [0usize; 5];
        for _ in 0..50_000 {
            let (idx, mode) = strategy.select(&candidates, &mut rng).unwrap();
            assert_eq!(mode, SelectionMode::Explore);
            counts[idx] += 1;
        }
        // 期望每项 10_000，容差 ±5%
        for count in counts {
            assert!((9_500..=10_500).contains(&count), "counts = {counts:?}");
        }
    }

    #[test]
    fn exploration_rate_tracks_epsilon() {
        let candidates = vec![scored(0.2), scored(0.8), scored(0.4)];
        let strategy = EpsilonGreedy::new(0.25);
        let mut rng = StdRng::seed_from_u64(77);
        let explored = (0..40_000)
            .filter(|_| {
                matches!(
                    strategy.select(&candidates, &mut rng),
                    Some((_, SelectionMode::Explore))
                )
            })
            .count();
        let rate = explored as f64 / 40_000.0;
        assert!((rate - 0.25).abs() < 0.015, "rate = {rate}");
    }

    #[test]
    fn empty_candidates_yield_none() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(EpsilonGreedy::new(0.5).select(&[], &mut rng).is_none());
        assert!(SoftmaxStrategy::new(1.0).select(&[], &mut rng).is_none());
    }

    #[test]
    fn cold_softmax_is_greedy() {
        let candidates = vec![scored(0.1), scored(0.9), scored(0.3)];
        let strategy = SoftmaxStrategy::new(0.001);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(
                strategy.select(&candidates, &mut rng),
                Some((1, SelectionMode::Exploit))
            );
        }
    }
}
