use serde::{Deserialize, Serialize};

use crate::adaptive::types::ExerciseType;

/// One value per exercise modality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseTypeTable {
    pub mcq_definition: f64,
    pub dictation: f64,
    pub mcq_image: f64,
    pub define_word: f64,
    pub complete_sentence: f64,
}

impl ExerciseTypeTable {
    pub fn get(&self, exercise_type: ExerciseType) -> f64 {
        match exercise_type {
            ExerciseType::McqDefinition => self.mcq_definition,
            ExerciseType::Dictation => self.dictation,
            ExerciseType::McqImage => self.mcq_image,
            ExerciseType::DefineWord => self.define_word,
            ExerciseType::CompleteSentence => self.complete_sentence,
        }
    }

    fn values(&self) -> [f64; 5] {
        [
            self.mcq_definition,
            self.dictation,
            self.mcq_image,
            self.define_word,
            self.complete_sentence,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningEfficiencyWeights {
    pub challenge: f64,
    pub spacing: f64,
    pub transfer: f64,
}

impl Default for LearningEfficiencyWeights {
    fn default() -> Self {
        Self {
            challenge: 0.5,
            spacing: 0.3,
            transfer: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementWeights {
    pub novelty: f64,
    pub interest: f64,
    pub achievement: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            novelty: 0.4,
            interest: 0.4,
            achievement: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrustrationWeights {
    pub failures: f64,
    pub jump: f64,
    pub fatigue: f64,
    #[serde(default)]
    pub error_pattern: f64,
}

impl Default for FrustrationWeights {
    fn default() -> Self {
        Self {
            failures: 0.4,
            jump: 0.4,
            fatigue: 0.2,
            error_pattern: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub learning_efficiency: LearningEfficiencyWeights,
    pub engagement: EngagementWeights,
    pub frustration: FrustrationWeights,
}

/// `final = LE*le + EF*ef - FR*fr`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationWeights {
    pub learning_efficiency: f64,
    pub engagement: f64,
    pub frustration: f64,
}

impl Default for CombinationWeights {
    fn default() -> Self {
        Self {
            learning_efficiency: 0.4,
            engagement: 0.4,
            frustration: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionConfig {
    pub epsilon: f64,
    pub pool_target: usize,
    /// 短期表现统计所取的最近进度条数
    pub short_term_history: usize,
    pub master_word_sample_limit: usize,
    pub recent_attempt_window: usize,
    pub fatigue_window_minutes: i64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            pool_target: 5,
            short_term_history: 5,
            master_word_sample_limit: 50,
            recent_attempt_window: 10,
            fatigue_window_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReinforcementConfig {
    pub interval_hours: f64,
    /// accuracy >= threshold counts as a correct attempt everywhere
    pub correct_threshold: f64,
}

impl Default for ReinforcementConfig {
    fn default() -> Self {
        Self {
            interval_hours: 72.0,
            correct_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyConfig {
    pub base: ExerciseTypeTable,
    pub complexity_factor: f64,
    /// 引入新词时假定的练习基准难度
    pub introductory_baseline: f64,
    pub proximal_zone_low: f64,
    pub proximal_zone_high: f64,
    pub min_band_width: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base: ExerciseTypeTable {
                mcq_definition: 4.0,
                dictation: 6.0,
                mcq_image: 3.0,
                define_word: 8.0,
                complete_sentence: 7.0,
            },
            complexity_factor: 0.5,
            introductory_baseline: 4.0,
            proximal_zone_low: 0.2,
            proximal_zone_high: 0.8,
            min_band_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfig {
    pub type_impact: ExerciseTypeTable,
    pub base_expected_time_secs: f64,
    pub min_expected_time_secs: f64,
    pub domain_expertise_rate: f64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            type_impact: ExerciseTypeTable {
                mcq_definition: 0.15,
                dictation: 0.2,
                mcq_image: 0.1,
                define_word: 0.25,
                complete_sentence: 0.2,
            },
            base_expected_time_secs: 15.0,
            min_expected_time_secs: 5.0,
            domain_expertise_rate: 0.01,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveConfig {
    pub scoring: ScoringWeights,
    pub combination: CombinationWeights,
    pub selection: SelectionConfig,
    pub reinforcement: ReinforcementConfig,
    pub difficulty: DifficultyConfig,
    pub update: UpdateConfig,
}

impl AdaptiveConfig {
    pub fn from_env(env_config: &crate::config::EngineEnvConfig) -> Self {
        let mut config = Self::default();
        config.selection.epsilon = env_config.epsilon;
        config.selection.pool_target = env_config.pool_target;
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        let s = &self.scoring;
        let weights = [
            ("scoring.learningEfficiency.challenge", s.learning_efficiency.challenge),
            ("scoring.learningEfficiency.spacing", s.learning_efficiency.spacing),
            ("scoring.learningEfficiency.transfer", s.learning_efficiency.transfer),
            ("scoring.engagement.novelty", s.engagement.novelty),
            ("scoring.engagement.interest", s.engagement.interest),
            ("scoring.engagement.achievement", s.engagement.achievement),
            ("scoring.frustration.failures", s.frustration.failures),
            ("scoring.frustration.jump", s.frustration.jump),
            ("scoring.frustration.fatigue", s.frustration.fatigue),
            ("scoring.frustration.errorPattern", s.frustration.error_pattern),
            ("combination.learningEfficiency", self.combination.learning_efficiency),
            ("combination.engagement", self.combination.engagement),
            ("combination.frustration", self.combination.frustration),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number"));
            }
        }

        if !(0.0..=1.0).contains(&self.selection.epsilon) {
            return Err("selection.epsilon must be in [0,1]".to_string());
        }
        if self.selection.pool_target == 0 {
            return Err("selection.poolTarget must be >= 1".to_string());
        }
        if self.selection.recent_attempt_window == 0 {
            return Err("selection.recentAttemptWindow must be >= 1".to_string());
        }
        if self.selection.fatigue_window_minutes <= 0 {
            return Err("selection.fatigueWindowMinutes must be > 0".to_string());
        }
        if self.reinforcement.interval_hours <= 0.0 {
            return Err("reinforcement.intervalHours must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.reinforcement.correct_threshold) {
            return Err("reinforcement.correctThreshold must be in [0,1]".to_string());
        }

        let d = &self.difficulty;
        if d.proximal_zone_low > d.proximal_zone_high {
            return Err("difficulty.proximalZoneLow must not exceed proximalZoneHigh".to_string());
        }
        if d.complexity_factor < 0.0 || d.min_band_width < 0.0 {
            return Err("difficulty factors must be non-negative".to_string());
        }
        if d.base.values().iter().any(|v| !(0.0..=10.0).contains(v)) {
            return Err("difficulty.base values must be in [0,10]".to_string());
        }

        let u = &self.update;
        if u.type_impact.values().iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err("update.typeImpact values must be in [0,1]".to_string());
        }
        if u.min_expected_time_secs <= 0.0 || u.base_expected_time_secs <= 0.0 {
            return Err("update expected times must be > 0".to_string());
        }
        Ok(())
    }
}
