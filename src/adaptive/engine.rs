use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;

use crate::adaptive::config::AdaptiveConfig;
use crate::adaptive::scoring::LearnerSnapshot;
use crate::adaptive::selector::{
    index_progress, new_word_band, reinforcement_pool, sample_new_words, CandidateGenerator,
};
use crate::adaptive::strategy::{EpsilonGreedy, SelectionStrategy};
use crate::adaptive::types::{
    ExerciseCandidate, ExerciseSubmission, ProgressReport, SelectionOutcome, SubmissionAck,
    TrendPoint,
};
use crate::adaptive::update::{apply_progress, update_cognitive_state};
use crate::constants::USER_LOCK_PRUNE_THRESHOLD;
use crate::response::AppError;
use crate::services::word_info::WordInfoService;
use crate::store::operations::attempts::AttemptRecord;
use crate::store::operations::cognitive_states::{CognitiveStateUpdate, UserCognitiveState};
use crate::store::operations::progress::UserProgress;
use crate::store::Store;
use crate::validation::validate_word_text;

const MSG_SELECTED: &str = "Exercício selecionado.";
const MSG_NO_WORDS: &str = "Nenhuma palavra disponível para praticar no momento.";
const MSG_NO_CANDIDATES: &str = "Não foi possível montar exercícios para as palavras disponíveis.";
const MSG_PROGRESS_UPDATED: &str = "Progresso atualizado.";
const MSG_REPORT_READY: &str = "Relatório de progresso gerado.";
const MSG_REPORT_EMPTY: &str = "Nenhum progresso registrado ainda.";

pub struct ExerciseEngine {
    config: AdaptiveConfig,
    store: Arc<Store>,
    word_info: Arc<WordInfoService>,
    generator: CandidateGenerator,
    strategy: Box<dyn SelectionStrategy>,
    rng: std::sync::Mutex<StdRng>,
    user_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ExerciseEngine {
    pub fn new(config: AdaptiveConfig, store: Arc<Store>, word_info: Arc<WordInfoService>) -> Self {
        let strategy = Box::new(EpsilonGreedy::new(config.selection.epsilon));
        Self {
            generator: CandidateGenerator::new(&config),
            config,
            store,
            word_info,
            strategy,
            rng: std::sync::Mutex::new(StdRng::from_entropy()),
            user_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_strategy(mut self, strategy: Box<dyn SelectionStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Deterministic sampling and exploration, for tests.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: std::sync::Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    async fn acquire_user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;

        // strong_count == 1 表示只有表本身持有，锁已空闲
        if locks.len() > USER_LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, v| Arc::strong_count(v) > 1);
        }

        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// The rng guard never crosses an await point.
    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    fn load_or_create_state(&self, user_id: &str) -> Result<UserCognitiveState, AppError> {
        match self.store.get_cognitive_state(user_id)? {
            Some(state) => Ok(state),
            None => Ok(self.store.create_initial_cognitive_state(user_id)?),
        }
    }

    pub async fn select_next_exercise(&self, user_id: &str) -> Result<SelectionOutcome, AppError> {
        let sel = &self.config.selection;
        let state = self.load_or_create_state(user_id)?;
        let history = self.store.list_progress(user_id, None)?;
        let short_term = self
            .store
            .list_progress(user_id, Some(sel.short_term_history))?;
        let recent_attempts = self
            .store
            .list_recent_attempts(user_id, sel.recent_attempt_window)?;
        let now = Utc::now();

        let mut pool = reinforcement_pool(&history, now, &self.config.reinforcement);
        let reinforcement_count = pool.len();

        if pool.len() < sel.pool_target {
            let (min, max) = new_word_band(state.vocabular_ability, &self.config.difficulty);
            let attempted: HashSet<&str> = history.iter().map(|p| p.word_text.as_str()).collect();
            let masters = self.store.list_master_words_excluding(
                min,
                max,
                sel.master_word_sample_limit,
                &attempted,
            )?;
            let needed = sel.pool_target - pool.len();
            let fresh =
                self.with_rng(|rng| sample_new_words(&masters, &attempted, needed, rng));
            tracing::debug!(
                user_id,
                band_min = min,
                band_max = max,
                in_band = masters.len(),
                added = fresh.len(),
                "Pool topped up with new words"
            );
            pool.extend(fresh);
        }

        if pool.is_empty() {
            tracing::info!(user_id, "No words available for selection");
            return Ok(SelectionOutcome::none(MSG_NO_WORDS));
        }

        let learner = LearnerSnapshot {
            state: &state,
            history: &history,
            recent_attempts: &recent_attempts,
            now,
        };
        let progress_index = index_progress(&history);

        let mut candidates: Vec<ExerciseCandidate> = Vec::new();
        for word in &pool {
            let Some(metrics) = self.word_info.complexity_for(word).await else {
                tracing::warn!(user_id, word = %word, "No complexity info, word skipped");
                continue;
            };
            candidates.extend(
                self.generator
                    .expand(word, &metrics, &learner, &progress_index),
            );
        }

        let Some((idx, mode)) = self.with_rng(|rng| self.strategy.select(&candidates, rng)) else {
            tracing::info!(user_id, pool = pool.len(), "No candidates could be built");
            return Ok(SelectionOutcome::none(MSG_NO_CANDIDATES));
        };
        let chosen = candidates[idx].clone();

        tracing::info!(
            user_id,
            word = %chosen.word_text,
            exercise_type = %chosen.exercise_type,
            score = chosen.final_composite_score,
            mode = ?mode,
            strategy = self.strategy.name(),
            reinforcement = reinforcement_count,
            pool = pool.len(),
            candidates = candidates.len(),
            short_term_accuracy = short_term_accuracy(&short_term),
            "Exercise selected"
        );

        Ok(SelectionOutcome {
            candidate: Some(chosen),
            mode: Some(mode),
            candidates_considered: candidates.len(),
            message: MSG_SELECTED.to_string(),
        })
    }

    /// Scores one word across every exercise type without touching the pool.
    pub async fn candidates_for_word(
        &self,
        user_id: &str,
        word: &str,
    ) -> Result<Vec<ExerciseCandidate>, AppError> {
        let normalized = validate_word_text(word)
            .map_err(|msg| AppError::bad_request("INVALID_WORD", msg))?;
        let state = self.load_or_create_state(user_id)?;
        let history = self.store.list_progress(user_id, None)?;
        let recent_attempts = self
            .store
            .list_recent_attempts(user_id, self.config.selection.recent_attempt_window)?;
        let Some(metrics) = self.word_info.complexity_for(&normalized).await else {
            return Ok(Vec::new());
        };

        let learner = LearnerSnapshot {
            state: &state,
            history: &history,
            recent_attempts: &recent_attempts,
            now: Utc::now(),
        };
        Ok(self
            .generator
            .expand(&normalized, &metrics, &learner, &index_progress(&history)))
    }

    pub async fn submit_exercise_result(
        &self,
        user_id: &str,
        submission: &ExerciseSubmission,
    ) -> Result<SubmissionAck, AppError> {
        submission
            .validate()
            .map_err(|msg| AppError::bad_request("INVALID_SUBMISSION", msg))?;
        let word = validate_word_text(&submission.word_text)
            .map_err(|msg| AppError::bad_request("INVALID_WORD", msg))?;
        let submission = ExerciseSubmission {
            word_text: word.clone(),
            ..submission.clone()
        };

        let user_lock = self.acquire_user_lock(user_id).await;
        let _guard = user_lock.lock().await;

        let state = self.load_or_create_state(user_id)?;
        let metrics = self
            .word_info
            .complexity_for(&word)
            .await
            .ok_or_else(|| AppError::bad_request("INVALID_WORD", "Palavra inválida"))?;
        let candidate = self
            .generator
            .candidate(&word, submission.exercise_type, &metrics);

        let now = Utc::now();
        let threshold = self.config.reinforcement.correct_threshold;
        let previous = self
            .store
            .get_progress(user_id, &word, submission.exercise_type)?;
        let progress = apply_progress(previous.as_ref(), user_id, &submission, now, threshold);
        let next = update_cognitive_state(&state, &candidate, &submission, &self.config.update);

        // 聚合与状态同一事务提交；尝试日志只影响近期风险估计，写入失败不回滚
        let cognitive_state = self
            .store
            .commit_submission(&progress, &CognitiveStateUpdate::from_state(&next))?
            .ok_or_else(|| AppError::internal("cognitive state vanished during update"))?;

        if let Err(e) = self.store.append_attempt(&AttemptRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            word_text: word.clone(),
            exercise_type: submission.exercise_type,
            accuracy: submission.accuracy,
            is_correct: submission.accuracy >= threshold,
            time_taken_seconds: submission.time_taken_seconds,
            created_at: now,
        }) {
            tracing::warn!(user_id, word = %word, error = %e, "Attempt log write failed");
        }

        tracing::info!(
            user_id,
            word = %word,
            exercise_type = %submission.exercise_type,
            accuracy = submission.accuracy,
            ability_before = state.vocabular_ability,
            ability_after = cognitive_state.vocabular_ability,
            "Submission applied"
        );

        Ok(SubmissionAck {
            progress,
            cognitive_state,
            message: MSG_PROGRESS_UPDATED.to_string(),
        })
    }

    pub fn progress_report(&self, user_id: &str) -> Result<ProgressReport, AppError> {
        let records = self.store.list_progress(user_id, None)?;
        Ok(build_progress_report(&records))
    }
}

fn short_term_accuracy(records: &[UserProgress]) -> Option<f64> {
    let (correct, total) = records.iter().fold((0u64, 0u64), |(c, t), p| {
        (c + p.correct_attempts as u64, t + p.total_attempts as u64)
    });
    (total > 0).then(|| correct as f64 / total as f64)
}

/// Aggregates progress records, oldest first, into a report with one trend
/// point per record.
pub fn build_progress_report(records: &[UserProgress]) -> ProgressReport {
    if records.is_empty() {
        return ProgressReport {
            unique_words_attempted: 0,
            total_attempts: 0,
            overall_accuracy: 0.0,
            average_time_seconds: 0.0,
            trend: Vec::new(),
            message: MSG_REPORT_EMPTY.to_string(),
        };
    }

    let mut correct = 0u64;
    let mut total = 0u64;
    let mut time_sum = 0.0;
    let mut timed_records = 0usize;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut trend = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        if record.total_attempts > 0 {
            correct += record.correct_attempts as u64;
            total += record.total_attempts as u64;
            time_sum += record.average_time_seconds;
            timed_records += 1;
        }
        seen.insert(record.word_text.as_str());
        trend.push(TrendPoint {
            index,
            accuracy: record.accuracy().unwrap_or(0.0),
            cumulative_unique_words: seen.len(),
        });
    }

    ProgressReport {
        unique_words_attempted: seen.len(),
        total_attempts: total,
        overall_accuracy: if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        },
        average_time_seconds: if timed_records > 0 {
            time_sum / timed_records as f64
        } else {
            0.0
        },
        trend,
        message: MSG_REPORT_READY.to_string(),
    }
}
