use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adaptive::types::ExerciseType;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// Attempt aggregate for one (user, word, exercise type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub word_text: String,
    pub exercise_type: ExerciseType,
    pub correct_attempts: u32,
    pub total_attempts: u32,
    pub average_time_seconds: f64,
    pub last_seen_on_word: DateTime<Utc>,
}

impl UserProgress {
    /// `None` when no attempt has been counted yet.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_attempts == 0 {
            None
        } else {
            Some(self.correct_attempts as f64 / self.total_attempts as f64)
        }
    }
}

impl Store {
    pub fn get_progress(
        &self,
        user_id: &str,
        word: &str,
        exercise_type: ExerciseType,
    ) -> Result<Option<UserProgress>, StoreError> {
        let key = keys::progress_key(user_id, word, exercise_type.as_str())?;
        match self.progress.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn upsert_progress(&self, progress: &UserProgress) -> Result<UserProgress, StoreError> {
        if progress.correct_attempts > progress.total_attempts {
            return Err(StoreError::Validation(
                "correct_attempts cannot exceed total_attempts".to_string(),
            ));
        }
        let key = keys::progress_key(
            &progress.user_id,
            &progress.word_text,
            progress.exercise_type.as_str(),
        )?;
        self.progress
            .insert(key.as_bytes(), Self::serialize(progress)?)?;
        Ok(progress.clone())
    }

    /// Records ordered by `last_seen_on_word`, oldest first.
    /// With a limit, only the most recent `limit` records are returned.
    pub fn list_progress(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<UserProgress>, StoreError> {
        let prefix = keys::progress_prefix(user_id)?;
        let mut out: Vec<UserProgress> = Vec::new();
        for item in self.progress.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            out.push(Self::deserialize(&value)?);
        }
        out.sort_by(|a, b| a.last_seen_on_word.cmp(&b.last_seen_on_word));

        if let Some(limit) = limit {
            let skip = out.len().saturating_sub(limit);
            out.drain(..skip);
        }
        Ok(out)
    }
}
