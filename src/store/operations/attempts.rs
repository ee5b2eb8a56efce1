use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adaptive::types::ExerciseType;
use crate::constants::MAX_ATTEMPTS_PER_USER;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// One submitted exercise, kept in a bounded per-user log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: String,
    pub user_id: String,
    pub word_text: String,
    pub exercise_type: ExerciseType,
    pub accuracy: f64,
    pub is_correct: bool,
    pub time_taken_seconds: f64,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn append_attempt(&self, attempt: &AttemptRecord) -> Result<(), StoreError> {
        let key = keys::attempt_key(
            &attempt.user_id,
            attempt.created_at.timestamp_millis(),
            &attempt.id,
        )?;
        self.attempts
            .insert(key.as_bytes(), Self::serialize(attempt)?)?;
        self.trim_attempts(&attempt.user_id, MAX_ATTEMPTS_PER_USER)
    }

    /// Keeps the newest `keep` attempts of a user.
    fn trim_attempts(&self, user_id: &str, keep: usize) -> Result<(), StoreError> {
        let prefix = keys::attempt_prefix(user_id)?;
        let mut removed = 0usize;
        for item in self.attempts.scan_prefix(prefix.as_bytes()).skip(keep) {
            let (key, _) = item?;
            self.attempts.remove(key)?;
            removed += 1;
        }
        if removed > 0 {
            tracing::debug!(user_id, removed, "Trimmed attempt log");
        }
        Ok(())
    }

    /// The newest `limit` attempts, returned oldest first.
    pub fn list_recent_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AttemptRecord>, StoreError> {
        let prefix = keys::attempt_prefix(user_id)?;
        let mut out: Vec<AttemptRecord> = Vec::with_capacity(limit);
        for item in self.attempts.scan_prefix(prefix.as_bytes()).take(limit) {
            let (_, value) = item?;
            out.push(Self::deserialize(&value)?);
        }
        out.reverse();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::tempdir;

    use super::*;

    fn attempt(idx: i64, base: DateTime<Utc>) -> AttemptRecord {
        AttemptRecord {
            id: format!("a{idx}"),
            user_id: "u1".to_string(),
            word_text: "casa".to_string(),
            exercise_type: ExerciseType::Dictation,
            accuracy: 1.0,
            is_correct: true,
            time_taken_seconds: 4.0,
            created_at: base + Duration::seconds(idx),
        }
    }

    #[test]
    fn recent_attempts_are_chronological() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let base = Utc::now();
        for idx in 0..5 {
            store.append_attempt(&attempt(idx, base)).unwrap();
        }

        let recent = store.list_recent_attempts("u1", 3).unwrap();
        let ids: Vec<&str> = recent.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a3", "a4"]);
    }

    #[test]
    fn log_is_bounded_per_user() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let base = Utc::now();
        let total = MAX_ATTEMPTS_PER_USER as i64 + 5;
        for idx in 0..total {
            store.append_attempt(&attempt(idx, base)).unwrap();
        }

        let all = store
            .list_recent_attempts("u1", MAX_ATTEMPTS_PER_USER * 2)
            .unwrap();
        assert_eq!(all.len(), MAX_ATTEMPTS_PER_USER);
        assert_eq!(all.last().map(|a| a.id.clone()), Some(format!("a{}", total - 1)));
        assert_eq!(all.first().map(|a| a.id.as_str()), Some("a5"));
    }
}
