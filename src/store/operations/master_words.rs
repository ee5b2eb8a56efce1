use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;

use crate::adaptive::complexity::{DifficultyLevel, WordComplexityMetrics};
use crate::store::keys;
use crate::store::{map_transaction_error, Store, StoreError};

/// A sourcing-pool word with its precomputed complexity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterWord {
    pub text: String,
    pub definition: Option<String>,
    pub complexity_metrics: WordComplexityMetrics,
    pub difficulty_level: DifficultyLevel,
    pub updated_at: DateTime<Utc>,
}

impl MasterWord {
    pub fn composite_score(&self) -> f64 {
        self.complexity_metrics.composite_score
    }
}

impl Store {
    pub fn get_master_word(&self, word: &str) -> Result<Option<MasterWord>, StoreError> {
        let key = keys::master_word_key(word)?;
        match self.master_words.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Writes the word and moves its score index entry atomically.
    pub fn upsert_master_word(&self, word: &MasterWord) -> Result<(), StoreError> {
        let key = keys::master_word_key(&word.text)?;
        let bytes = Self::serialize(word)?;
        let index_key = keys::master_word_score_index_key(word.composite_score(), &word.text)?;

        (&self.master_words, &self.master_words_by_score)
            .transaction(|(tx_words, tx_index)| {
                if let Some(old_raw) = tx_words.get(key.as_bytes())? {
                    let old: MasterWord = serde_json::from_slice(&old_raw).map_err(|e| {
                        ConflictableTransactionError::Abort(StoreError::Serialization(e))
                    })?;
                    let old_index_key =
                        keys::master_word_score_index_key(old.composite_score(), &old.text)
                            .map_err(ConflictableTransactionError::Abort)?;
                    tx_index.remove(old_index_key.as_bytes())?;
                }
                tx_words.insert(key.as_bytes(), bytes.as_slice())?;
                tx_index.insert(index_key.as_bytes(), key.as_bytes())?;
                Ok(())
            })
            .map_err(map_transaction_error)
    }

    /// Words whose composite score lies in `[min, max]`, lowest score first.
    pub fn list_master_words(
        &self,
        min_complexity: f64,
        max_complexity: f64,
        limit: usize,
    ) -> Result<Vec<MasterWord>, StoreError> {
        self.list_master_words_excluding(min_complexity, max_complexity, limit, &HashSet::new())
    }

    /// Like [`Store::list_master_words`], but words in `exclude` are skipped
    /// during the index scan and do not count toward `limit`.
    pub fn list_master_words_excluding(
        &self,
        min_complexity: f64,
        max_complexity: f64,
        limit: usize,
        exclude: &HashSet<&str>,
    ) -> Result<Vec<MasterWord>, StoreError> {
        if min_complexity > max_complexity {
            return Ok(Vec::new());
        }
        let start = keys::score_range_start(min_complexity);
        let end = keys::score_range_end(max_complexity);

        let mut out = Vec::new();
        for item in self
            .master_words_by_score
            .range(start.as_bytes()..end.as_bytes())
        {
            if out.len() >= limit {
                break;
            }
            let (_, word_key) = item?;
            if std::str::from_utf8(&word_key).is_ok_and(|w| exclude.contains(w)) {
                continue;
            }
            match self.master_words.get(&word_key)? {
                Some(raw) => out.push(Self::deserialize(&raw)?),
                None => {
                    tracing::warn!(
                        word = %String::from_utf8_lossy(&word_key),
                        "Dangling master word index entry"
                    );
                }
            }
        }
        Ok(out)
    }

    pub fn count_master_words(&self) -> usize {
        self.master_words.len()
    }
}
