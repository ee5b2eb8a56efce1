//! Word enrichment: definition, image, audio and complexity in one call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::adaptive::complexity::{
    difficulty_level, ComplexityAnalyzer, ComplexityCache, DifficultyLevel, WordComplexityMetrics,
};
use crate::constants::MISSING_DEFINITION_TEXT;
use crate::services::Providers;
use crate::store::operations::master_words::MasterWord;
use crate::store::{Store, StoreError};
use crate::validation::validate_word_text;

const COMPLEXITY_METHOD: &str = "heuristic_analysis";
const MASTER_WORD_CONCURRENCY: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum WordInfoError {
    #[error("{0}")]
    InvalidWord(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    pub analysis_timestamp: DateTime<Utc>,
    pub definition_available: bool,
    pub image_available: bool,
    pub audio_available: bool,
    pub cache_hit: bool,
    pub complexity_method: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInfo {
    pub text: String,
    pub definition: String,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub inferred_complexity_score: f64,
    pub complexity_metrics: WordComplexityMetrics,
    pub difficulty_level: DifficultyLevel,
    pub processing_metadata: ProcessingMetadata,
}

/// Normalized word with the raw lookups exercise builders need.
#[derive(Debug, Clone)]
pub struct WordContent {
    pub text: String,
    pub definition: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterWordInput {
    pub text: String,
    #[serde(default)]
    pub definition: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedWord {
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterWordBatch {
    pub stored: Vec<MasterWord>,
    pub rejected: Vec<RejectedWord>,
}

pub struct WordInfoService {
    providers: Providers,
    analyzer: ComplexityAnalyzer,
    cache: ComplexityCache,
    store: Arc<Store>,
}

impl WordInfoService {
    pub fn new(providers: Providers, store: Arc<Store>, cache_capacity: usize) -> Self {
        Self {
            providers,
            analyzer: ComplexityAnalyzer::new(),
            cache: ComplexityCache::new(cache_capacity),
            store,
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    async fn definition_of(&self, word: &str) -> Option<String> {
        match self.providers.dictionary.definition(word).await {
            Ok(definition) => definition,
            Err(e) => {
                tracing::warn!(word, error = %e, "Dictionary lookup failed");
                None
            }
        }
    }

    async fn image_of(&self, word: &str) -> Option<String> {
        match self.providers.image.image_url(word).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(word, error = %e, "Image lookup failed");
                None
            }
        }
    }

    /// Definition and image for exercise content, without audio or analysis.
    /// A stored master definition wins over the dictionary.
    pub async fn exercise_content(&self, raw: &str) -> Result<WordContent, WordInfoError> {
        let word = validate_word_text(raw).map_err(WordInfoError::InvalidWord)?;
        let stored = self.store.get_master_word(&word)?.and_then(|m| m.definition);
        let (definition, image_url) = match stored {
            Some(definition) => (Some(definition), self.image_of(&word).await),
            None => tokio::join!(self.definition_of(&word), self.image_of(&word)),
        };
        Ok(WordContent {
            text: word,
            definition,
            image_url,
        })
    }

    /// `base_url` prefixes the relative audio path, e.g. `https://host`.
    pub async fn word_info(&self, raw: &str, base_url: &str) -> Result<WordInfo, WordInfoError> {
        let word = validate_word_text(raw).map_err(WordInfoError::InvalidWord)?;
        tracing::info!(word = %word, "Word info requested");

        let (definition, image_url) =
            tokio::join!(self.definition_of(&word), self.image_of(&word));

        let audio_url = match self.providers.speech.synthesize(&word).await {
            Ok(Some(path)) => Some(format!("{}{}", base_url.trim_end_matches('/'), path)),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(word = %word, error = %e, "Audio synthesis failed");
                None
            }
        };

        let (metrics, cache_hit) =
            self.cache
                .get_or_analyze(&self.analyzer, &word, definition.as_deref());
        if cache_hit {
            tracing::debug!(word = %word, "Complexity cache hit");
        }

        Ok(WordInfo {
            text: word,
            definition: definition
                .clone()
                .unwrap_or_else(|| MISSING_DEFINITION_TEXT.to_string()),
            image_url: image_url.clone(),
            audio_url: audio_url.clone(),
            inferred_complexity_score: metrics.composite_score,
            difficulty_level: difficulty_level(&metrics),
            complexity_metrics: metrics,
            processing_metadata: ProcessingMetadata {
                analysis_timestamp: Utc::now(),
                definition_available: definition.is_some(),
                image_available: image_url.is_some(),
                audio_available: audio_url.is_some(),
                cache_hit,
                complexity_method: COMPLEXITY_METHOD.to_string(),
            },
        })
    }

    /// Complexity for candidate building: the stored master word snapshot
    /// when present, otherwise a fresh analysis. `None` for invalid text.
    pub async fn complexity_for(&self, raw: &str) -> Option<WordComplexityMetrics> {
        let word = match validate_word_text(raw) {
            Ok(word) => word,
            Err(reason) => {
                tracing::debug!(word = raw, reason, "Skipping invalid word");
                return None;
            }
        };

        match self.store.get_master_word(&word) {
            Ok(Some(master)) => return Some(master.complexity_metrics),
            Ok(None) => {}
            Err(e) => tracing::warn!(word = %word, error = %e, "Master word read failed"),
        }

        let definition = self.definition_of(&word).await;
        let (metrics, _) = self
            .cache
            .get_or_analyze(&self.analyzer, &word, definition.as_deref());
        Some(metrics)
    }

    /// Analyzes one word and stores it in the master list.
    pub async fn ingest_master_word(
        &self,
        input: &MasterWordInput,
    ) -> Result<MasterWord, WordInfoError> {
        let word = validate_word_text(&input.text).map_err(WordInfoError::InvalidWord)?;
        let definition = match input
            .definition
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            Some(given) => Some(given.to_string()),
            None => self.definition_of(&word).await,
        };

        let (metrics, _) = self
            .cache
            .get_or_analyze(&self.analyzer, &word, definition.as_deref());
        let master = MasterWord {
            text: word,
            definition,
            difficulty_level: difficulty_level(&metrics),
            complexity_metrics: metrics,
            updated_at: Utc::now(),
        };
        self.store.upsert_master_word(&master)?;
        Ok(master)
    }

    /// Order of `stored` follows the input; invalid entries land in `rejected`.
    pub async fn ingest_master_words(
        &self,
        inputs: Vec<MasterWordInput>,
    ) -> Result<MasterWordBatch, StoreError> {
        let results: Vec<(String, Result<MasterWord, WordInfoError>)> =
            futures::stream::iter(inputs)
                .map(|input| async move {
                    let result = self.ingest_master_word(&input).await;
                    (input.text, result)
                })
                .buffered(MASTER_WORD_CONCURRENCY)
                .collect()
                .await;

        let mut batch = MasterWordBatch::default();
        for (text, result) in results {
            match result {
                Ok(master) => batch.stored.push(master),
                Err(WordInfoError::InvalidWord(reason)) => batch.rejected.push(RejectedWord {
                    text,
                    reason: reason.to_string(),
                }),
                Err(WordInfoError::Store(e)) => return Err(e),
            }
        }
        tracing::info!(
            stored = batch.stored.len(),
            rejected = batch.rejected.len(),
            "Master words ingested"
        );
        Ok(batch)
    }
}
