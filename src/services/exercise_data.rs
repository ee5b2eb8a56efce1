//! Content payloads for the four concrete exercise formats.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::constants::{MCQ_DISTRACTOR_COUNT, MCQ_DISTRACTOR_SAMPLE_LIMIT, MISSING_DEFINITION_TEXT};
use crate::services::word_info::{WordInfoError, WordInfoService};
use crate::store::Store;
use crate::validation::validate_word_text;

const MSG_MCQ: &str = "Selecione a definição correta.";
const MSG_MCQ_IMAGE: &str = "Selecione a definição que melhor descreve a imagem.";
const MSG_DEFINE_WORD: &str = "Forneça a definição da palavra.";
const MSG_COMPLETE_SENTENCE: &str = "Complete a frase com a palavra correta.";

// 暂无例句语料，所有单词共用同一句
const SENTENCE_WITH_PLACEHOLDER: &str = "O [____] da questão era complexo.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceOption {
    pub word_text: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceExercise {
    pub target_word_text: String,
    pub options: Vec<MultipleChoiceOption>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceImageExercise {
    pub target_word_text: String,
    pub image_url: String,
    pub options: Vec<MultipleChoiceOption>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefineWordExercise {
    pub target_word_text: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSentenceExercise {
    pub target_word_text: String,
    pub sentence_with_placeholder: String,
    pub message: String,
}

pub struct ExerciseDataService {
    store: Arc<Store>,
    word_info: Arc<WordInfoService>,
    rng: std::sync::Mutex<StdRng>,
}

impl ExerciseDataService {
    pub fn new(store: Arc<Store>, word_info: Arc<WordInfoService>) -> Self {
        Self {
            store,
            word_info,
            rng: std::sync::Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic distractor sampling and option order, for tests.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: std::sync::Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }

    /// Target option plus sampled distractors, shuffled. `None` when the master
    /// list cannot supply enough distractors.
    fn build_options(
        &self,
        target: &str,
        definition: &str,
    ) -> Result<Option<Vec<MultipleChoiceOption>>, WordInfoError> {
        let exclude: HashSet<&str> = HashSet::from([target]);
        let masters = self.store.list_master_words_excluding(
            0.0,
            10.0,
            MCQ_DISTRACTOR_SAMPLE_LIMIT,
            &exclude,
        )?;
        if masters.len() < MCQ_DISTRACTOR_COUNT {
            tracing::warn!(
                word = target,
                needed = MCQ_DISTRACTOR_COUNT,
                found = masters.len(),
                "Not enough master words for distractors"
            );
            return Ok(None);
        }

        let options = self.with_rng(|rng| {
            let mut options: Vec<MultipleChoiceOption> = masters
                .choose_multiple(rng, MCQ_DISTRACTOR_COUNT)
                .map(|m| MultipleChoiceOption {
                    word_text: m.text.clone(),
                    definition: m
                        .definition
                        .clone()
                        .unwrap_or_else(|| MISSING_DEFINITION_TEXT.to_string()),
                })
                .collect();
            options.push(MultipleChoiceOption {
                word_text: target.to_string(),
                definition: definition.to_string(),
            });
            options.shuffle(rng);
            options
        });
        Ok(Some(options))
    }

    pub async fn multiple_choice(
        &self,
        raw: &str,
    ) -> Result<Option<MultipleChoiceExercise>, WordInfoError> {
        let content = self.word_info.exercise_content(raw).await?;
        let Some(definition) = content.definition else {
            tracing::warn!(word = %content.text, "No definition, multiple choice skipped");
            return Ok(None);
        };
        let Some(options) = self.build_options(&content.text, &definition)? else {
            return Ok(None);
        };
        tracing::info!(word = %content.text, "Multiple choice exercise built");
        Ok(Some(MultipleChoiceExercise {
            target_word_text: content.text,
            options,
            message: MSG_MCQ.to_string(),
        }))
    }

    pub async fn multiple_choice_image(
        &self,
        raw: &str,
    ) -> Result<Option<MultipleChoiceImageExercise>, WordInfoError> {
        let content = self.word_info.exercise_content(raw).await?;
        let (Some(definition), Some(image_url)) = (content.definition, content.image_url) else {
            tracing::warn!(word = %content.text, "No image or definition, image exercise skipped");
            return Ok(None);
        };
        let Some(options) = self.build_options(&content.text, &definition)? else {
            return Ok(None);
        };
        tracing::info!(word = %content.text, "Image multiple choice exercise built");
        Ok(Some(MultipleChoiceImageExercise {
            target_word_text: content.text,
            image_url,
            options,
            message: MSG_MCQ_IMAGE.to_string(),
        }))
    }

    pub fn define_word(&self, raw: &str) -> Result<DefineWordExercise, WordInfoError> {
        let word = validate_word_text(raw).map_err(WordInfoError::InvalidWord)?;
        Ok(DefineWordExercise {
            target_word_text: word,
            message: MSG_DEFINE_WORD.to_string(),
        })
    }

    pub fn complete_sentence(&self, raw: &str) -> Result<CompleteSentenceExercise, WordInfoError> {
        let word = validate_word_text(raw).map_err(WordInfoError::InvalidWord)?;
        Ok(CompleteSentenceExercise {
            target_word_text: word,
            sentence_with_placeholder: SENTENCE_WITH_PLACEHOLDER.to_string(),
            message: MSG_COMPLETE_SENTENCE.to_string(),
        })
    }
}
