use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::adaptive::complexity::WordComplexityMetrics;
use crate::store::operations::cognitive_states::UserCognitiveState;
use crate::store::operations::progress::UserProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExerciseType {
    #[serde(rename = "MCQ_definition")]
    McqDefinition,
    #[serde(rename = "dictation")]
    Dictation,
    #[serde(rename = "MCQ_image")]
    McqImage,
    #[serde(rename = "define_word")]
    DefineWord,
    #[serde(rename = "complete_sentence")]
    CompleteSentence,
}

impl ExerciseType {
    /// Candidate expansion order. Ties in exploitation resolve to the earlier entry.
    pub const ALL: [ExerciseType; 5] = [
        Self::McqDefinition,
        Self::Dictation,
        Self::McqImage,
        Self::DefineWord,
        Self::CompleteSentence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::McqDefinition => "MCQ_definition",
            Self::Dictation => "dictation",
            Self::McqImage => "MCQ_image",
            Self::DefineWord => "define_word",
            Self::CompleteSentence => "complete_sentence",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown exercise type: {s}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCandidate {
    pub word_text: String,
    pub exercise_type: ExerciseType,
    pub word_complexity_score: f64,
    pub complexity_metrics: WordComplexityMetrics,
    pub difficulty: f64,
    pub learning_efficiency: f64,
    pub engagement_factor: f64,
    pub frustration_risk: f64,
    pub final_composite_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSubmission {
    pub word_text: String,
    pub exercise_type: ExerciseType,
    /// 0.0 (totally wrong) ..= 1.0 (fully correct)
    pub accuracy: f64,
    pub time_taken_seconds: f64,
}

impl ExerciseSubmission {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.accuracy.is_finite() || !(0.0..=1.0).contains(&self.accuracy) {
            return Err("A precisão deve estar entre 0 e 1");
        }
        if !self.time_taken_seconds.is_finite() || self.time_taken_seconds < 0.0 {
            return Err("O tempo de resposta deve ser um número não negativo");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Explore,
    Exploit,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionOutcome {
    pub candidate: Option<ExerciseCandidate>,
    pub mode: Option<SelectionMode>,
    pub candidates_considered: usize,
    pub message: String,
}

impl SelectionOutcome {
    pub fn none(message: &str) -> Self {
        Self {
            candidate: None,
            mode: None,
            candidates_considered: 0,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAck {
    pub progress: UserProgress,
    pub cognitive_state: UserCognitiveState,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub index: usize,
    pub accuracy: f64,
    pub cumulative_unique_words: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub unique_words_attempted: usize,
    pub total_attempts: u64,
    pub overall_accuracy: f64,
    pub average_time_seconds: f64,
    pub trend: Vec<TrendPoint>,
    pub message: String,
}
