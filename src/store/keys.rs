use crate::store::StoreError;

const SEPARATOR: char = ':';

fn segment<'a>(name: &str, value: &'a str) -> Result<&'a str, StoreError> {
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{name} must not be empty")));
    }
    if value.contains(SEPARATOR) {
        return Err(StoreError::Validation(format!(
            "{name} must not contain '{SEPARATOR}'"
        )));
    }
    Ok(value)
}

pub fn cognitive_state_key(user_id: &str) -> Result<String, StoreError> {
    Ok(segment("user_id", user_id)?.to_string())
}

pub fn progress_key(user_id: &str, word: &str, exercise_type: &str) -> Result<String, StoreError> {
    Ok(format!(
        "{}:{}:{}",
        segment("user_id", user_id)?,
        segment("word", word)?,
        segment("exercise_type", exercise_type)?
    ))
}

pub fn progress_prefix(user_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment("user_id", user_id)?))
}

/// Newest attempts sort first within a user prefix.
pub fn attempt_key(user_id: &str, timestamp_ms: i64, attempt_id: &str) -> Result<String, StoreError> {
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    Ok(format!(
        "{}:{:020}:{}",
        segment("user_id", user_id)?,
        reverse_ts,
        segment("attempt_id", attempt_id)?
    ))
}

pub fn attempt_prefix(user_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment("user_id", user_id)?))
}

pub fn master_word_key(word: &str) -> Result<String, StoreError> {
    Ok(segment("word", word)?.to_string())
}

fn score_millis(score: f64) -> u64 {
    (score.clamp(0.0, 10.0) * 1000.0).round() as u64
}

pub fn master_word_score_index_key(score: f64, word: &str) -> Result<String, StoreError> {
    Ok(format!("{:08}:{}", score_millis(score), segment("word", word)?))
}

/// Inclusive lower bound for a score range scan.
pub fn score_range_start(score: f64) -> String {
    format!("{:08}:", score_millis(score))
}

/// Exclusive upper bound covering every word stored at `score`.
pub fn score_range_end(score: f64) -> String {
    // ';' sorts directly after ':'
    format!("{:08};", score_millis(score))
}
