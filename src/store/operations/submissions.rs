use chrono::Utc;
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;

use crate::store::keys;
use crate::store::operations::cognitive_states::{CognitiveStateUpdate, UserCognitiveState};
use crate::store::operations::progress::UserProgress;
use crate::store::{map_transaction_error, Store, StoreError};

impl Store {
    /// Writes the progress aggregate and the cognitive-state update in one
    /// transaction. Neither is written when the user has no state yet.
    pub fn commit_submission(
        &self,
        progress: &UserProgress,
        update: &CognitiveStateUpdate,
    ) -> Result<Option<UserCognitiveState>, StoreError> {
        if progress.correct_attempts > progress.total_attempts {
            return Err(StoreError::Validation(
                "correct_attempts cannot exceed total_attempts".to_string(),
            ));
        }
        let progress_key = keys::progress_key(
            &progress.user_id,
            &progress.word_text,
            progress.exercise_type.as_str(),
        )?;
        let state_key = keys::cognitive_state_key(&progress.user_id)?;
        let progress_bytes = Self::serialize(progress)?;
        let now = Utc::now();

        (&self.progress, &self.cognitive_states)
            .transaction(|(tx_progress, tx_states)| {
                let Some(raw) = tx_states.get(state_key.as_bytes())? else {
                    return Ok(None);
                };
                let mut state: UserCognitiveState = serde_json::from_slice(&raw).map_err(|e| {
                    ConflictableTransactionError::Abort(StoreError::Serialization(e))
                })?;
                update.apply(&mut state, now);
                let state_bytes = serde_json::to_vec(&state).map_err(|e| {
                    ConflictableTransactionError::Abort(StoreError::Serialization(e))
                })?;

                tx_progress.insert(progress_key.as_bytes(), progress_bytes.as_slice())?;
                tx_states.insert(state_key.as_bytes(), state_bytes)?;
                Ok(Some(state))
            })
            .map_err(map_transaction_error)
    }
}
