use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionError;

use crate::store::keys;
use crate::store::{map_transaction_error, Store, StoreError};

/// Domain key used when no domain-specific expertise is recorded.
pub const OVERALL_DOMAIN: &str = "overall";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCognitiveState {
    pub user_id: String,
    pub vocabular_ability: f64,
    pub processing_speed: f64,
    /// Reserved; not touched by the update rule.
    pub working_memory_load: f64,
    pub confidence_level: f64,
    pub fatigue_factor: f64,
    #[serde(default)]
    pub domain_expertise: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserCognitiveState {
    pub fn initial(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            vocabular_ability: 0.0,
            processing_speed: 0.0,
            working_memory_load: 0.0,
            confidence_level: 0.0,
            fatigue_factor: 0.0,
            domain_expertise: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overall expertise, falling back to vocabular ability when unset.
    pub fn overall_expertise(&self) -> f64 {
        self.expertise_in(OVERALL_DOMAIN)
    }

    /// Domain value, then the overall value, then vocabular ability.
    pub fn expertise_in(&self, domain: &str) -> f64 {
        self.domain_expertise
            .get(domain)
            .or_else(|| self.domain_expertise.get(OVERALL_DOMAIN))
            .copied()
            .unwrap_or(self.vocabular_ability)
    }
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveStateUpdate {
    pub vocabular_ability: Option<f64>,
    pub processing_speed: Option<f64>,
    pub working_memory_load: Option<f64>,
    pub confidence_level: Option<f64>,
    pub fatigue_factor: Option<f64>,
    pub domain_expertise: Option<BTreeMap<String, f64>>,
}

impl CognitiveStateUpdate {
    /// Full replacement of every mutable field from `state`.
    pub fn from_state(state: &UserCognitiveState) -> Self {
        Self {
            vocabular_ability: Some(state.vocabular_ability),
            processing_speed: Some(state.processing_speed),
            working_memory_load: Some(state.working_memory_load),
            confidence_level: Some(state.confidence_level),
            fatigue_factor: Some(state.fatigue_factor),
            domain_expertise: Some(state.domain_expertise.clone()),
        }
    }

    pub(crate) fn apply(&self, state: &mut UserCognitiveState, now: DateTime<Utc>) {
        if let Some(v) = self.vocabular_ability {
            state.vocabular_ability = v;
        }
        if let Some(v) = self.processing_speed {
            state.processing_speed = v;
        }
        if let Some(v) = self.working_memory_load {
            state.working_memory_load = v;
        }
        if let Some(v) = self.confidence_level {
            state.confidence_level = v;
        }
        if let Some(v) = self.fatigue_factor {
            state.fatigue_factor = v;
        }
        if let Some(map) = &self.domain_expertise {
            state.domain_expertise = map.clone();
        }
        state.updated_at = now;
    }
}

impl Store {
    pub fn get_cognitive_state(
        &self,
        user_id: &str,
    ) -> Result<Option<UserCognitiveState>, StoreError> {
        let key = keys::cognitive_state_key(user_id)?;
        match self.cognitive_states.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Creates the all-zero state, or returns the existing one untouched.
    pub fn create_initial_cognitive_state(
        &self,
        user_id: &str,
    ) -> Result<UserCognitiveState, StoreError> {
        let key = keys::cognitive_state_key(user_id)?;
        let state = UserCognitiveState::initial(user_id, Utc::now());
        let bytes = Self::serialize(&state)?;

        match self
            .cognitive_states
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(bytes))?
        {
            Ok(()) => {
                tracing::info!(user_id, "Initial cognitive state created");
                Ok(state)
            }
            Err(cas) => match cas.current {
                Some(existing) => Self::deserialize(&existing),
                None => Err(StoreError::NotFound {
                    entity: "cognitive_state".to_string(),
                    key,
                }),
            },
        }
    }

    pub fn update_cognitive_state(
        &self,
        user_id: &str,
        update: &CognitiveStateUpdate,
    ) -> Result<Option<UserCognitiveState>, StoreError> {
        let key = keys::cognitive_state_key(user_id)?;
        let now = Utc::now();

        self.cognitive_states
            .transaction(|tx| {
                let Some(raw) = tx.get(key.as_bytes())? else {
                    return Ok(None);
                };
                let mut state: UserCognitiveState = serde_json::from_slice(&raw)
                    .map_err(|e| ConflictableTransactionError::Abort(StoreError::Serialization(e)))?;
                update.apply(&mut state, now);
                let bytes = serde_json::to_vec(&state)
                    .map_err(|e| ConflictableTransactionError::Abort(StoreError::Serialization(e)))?;
                tx.insert(key.as_bytes(), bytes)?;
                Ok(Some(state))
            })
            .map_err(map_transaction_error)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn open_store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn initial_state_is_all_zero_and_idempotent() {
        let (_dir, store) = open_store();
        assert!(store.get_cognitive_state("u1").unwrap().is_none());

        let created = store.create_initial_cognitive_state("u1").unwrap();
        assert_eq!(created.vocabular_ability, 0.0);
        assert_eq!(created.confidence_level, 0.0);
        assert!(created.domain_expertise.is_empty());

        store
            .update_cognitive_state(
                "u1",
                &CognitiveStateUpdate {
                    vocabular_ability: Some(4.0),
                    ..Default::default()
                },
            )
            .unwrap();
        let again = store.create_initial_cognitive_state("u1").unwrap();
        assert_eq!(again.vocabular_ability, 4.0);
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let (_dir, store) = open_store();
        store.create_initial_cognitive_state("u1").unwrap();

        let updated = store
            .update_cognitive_state(
                "u1",
                &CognitiveStateUpdate {
                    fatigue_factor: Some(0.3),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.fatigue_factor, 0.3);
        assert_eq!(updated.processing_speed, 0.0);

        let loaded = store.get_cognitive_state("u1").unwrap().unwrap();
        assert_eq!(loaded, updated);
    }

    #[test]
    fn update_of_missing_user_returns_none() {
        let (_dir, store) = open_store();
        let result = store
            .update_cognitive_state("ghost", &CognitiveStateUpdate::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn expertise_falls_back_to_ability() {
        let mut state = UserCognitiveState::initial("u1", Utc::now());
        state.vocabular_ability = 3.0;
        assert_eq!(state.overall_expertise(), 3.0);
        state.domain_expertise.insert(OVERALL_DOMAIN.to_string(), 4.5);
        assert_eq!(state.overall_expertise(), 4.5);
        assert_eq!(state.expertise_in("dictation"), 4.5);
        state.domain_expertise.insert("dictation".to_string(), 2.0);
        assert_eq!(state.expertise_in("dictation"), 2.0);
    }
}
