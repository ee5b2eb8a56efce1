pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub meta: sled::Tree,
    pub cognitive_states: sled::Tree,
    pub progress: sled::Tree,
    pub attempts: sled::Tree,
    pub master_words: sled::Tree,
    // Secondary index trees
    pub master_words_by_score: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

pub(crate) fn map_transaction_error(
    error: sled::transaction::TransactionError<StoreError>,
) -> StoreError {
    match error {
        sled::transaction::TransactionError::Abort(store_error) => store_error,
        sled::transaction::TransactionError::Storage(storage_error) => {
            StoreError::Sled(storage_error)
        }
    }
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let meta = db.open_tree(trees::META)?;
        let cognitive_states = db.open_tree(trees::COGNITIVE_STATES)?;
        let progress = db.open_tree(trees::PROGRESS)?;
        let attempts = db.open_tree(trees::ATTEMPTS)?;
        let master_words = db.open_tree(trees::MASTER_WORDS)?;
        let master_words_by_score = db.open_tree(trees::MASTER_WORDS_BY_SCORE)?;

        Ok(Self {
            db,
            meta,
            cognitive_states,
            progress,
            attempts,
            master_words,
            master_words_by_score,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
