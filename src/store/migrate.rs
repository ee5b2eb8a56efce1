use crate::store::keys;
use crate::store::operations::master_words::MasterWord;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "schema_version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_master_word_score_index", m002_master_word_score_index),
    ]
}

/// 执行所有未应用的迁移。
///
/// - 每个迁移必须幂等：进程可能在迁移完成、版本写入之前崩溃，重启后会重跑。
/// - 版本号在每个迁移成功后立即持久化。
/// - 仅向前：`set_version` 拒绝降级。
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt schema version ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Rebuilds the score index from the primary master word tree.
fn m002_master_word_score_index(store: &Store) -> Result<(), StoreError> {
    store.master_words_by_score.clear()?;
    for item in store.master_words.iter() {
        let (key, value) = item?;
        let word: MasterWord = Store::deserialize(&value)?;
        let index_key = keys::master_word_score_index_key(word.composite_score(), &word.text)?;
        store
            .master_words_by_score
            .insert(index_key.as_bytes(), key.as_ref())?;
    }
    Ok(())
}
