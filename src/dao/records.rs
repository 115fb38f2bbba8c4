//! Typed accessors over the raw record store.
//!
//! Each accessor maps one record shape onto its key and checks that what comes
//! back actually belongs there. Store failures are surfaced untouched; retries
//! are the callers' business.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use crate::dao::{
    ids::{GameId, ParticipantId},
    keys::RecordKey,
    models::{GameRecord, GameStateRecord, ParticipantRecord},
    record_store::RecordStore,
    storage::{StorageError, StorageResult},
};

/// Shared handle to the store, cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn RecordStore>,
}

impl Records {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Underlying store, used by the health probe.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub async fn get_game(&self, game_id: GameId) -> StorageResult<Option<GameRecord>> {
        let key = RecordKey::game(game_id);
        let Some(mut record) = self.read::<GameRecord>(&key).await? else {
            return Ok(None);
        };
        record
            .check_shape(game_id)
            .map_err(|reason| StorageError::malformed(key.as_str(), reason))?;
        let removed = record.dedupe_participants();
        if removed > 0 {
            warn!(key = %key, removed, "game record lists participants more than once");
        }
        Ok(Some(record))
    }

    pub async fn put_game(&self, record: &GameRecord) -> StorageResult<()> {
        self.write(RecordKey::game(record.game_id), record).await
    }

    pub async fn get_participant(
        &self,
        game_id: GameId,
        participant_id: ParticipantId,
    ) -> StorageResult<Option<ParticipantRecord>> {
        let key = RecordKey::participant(game_id, participant_id);
        let Some(record) = self.read::<ParticipantRecord>(&key).await? else {
            return Ok(None);
        };
        record
            .check_shape(game_id, participant_id)
            .map_err(|reason| StorageError::malformed(key.as_str(), reason))?;
        Ok(Some(record))
    }

    pub async fn put_participant(&self, record: &ParticipantRecord) -> StorageResult<()> {
        let key = RecordKey::participant(record.game_id, record.participant_id);
        self.write(key, record).await
    }

    pub async fn get_game_state(&self, game_id: GameId) -> StorageResult<Option<GameStateRecord>> {
        let key = RecordKey::game_state(game_id);
        let Some(record) = self.read::<GameStateRecord>(&key).await? else {
            return Ok(None);
        };
        record
            .check_shape(game_id)
            .map_err(|reason| StorageError::malformed(key.as_str(), reason))?;
        Ok(Some(record))
    }

    pub async fn put_game_state(&self, record: &GameStateRecord) -> StorageResult<()> {
        self.write(RecordKey::game_state(record.game_id), record)
            .await
    }

    async fn read<T: DeserializeOwned>(&self, key: &RecordKey) -> StorageResult<Option<T>> {
        match self.store.get(key.clone()).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|err| StorageError::malformed(key.as_str(), err.to_string())),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, key: RecordKey, record: &T) -> StorageResult<()> {
        let value: Value = serde_json::to_value(record)
            .map_err(|err| StorageError::malformed(key.as_str(), err.to_string()))?;
        self.store.put(key, value).await
    }
}
