//! Session record storage.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::game::Game;

/// Key-value record store for sessions, keyed by normalized session code.
///
/// Implementations only move records; serialization of concurrent mutations is the
/// caller's job.
pub trait SessionStore: Send + Sync {
    fn load(&self, code: &str) -> Result<Option<Game>, StoreError>;
    fn save(&self, game: &Game) -> Result<(), StoreError>;
    fn delete(&self, code: &str) -> Result<(), StoreError>;
    fn contains(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.load(code)?.is_some())
    }
}

/// In-process store holding bincode-encoded records.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn encode(game: &Game) -> Result<Vec<u8>, StoreError> {
    bincode::serde::encode_to_vec(game, bincode::config::standard())
        .map_err(|err| StoreError::Codec(err.to_string()))
}

pub fn decode(bytes: &[u8]) -> Result<Game, StoreError> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(game, _)| game)
        .map_err(|err| StoreError::Codec(err.to_string()))
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("session table lock poisoned".to_string())
}

impl SessionStore for MemoryStore {
    fn load(&self, code: &str) -> Result<Option<Game>, StoreError> {
        let records = self.records.read().map_err(poisoned)?;
        records.get(code).map(|bytes| decode(bytes)).transpose()
    }

    fn save(&self, game: &Game) -> Result<(), StoreError> {
        let bytes = encode(game)?;
        let mut records = self.records.write().map_err(poisoned)?;
        records.insert(game.code().to_string(), bytes);
        Ok(())
    }

    fn delete(&self, code: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.remove(code);
        Ok(())
    }

    fn contains(&self, code: &str) -> Result<bool, StoreError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.contains_key(code))
    }
}
