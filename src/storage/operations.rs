use std::time::SystemTime;

use rusqlite::{OptionalExtension, params};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config,
    domain::{id::TrackId, quality::Quality, queue::PlaybackQueue, track::Track},
    storage::{
        db::{self, SecondsSinceUnix, system_time_to_i64},
        error::StorageError,
        schema::{columns::*, keys, tables::*},
    },
};

/// Main structure that implements all storage logic
///
/// Values are JSON documents stored under fixed keys.
pub struct Storage {
    pub(crate) db: rusqlite::Connection,
}

impl Storage {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let raw: Option<String> = self
            .db
            .query_row(
                &format!("SELECT {VALUE} FROM {ENTRIES} WHERE {KEY} = ?1"),
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|source| StorageError::Serialization {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })?;
        let now = system_time_to_i64(SystemTime::now()).map_err(StorageError::Internal)?;

        self.db.execute(
            &format!(
                "INSERT INTO {ENTRIES} ({KEY}, {VALUE}, {UPDATED_AT}) VALUES (?1, ?2, ?3)
                 ON CONFLICT({KEY}) DO UPDATE SET {VALUE} = excluded.{VALUE}, {UPDATED_AT} = excluded.{UPDATED_AT}"
            ),
            params![key, raw, now],
        )?;
        Ok(())
    }

    /// when the value under `key` was last written
    pub fn last_updated(&self, key: &str) -> Result<Option<SecondsSinceUnix>, StorageError> {
        Ok(self
            .db
            .query_row(
                &format!("SELECT {UPDATED_AT} FROM {ENTRIES} WHERE {KEY} = ?1"),
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub fn favorites(&self) -> Result<Vec<Track>, StorageError> {
        Ok(self.get(keys::FAVORITES)?.unwrap_or_default())
    }

    pub fn is_favorite(&self, id: &TrackId) -> Result<bool, StorageError> {
        Ok(self.favorites()?.iter().any(|t| &t.id == id))
    }

    /// likes the track, or unlikes it if it was liked
    ///
    /// returns whether the track is liked now
    pub fn toggle_favorite(&mut self, track: &Track) -> Result<bool, StorageError> {
        let mut favorites = self.favorites()?;
        let liked = match favorites.iter().position(|t| t == track) {
            Some(index) => {
                favorites.remove(index);
                false
            }
            None => {
                favorites.push(track.clone());
                true
            }
        };
        self.put(keys::FAVORITES, &favorites)?;
        Ok(liked)
    }

    pub fn quality(&self) -> Result<Quality, StorageError> {
        Ok(self.get(keys::QUALITY)?.unwrap_or_default())
    }

    pub fn set_quality(&mut self, quality: Quality) -> Result<(), StorageError> {
        self.put(keys::QUALITY, &quality)
    }

    /// the saved queue, or an empty one
    pub fn load_queue(&self) -> Result<PlaybackQueue, StorageError> {
        Ok(self
            .get::<PlaybackQueue>(keys::QUEUE)?
            .map(PlaybackQueue::validated)
            .unwrap_or_default())
    }

    pub fn save_queue(&mut self, queue: &PlaybackQueue) -> Result<(), StorageError> {
        self.put(keys::QUEUE, queue)
    }
}
