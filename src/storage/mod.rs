//! Durable key-value persistence of the player state.

use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;

use crate::storage::{error::StorageError, operations::Storage};

pub mod db;
pub mod error;
pub mod operations;
pub(crate) mod schema;

/// locks shared storage, a poisoned lock is an internal error
pub fn lock(storage: &Mutex<Storage>) -> Result<MutexGuard<'_, Storage>, StorageError> {
    storage.lock().map_err(|e| {
        StorageError::Internal(anyhow!(
            "Could not access doradeck storage under lock: {e}"
        ))
    })
}
