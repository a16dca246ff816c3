use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("stored value '{key}' is invalid: {source}")]
    Serialization {
        key: String,
        source: serde_json::Error,
    },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
