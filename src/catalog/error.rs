use thiserror::Error;

use crate::domain::id::TrackId;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("failed to read HTTP body: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog rejected the request: {0}")]
    Rejected(String),

    #[error("track {0} not found")]
    NotFound(TrackId),

    #[error("track {0} has no playable url")]
    NoStream(TrackId),
}
