//! The external music catalog: search, track lookup, recommendations.

use std::io::{Read, Write};

use crate::domain::{id::TrackId, quality::Quality, track::Track};

pub mod client;
pub mod error;
mod model;

pub use client::MusicApi;
use error::CatalogError;

/// Suggests tracks similar to a given one, best suggestion first
pub trait RecommendationProvider {
    fn recommendations(&self, id: &TrackId) -> Result<Vec<Track>, CatalogError>;
}

pub trait Catalog: RecommendationProvider {
    fn search(&self, query: &str) -> Result<Vec<Track>, CatalogError>;

    fn track(&self, id: &TrackId) -> Result<Track, CatalogError>;

    /// Opens the audio of `track` at the preferred quality for reading.
    fn open_stream(
        &self,
        track: &Track,
        quality: Quality,
    ) -> Result<Box<dyn Read + Send>, CatalogError>;

    /// Copies the audio of `track` into `out`, returns the number of bytes written.
    fn download(
        &self,
        track: &Track,
        quality: Quality,
        out: &mut dyn Write,
    ) -> Result<u64, CatalogError> {
        let mut reader = self.open_stream(track, quality)?;
        Ok(std::io::copy(&mut reader, out)?)
    }
}
