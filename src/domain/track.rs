use serde::{Deserialize, Serialize};

use super::{
    id::TrackId,
    quality::{Quality, parse_bitrate},
};

/// Represent a playable catalog track
///
/// Tracks are value objects received from the catalog. Two tracks are equal
/// when their IDs are equal, whatever their metadata says.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub metadata: TrackMetadata,
    #[serde(default)]
    pub sources: StreamSources,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// length in seconds
    pub duration: Option<u32>,
    pub artwork: Option<ArtworkRef>,
    pub language: Option<String>,
    pub page_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamUrl {
    pub quality: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamSources {
    #[serde(default)]
    pub urls: Vec<StreamUrl>,
    pub fallback: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<TrackId>, title: &str, artist: &str) -> Self {
        Self {
            id: id.into(),
            metadata: TrackMetadata {
                title: title.to_string(),
                artist: artist.to_string(),
                album: "N/A".to_string(),
                ..TrackMetadata::default()
            },
            sources: StreamSources::default(),
        }
    }

    /// picks the url to play for the preferred quality
    ///
    /// Exact bitrate match first, then the highest bitrate on offer,
    /// then the fallback url.
    pub fn stream_url(&self, quality: Quality) -> Option<&str> {
        let mut urls: Vec<&StreamUrl> = self.sources.urls.iter().collect();
        if urls.is_empty() {
            return self.sources.fallback.as_deref();
        }
        urls.sort_by_key(|u| parse_bitrate(&u.quality));

        urls.iter()
            .find(|u| parse_bitrate(&u.quality) == quality.bitrate())
            .or(urls.last())
            .map(|u| u.url.as_str())
    }

    /// "Artist - Title.mp3", stripped of characters unsafe in file names
    pub fn download_file_name(&self) -> String {
        fn clean(s: &str) -> String {
            s.chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
                .collect()
        }
        let artist = if self.metadata.artist.is_empty() {
            "Unknown"
        } else {
            &self.metadata.artist
        };
        format!("{} - {}.mp3", clean(artist), clean(&self.metadata.title))
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}
