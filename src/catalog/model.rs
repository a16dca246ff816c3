//! Wire format of the catalog API and its conversion to domain tracks.

use log::warn;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    catalog::error::CatalogError,
    domain::{
        id::TrackId,
        track::{ArtworkRef, StreamSources, StreamUrl, Track, TrackMetadata},
    },
};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// payload of a successful response
    pub fn into_data(self) -> Result<Option<T>, CatalogError> {
        if !self.success {
            return Err(CatalogError::Rejected(
                "response is not marked successful".into(),
            ));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub results: Vec<Value>,
}

/// `songs/{id}` answers with either one song or a list of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany {
    Many(Vec<Value>),
    One(Value),
}

impl OneOrMany {
    pub fn first(self) -> Option<Value> {
        match self {
            OneOrMany::Many(songs) => songs.into_iter().next(),
            OneOrMany::One(song) => Some(song),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSong {
    pub id: Option<String>,
    pub name: Option<String>,
    pub duration: Option<Value>,
    pub language: Option<String>,
    pub url: Option<String>,
    pub album: Option<RawAlbum>,
    pub artists: Option<RawArtists>,
    pub image: Option<Vec<RawLink>>,
    #[serde(rename = "downloadUrl")]
    pub download_url: Option<Vec<RawLink>>,
    /// search results carry an alternative id here
    pub song: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAlbum {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawArtists {
    #[serde(default)]
    pub primary: Vec<RawArtist>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawArtist {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawLink {
    pub quality: Option<String>,
    pub url: Option<String>,
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// last link with a url, upstream lists them from lowest to highest quality
fn best_link(links: &[RawLink]) -> Option<String> {
    links
        .iter()
        .rev()
        .find_map(|l| non_empty(l.url.clone()))
}

fn duration_secs(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

impl RawSong {
    /// `None` when the song has no usable id
    pub fn into_track(self, prefer_token: bool) -> Option<Track> {
        let token = self
            .song
            .as_ref()
            .and_then(|s| s.get("token"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let id = match (prefer_token, token) {
            (true, Some(token)) => token,
            _ => non_empty(self.id)?,
        };

        let artist = self
            .artists
            .map(|a| {
                a.primary
                    .into_iter()
                    .filter_map(|a| non_empty(a.name))
                    .map(|name| decode_entities(&name))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        let links = self.download_url.unwrap_or_default();
        let urls = links
            .iter()
            .filter_map(|l| {
                Some(StreamUrl {
                    quality: l.quality.clone().unwrap_or_default(),
                    url: non_empty(l.url.clone())?,
                })
            })
            .collect();

        Some(Track {
            id: TrackId::new(id),
            metadata: TrackMetadata {
                title: decode_entities(&self.name.unwrap_or_default()),
                artist,
                album: self
                    .album
                    .and_then(|a| non_empty(a.name))
                    .map(|a| decode_entities(&a))
                    .unwrap_or_else(|| "N/A".to_string()),
                duration: self.duration.as_ref().and_then(duration_secs),
                artwork: self
                    .image
                    .as_deref()
                    .and_then(best_link)
                    .map(ArtworkRef),
                language: non_empty(self.language),
                page_url: non_empty(self.url),
            },
            sources: StreamSources {
                urls,
                fallback: best_link(&links),
            },
        })
    }
}

/// Converts raw songs to tracks, skipping the ones that are not well formed.
pub(crate) fn tracks_from_values(values: Vec<Value>, prefer_token: bool) -> Vec<Track> {
    values
        .into_iter()
        .filter_map(|value| match parse::<RawSong>(value) {
            Some(song) => {
                let track = song.into_track(prefer_token);
                if track.is_none() {
                    warn!("Skipping catalog song without id");
                }
                track
            }
            None => None,
        })
        .collect()
}

fn parse<T: DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Skipping malformed catalog entry: {e}");
            None
        }
    }
}
