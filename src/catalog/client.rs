use std::{io::Read, time::Duration};

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use ureq::Agent;

use crate::{
    catalog::{
        Catalog, RecommendationProvider,
        error::CatalogError,
        model::{Envelope, OneOrMany, SearchPage, tracks_from_values},
    },
    config::ApiConfig,
    domain::{id::TrackId, quality::Quality, track::Track},
};

/// Blocking client of the external music API
pub struct MusicApi {
    agent: Agent,
    config: ApiConfig,
}

impl MusicApi {
    pub fn new(config: ApiConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();
        Self { agent, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, CatalogError> {
        let url = self.endpoint(path);
        debug!("GET {url} {query:?}");

        let mut request = self.agent.get(&url);
        for (key, value) in query {
            request = request.query(*key, value);
        }
        let mut response = request.call()?;
        let envelope: Envelope<T> = response.body_mut().read_json()?;
        envelope.into_data()
    }
}

impl RecommendationProvider for MusicApi {
    fn recommendations(&self, id: &TrackId) -> Result<Vec<Track>, CatalogError> {
        let songs: Option<Vec<Value>> = self.get_json(
            &format!("songs/{id}/suggestions"),
            &[("limit", self.config.recommendation_limit.to_string())],
        )?;
        Ok(tracks_from_values(songs.unwrap_or_default(), false))
    }
}

impl Catalog for MusicApi {
    fn search(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        let page: Option<SearchPage> = self.get_json(
            "search/songs",
            &[
                ("query", query.to_string()),
                ("page", "0".to_string()),
                ("limit", self.config.search_limit.to_string()),
            ],
        )?;
        Ok(tracks_from_values(
            page.map(|p| p.results).unwrap_or_default(),
            true,
        ))
    }

    fn track(&self, id: &TrackId) -> Result<Track, CatalogError> {
        let data: Option<OneOrMany> = self.get_json(&format!("songs/{id}"), &[])?;
        data.and_then(OneOrMany::first)
            .map(|song| tracks_from_values(vec![song], false))
            .and_then(|tracks| tracks.into_iter().next())
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    fn open_stream(
        &self,
        track: &Track,
        quality: Quality,
    ) -> Result<Box<dyn Read + Send>, CatalogError> {
        let url = track
            .stream_url(quality)
            .ok_or_else(|| CatalogError::NoStream(track.id.clone()))?;
        debug!("Streaming {} from {url}", track.id);

        let response = self.agent.get(url).call()?;
        let (_parts, body) = response.into_parts();
        Ok(Box::new(body.into_reader()))
    }
}
