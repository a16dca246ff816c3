use log::info;
use rouille::{Request, Response, ResponseBody};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::{
    catalog::Catalog,
    config::HttpConfig,
    domain::{id::TrackId, quality::Quality},
    http::error::ApiError,
    radio::{Advance, SelectionPolicy, advance_stored},
    storage::{lock, operations::Storage},
};

type ApiResult = Result<Response, ApiError>;

/// Local front of the player: proxies the catalog and exposes the stored player state
pub struct HttpServer<C> {
    storage: Arc<Mutex<Storage>>,
    catalog: C,
    policy: SelectionPolicy,
    pub config: HttpConfig,
}

#[derive(Serialize, Deserialize)]
struct QualityResponse {
    quality: Quality,
}

#[derive(Serialize, Deserialize)]
struct FavoriteResponse {
    track_id: TrackId,
    liked: bool,
}

impl<C: Catalog + Send + Sync + 'static> HttpServer<C> {
    pub fn new(storage: Storage, catalog: C, policy: SelectionPolicy, config: HttpConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            catalog,
            policy,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let result = rouille::router!(request,
            (GET) (/api/search) => {
                self.handle_search(request)
            },
            (GET) (/api/recommendations/{id: String}) => {
                self.handle_recommendations(TrackId::from(id))
            },
            (GET) (/api/download/{id: String}) => {
                self.handle_download(TrackId::from(id), request)
            },
            (GET) (/api/queue) => {
                self.handle_queue()
            },
            (POST) (/api/play/{id: String}) => {
                self.handle_play(TrackId::from(id))
            },
            (POST) (/api/radio/next) => {
                self.handle_next()
            },
            (POST) (/api/radio/prev) => {
                self.handle_previous()
            },
            (GET) (/api/favorites) => {
                self.handle_favorites()
            },
            (POST) (/api/favorites/toggle) => {
                self.handle_toggle_favorite()
            },
            (GET) (/api/quality) => {
                self.handle_get_quality()
            },
            (POST) (/api/quality) => {
                self.handle_set_quality(request)
            },
            _ => Ok(Response::empty_404())
        );

        let response = result.unwrap_or_else(ApiError::into_response);
        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn handle_search(&self, request: &Request) -> ApiResult {
        let query = request
            .get_param("query")
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Query parameter is required".into()))?;

        let tracks = self.catalog.search(query.trim())?;
        Ok(Response::json(&tracks))
    }

    fn handle_recommendations(&self, id: TrackId) -> ApiResult {
        let tracks = self.catalog.recommendations(&id)?;
        Ok(Response::json(&tracks))
    }

    /// streams the track as an attachment, at the requested or the stored quality
    fn handle_download(&self, id: TrackId, request: &Request) -> ApiResult {
        let quality = match request.get_param("quality") {
            Some(q) => q
                .parse::<Quality>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => lock(&self.storage)?.quality()?,
        };

        let track = self.catalog.track(&id)?;
        let reader = self.catalog.open_stream(&track, quality)?;

        let file_name = track.download_file_name();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        log::debug!("DOWNLOAD {id} at {quality}, {mime}, {file_name}");

        Ok(Response {
            status_code: 200,
            headers: vec![
                ("Content-Type".into(), mime.into()),
                (
                    "Content-Disposition".into(),
                    format!("attachment; filename=\"{file_name}\"").into(),
                ),
            ],
            data: ResponseBody::from_reader(reader),
            upgrade: None,
        })
    }

    fn handle_queue(&self) -> ApiResult {
        let queue = lock(&self.storage)?.load_queue()?;
        Ok(Response::json(&queue))
    }

    /// starts a new queue with a single track
    fn handle_play(&self, id: TrackId) -> ApiResult {
        let track = self.catalog.track(&id)?;

        let mut storage = lock(&self.storage)?;
        let mut queue = storage.load_queue()?;
        queue.play_single(track.clone());
        storage.save_queue(&queue)?;

        Ok(Response::json(&track))
    }

    fn handle_next(&self) -> ApiResult {
        let mut rng = rand::rng();
        let advance = advance_stored(&self.storage, &self.catalog, &self.policy, &mut rng)?;

        Ok(match advance {
            Advance::Queued(track) | Advance::Enqueued { track, .. } => Response::json(&track),
            Advance::Exhausted => Response::empty_204(),
            Advance::Stale => Response::text("queue changed while fetching recommendations")
                .with_status_code(409),
        })
    }

    fn handle_previous(&self) -> ApiResult {
        let mut storage = lock(&self.storage)?;
        let mut queue = storage.load_queue()?;
        let track = queue
            .previous()
            .cloned()
            .ok_or_else(|| ApiError::BadRequest("nothing is playing".into()))?;
        storage.save_queue(&queue)?;

        Ok(Response::json(&track))
    }

    fn handle_favorites(&self) -> ApiResult {
        let favorites = lock(&self.storage)?.favorites()?;
        Ok(Response::json(&favorites))
    }

    /// likes or unlikes the current track
    fn handle_toggle_favorite(&self) -> ApiResult {
        let mut storage = lock(&self.storage)?;
        let queue = storage.load_queue()?;
        let track = queue
            .current()
            .ok_or_else(|| ApiError::BadRequest("nothing is playing".into()))?;
        let liked = storage.toggle_favorite(track)?;

        Ok(Response::json(&FavoriteResponse {
            track_id: track.id.clone(),
            liked,
        }))
    }

    fn handle_get_quality(&self) -> ApiResult {
        let quality = lock(&self.storage)?.quality()?;
        Ok(Response::json(&QualityResponse { quality }))
    }

    fn handle_set_quality(&self, request: &Request) -> ApiResult {
        let quality = request
            .get_param("value")
            .ok_or_else(|| ApiError::BadRequest("value parameter is required".into()))?
            .parse::<Quality>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        lock(&self.storage)?.set_quality(quality)?;
        Ok(Response::json(&QualityResponse { quality }))
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
