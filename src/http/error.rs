use rouille::Response;

use crate::{catalog::error::CatalogError, storage::error::StorageError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Upstream(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        log::error!("Storage failure: {err}");
        ApiError::Internal("internal server error".into())
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => ApiError::NotFound(format!("track {id} not found")),

            CatalogError::NoStream(id) => {
                ApiError::NotFound(format!("track {id} has no download url"))
            }

            CatalogError::Http(_) | CatalogError::Io(_) | CatalogError::Rejected(_) => {
                log::warn!("Catalog failure: {err}");
                ApiError::Upstream(err.to_string())
            }
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Upstream(_) => 502,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Upstream(msg)
            | ApiError::Internal(msg) => Response::text(msg).with_status_code(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::TrackId;

    #[test]
    fn test_catalog_errors_map_to_statuses() {
        let not_found = ApiError::from(CatalogError::NotFound(TrackId::from("x")));
        assert_eq!(not_found.status_code(), 404);

        let no_stream = ApiError::from(CatalogError::NoStream(TrackId::from("x")));
        assert_eq!(no_stream.status_code(), 404);

        let rejected = ApiError::from(CatalogError::Rejected("nope".into()));
        assert_eq!(rejected.status_code(), 502);
    }

    #[test]
    fn test_storage_errors_hide_details() {
        let err = ApiError::from(StorageError::Internal(anyhow::anyhow!("secret path")));
        assert_eq!(err.status_code(), 500);
        let response = err.into_response();
        assert_eq!(response.status_code, 500);
    }
}
