//! Error types for loading area definitions and fetching observations.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to build an area index from a GeoJSON source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open GeoJSON {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid GeoJSON (no features array)")]
    MissingFeatures,

    #[error("malformed geometry in feature {feature}: {reason}")]
    Malformed { feature: usize, reason: String },

    #[error("no suburb polygons loaded from GeoJSON")]
    NoAreas,
}

/// Failure while paging through the observation API.
///
/// Every variant aborts the fetch; pages already parsed are discarded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status} for URL: {url}")]
    Status { status: u16, url: String },

    #[error("unparseable response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}
