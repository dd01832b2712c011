//! iNaturalist observation source.
//!
//! Pages through the v1 observations endpoint for a taxon, date window and
//! bounding box, yielding bare lon/lat points.

mod client;
mod fetcher;

pub use client::{HttpClient, HttpResponse, ReqwestClient};
pub use fetcher::{ObservationFetcher, ObservationQuery};
