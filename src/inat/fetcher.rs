//! Paged observation fetcher for the iNaturalist v1 API.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::client::HttpClient;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::pip::{BoundingBox, Point};

/// Taxon, date window and search box for one fetch
#[derive(Debug, Clone)]
pub struct ObservationQuery {
    pub taxon: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub bbox: BoundingBox,
}

#[derive(Debug, Deserialize)]
struct ObservationPage {
    total_results: Option<u64>,
    results: Option<Vec<ObservationRecord>>,
}

#[derive(Debug, Deserialize)]
struct ObservationRecord {
    geojson: Option<GeoJsonPoint>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonPoint {
    coordinates: Option<Vec<f64>>,
}

impl ObservationRecord {
    /// `geojson.coordinates` as `[lon, lat]`, else the flat fields
    fn point(&self) -> Option<Point> {
        let from_geojson = self
            .geojson
            .as_ref()
            .and_then(|g| g.coordinates.as_deref())
            .and_then(|coords| match coords {
                [lon, lat] => Some(Point::new(*lon, *lat)),
                _ => None,
            });

        from_geojson
            .or_else(|| match (self.longitude, self.latitude) {
                (Some(lon), Some(lat)) => Some(Point::new(lon, lat)),
                _ => None,
            })
            .filter(|p| p.lon.is_finite() && p.lat.is_finite())
    }
}

/// Pages through observation results with a fixed delay between requests.
///
/// Any transport, status or parse failure aborts the whole fetch.
pub struct ObservationFetcher<C> {
    client: C,
    config: FetchConfig,
}

impl<C: HttpClient> ObservationFetcher<C> {
    pub fn new(client: C, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// URL for one page of results
    pub fn page_url(&self, query: &ObservationQuery, page: u32) -> Result<Url, FetchError> {
        let bbox = &query.bbox;
        let url = Url::parse_with_params(
            &self.config.base_url,
            &[
                ("taxon_name", query.taxon.clone()),
                ("d1", query.start.to_string()),
                ("d2", query.end.to_string()),
                ("swlat", format!("{:.6}", bbox.min_lat)),
                ("swlng", format!("{:.6}", bbox.min_lon)),
                ("nelat", format!("{:.6}", bbox.max_lat)),
                ("nelng", format!("{:.6}", bbox.max_lon)),
                ("geo", "true".to_string()),
                ("order_by", "observed_on".to_string()),
                ("per_page", self.config.per_page.to_string()),
                ("page", page.to_string()),
            ],
        )?;
        Ok(url)
    }

    /// Fetch every georeferenced observation matching the query
    pub async fn fetch_points(&self, query: &ObservationQuery) -> Result<Vec<Point>, FetchError> {
        let per_page = u64::from(self.config.per_page);
        let mut points = Vec::new();
        let mut total_results: Option<u64> = None;
        let mut page: u32 = 1;

        loop {
            let url = self.page_url(query, page)?;
            let response = self.client.get(url.as_str()).await?;
            if !response.is_success() {
                return Err(FetchError::Status {
                    status: response.status,
                    url: url.to_string(),
                });
            }

            let data: ObservationPage = serde_json::from_str(&response.body)?;
            if total_results.is_none() {
                total_results = data.total_results;
            }

            let results = match data.results {
                Some(results) if !results.is_empty() => results,
                _ => break,
            };

            let before = points.len();
            points.extend(results.iter().filter_map(ObservationRecord::point));
            debug!(
                "Page {}: {} records, {} with coordinates",
                page,
                results.len(),
                points.len() - before
            );

            if (results.len() as u64) < per_page {
                break;
            }
            if let Some(total) = total_results {
                if u64::from(page) * per_page >= total {
                    break;
                }
            }
            if page >= self.config.max_pages {
                warn!(
                    "Reached page {}; iNaturalist may require auth for higher pages. Stopping to avoid being blocked.",
                    page
                );
                break;
            }

            page += 1;
            // Politeness delay
            tokio::time::sleep(self.config.page_delay()).await;
        }

        info!("Observations fetched (with coordinates): {}", points.len());
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inat::client::HttpResponse;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses and records requested URLs
    struct ScriptedClient {
        responses: RefCell<VecDeque<HttpResponse>>,
        requested: RefCell<Vec<String>>,
    }

    impl ScriptedClient {
        fn new(bodies: Vec<(u16, String)>) -> Self {
            Self {
                responses: RefCell::new(
                    bodies
                        .into_iter()
                        .map(|(status, body)| HttpResponse { status, body })
                        .collect(),
                ),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpClient for &ScriptedClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.requested.borrow_mut().push(url.to_string());
            Ok(self
                .responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(HttpResponse {
                    status: 200,
                    body: r#"{"results": []}"#.to_string(),
                }))
        }
    }

    fn config(per_page: u32, max_pages: u32) -> FetchConfig {
        FetchConfig {
            base_url: "https://api.example.org/v1/observations".to_string(),
            per_page,
            max_pages,
            page_delay_ms: 0,
            ..FetchConfig::default()
        }
    }

    fn query() -> ObservationQuery {
        ObservationQuery {
            taxon: "Podargus strigoides".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 11, 30).unwrap(),
            bbox: BoundingBox::new(144.5, -38.5, 145.5, -37.5),
        }
    }

    fn page(total: Option<u64>, records: Vec<serde_json::Value>) -> (u16, String) {
        let mut body = json!({ "results": records });
        if let Some(total) = total {
            body["total_results"] = json!(total);
        }
        (200, body.to_string())
    }

    fn located(lon: f64, lat: f64) -> serde_json::Value {
        json!({ "id": 1, "geojson": { "type": "Point", "coordinates": [lon, lat] } })
    }

    #[test]
    fn test_page_url() {
        let client = ScriptedClient::new(vec![]);
        let fetcher = ObservationFetcher::new(&client, config(200, 100));
        let url = fetcher.page_url(&query(), 3).unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };

        assert_eq!(get("taxon_name"), "Podargus strigoides");
        assert_eq!(get("d1"), "2025-09-01");
        assert_eq!(get("d2"), "2025-11-30");
        assert_eq!(get("swlat"), "-38.500000");
        assert_eq!(get("swlng"), "144.500000");
        assert_eq!(get("nelat"), "-37.500000");
        assert_eq!(get("nelng"), "145.500000");
        assert_eq!(get("geo"), "true");
        assert_eq!(get("per_page"), "200");
        assert_eq!(get("page"), "3");
        assert!(!url.as_str().contains(' '));
    }

    #[tokio::test]
    async fn test_short_page_stops() {
        let client = ScriptedClient::new(vec![page(
            Some(2),
            vec![located(145.0, -37.8), located(145.1, -37.9)],
        )]);
        let fetcher = ObservationFetcher::new(&client, config(200, 100));

        let points = fetcher.fetch_points(&query()).await.unwrap();
        assert_eq!(points, vec![Point::new(145.0, -37.8), Point::new(145.1, -37.9)]);
        assert_eq!(client.requested.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_pages_until_total_reached() {
        let client = ScriptedClient::new(vec![
            page(Some(4), vec![located(1.0, 1.0), located(2.0, 2.0)]),
            page(None, vec![located(3.0, 3.0), located(4.0, 4.0)]),
            page(None, vec![located(5.0, 5.0), located(6.0, 6.0)]),
        ]);
        let fetcher = ObservationFetcher::new(&client, config(2, 100));

        let points = fetcher.fetch_points(&query()).await.unwrap();
        assert_eq!(points.len(), 4);

        let requested = client.requested.borrow();
        assert_eq!(requested.len(), 2);
        assert!(requested[1].ends_with("page=2"));
    }

    #[tokio::test]
    async fn test_empty_page_stops() {
        let client = ScriptedClient::new(vec![
            page(None, vec![located(1.0, 1.0), located(2.0, 2.0)]),
            page(None, vec![]),
        ]);
        let fetcher = ObservationFetcher::new(&client, config(2, 100));

        let points = fetcher.fetch_points(&query()).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(client.requested.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_page_ceiling() {
        let full = || page(Some(1_000), vec![located(1.0, 1.0)]);
        let client = ScriptedClient::new(vec![full(), full(), full(), full(), full()]);
        let fetcher = ObservationFetcher::new(&client, config(1, 3));

        let points = fetcher.fetch_points(&query()).await.unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(client.requested.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_flat_coordinates_fallback() {
        let client = ScriptedClient::new(vec![page(
            None,
            vec![
                json!({ "latitude": -37.81, "longitude": 144.96 }),
                json!({ "geojson": { "coordinates": [1.0] }, "latitude": 2.0, "longitude": 3.0 }),
                json!({ "geojson": null, "latitude": null, "longitude": 144.0 }),
                json!({ "id": 99 }),
            ],
        )]);
        let fetcher = ObservationFetcher::new(&client, config(200, 100));

        let points = fetcher.fetch_points(&query()).await.unwrap();
        assert_eq!(points, vec![Point::new(144.96, -37.81), Point::new(3.0, 2.0)]);
    }

    #[tokio::test]
    async fn test_error_status_is_fatal() {
        let client = ScriptedClient::new(vec![
            page(None, vec![located(1.0, 1.0)]),
            (503, "Service Unavailable".to_string()),
        ]);
        let fetcher = ObservationFetcher::new(&client, config(1, 100));

        match fetcher.fetch_points(&query()).await {
            Err(FetchError::Status { status, url }) => {
                assert_eq!(status, 503);
                assert!(url.contains("page=2"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_body_is_fatal() {
        let client = ScriptedClient::new(vec![(200, String::new())]);
        let fetcher = ObservationFetcher::new(&client, config(200, 100));

        assert!(matches!(
            fetcher.fetch_points(&query()).await,
            Err(FetchError::Parse(_))
        ));
    }
}
