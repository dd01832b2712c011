//! HTTP transport for the observation fetcher.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::error::FetchError;

/// Status code and body of a completed GET
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// GET capability, swapped for a scripted fake in tests
pub trait HttpClient {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, FetchError>>;
}

/// reqwest-backed client
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
