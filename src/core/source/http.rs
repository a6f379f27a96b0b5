//! A minimal HTTP seam so the GitHub source can be driven by a fake in tests.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Url;
use std::collections::HashMap;

use crate::core::error::CoreError;

/// The parts of an HTTP response the GitHub source looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-case.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues a GET with the given `Accept` header. Only transport failures are
    /// errors; any status code is returned as a response.
    async fn get(&self, url: &Url, accept: &str) -> Result<HttpResponse, CoreError>;
}

/// The production transport.
pub struct ReqwestTransport {
    client: reqwest::Client,
    token: Option<String>,
}

impl ReqwestTransport {
    pub fn new(token: Option<String>) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, token })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url, accept: &str) -> Result<HttpResponse, CoreError> {
        let mut request = self.client.get(url.clone()).header(ACCEPT, accept);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        tracing::debug!("GET {} -> {}", url, status);
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
