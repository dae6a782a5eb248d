//! HTTP client for the content service's page description endpoints

use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Url, header};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::EndpointPath;
use crate::config::ContentConfig;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content service request failed: {0}")]
    RequestFailed(String),

    #[error("content service request timed out")]
    Timeout,

    #[error("content service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to build content client: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, ContentError>;

/// Body of a description update; every stored form travels together
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DescriptionUpdate {
    /// Base64-encoded binary document state
    pub description_binary: String,
    pub description_html: String,
    pub description: serde_json::Value,
}

pub struct ContentClient {
    client: Client,
    base_url: Url,
}

impl ContentClient {
    pub fn new(config: &ContentConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ContentError::Client(e.to_string()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ContentError::Client(format!("invalid base URL: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Full URL for `path`; each segment is percent-encoded on its own
    fn url(&self, path: &EndpointPath) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ContentError::Client(format!("base URL {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(path.segments());
        Ok(url)
    }

    fn with_cookie(request: RequestBuilder, cookie: Option<&str>) -> RequestBuilder {
        match cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }

    /// Fetch the stored binary state; `None` when the page has none yet
    pub async fn fetch_description(
        &self,
        path: &EndpointPath,
        cookie: Option<&str>,
    ) -> Result<Option<Bytes>> {
        let url = self.url(path)?;
        debug!(%url, "Fetching document description");

        let request = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/octet-stream");
        let response = Self::with_cookie(request, cookie)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| ContentError::RequestFailed(format!("Failed to read body: {}", e)))?;

        debug!(%url, size = body.len(), "Fetched document description");

        Ok((!body.is_empty()).then_some(body))
    }

    pub async fn patch_description(
        &self,
        path: &EndpointPath,
        update: &DescriptionUpdate,
        cookie: Option<&str>,
    ) -> Result<()> {
        let url = self.url(path)?;
        debug!(%url, html_bytes = update.description_html.len(), "Updating document description");

        let request = self.client.patch(url).json(update);
        let response = Self::with_cookie(request, cookie)
            .send()
            .await
            .map_err(map_send_error)?;

        check_status(response).await?;
        Ok(())
    }
}

fn map_send_error(e: reqwest::Error) -> ContentError {
    if e.is_timeout() {
        ContentError::Timeout
    } else {
        ContentError::RequestFailed(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .ok()
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());

    warn!(status = status.as_u16(), %message, "Content service rejected request");

    Err(ContentError::Status {
        status: status.as_u16(),
        message,
    })
}
