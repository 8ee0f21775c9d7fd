// src/services/gateway.rs

//! Transport to the feed gateway.
//!
//! Adapters never talk HTTP directly; they ask a [`FeedGateway`] for the
//! raw body of one URL. Tests substitute an in-memory gateway.

use async_trait::async_trait;

use crate::error::{Result, SourceFailure};
use crate::models::FetchConfig;
use crate::utils::http::create_async_client;

/// Bytes of response body kept when logging a failed request.
const SNIPPET_LEN: usize = 500;

/// One request/response exchange with the feed gateway.
#[async_trait]
pub trait FeedGateway: Send + Sync {
    /// Fetch the body at `url`.
    async fn get(&self, url: &str) -> std::result::Result<Vec<u8>, SourceFailure>;
}

/// Production gateway over `reqwest`.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
}

impl HttpGateway {
    /// Create a gateway with the configured user agent and timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedGateway for HttpGateway {
    async fn get(&self, url: &str) -> std::result::Result<Vec<u8>, SourceFailure> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(SNIPPET_LEN).collect();
            log::debug!(
                "Response snippet from {}: {}",
                url,
                snippet.replace('\n', " ")
            );
            return Err(SourceFailure::Transport(format!("HTTP {status}")));
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SourceFailure::EmptyResponse);
        }
        Ok(bytes.to_vec())
    }
}
