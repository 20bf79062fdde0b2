//! reqwest-backed transport.
//!
//! Endpoint paths are joined onto the configured base URL, so a base of
//! `http://host/api/` yields `http://host/api/generate`. Artifact locators are
//! absolute paths and resolve against the base URL's origin.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ServiceConfig;
use crate::domain::{
    BatchLookupRequest, BatchLookupResponse, GenerationRequest, GenerationResult, ImageRecord,
    StylePreset, StylePresetsResponse,
};
use crate::service::classifier::FailedExchange;
use crate::transport::{
    Credentials, ExchangeError, PRIVILEGE_KEY_HEADER, ServiceTransport, TURNSTILE_TOKEN_HEADER,
};

/// HTTP client for the generation service.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport from service configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(config: &ServiceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(client, config.parsed_base_url()?))
    }

    /// Create a transport reusing an existing [`reqwest::Client`].
    #[must_use]
    pub const fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Base URL endpoint paths are joined onto.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ExchangeError> {
        self.base_url
            .join(path)
            .map_err(|e| ExchangeError::Malformed(format!("cannot build URL for {path}: {e}")))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ExchangeError> {
        let response = request.send().await.map_err(network_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // An unreadable failure body still classifies, from the status alone
        let body = response.bytes().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Service returned failure status");
        Err(ExchangeError::Failed(FailedExchange::from_body(
            status.as_u16(),
            &body,
        )))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ExchangeError> {
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(network_error)?;
        serde_json::from_slice(&body).map_err(|e| ExchangeError::Malformed(e.to_string()))
    }
}

fn network_error(err: reqwest::Error) -> ExchangeError {
    ExchangeError::Network(err.to_string())
}

#[async_trait]
impl ServiceTransport for HttpTransport {
    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &Credentials,
    ) -> Result<GenerationResult, ExchangeError> {
        let mut builder = self.client.post(self.endpoint("generate")?).json(request);

        if let Some(key) = &credentials.privilege_key {
            builder = builder.header(PRIVILEGE_KEY_HEADER, key);
        }
        if let Some(token) = &credentials.verification_token {
            builder = builder.header(TURNSTILE_TOKEN_HEADER, token.as_str());
        }

        self.send_json(builder).await
    }

    async fn batch_lookup(&self, ids: &[i64]) -> Result<Vec<ImageRecord>, ExchangeError> {
        let body = BatchLookupRequest { ids: ids.to_vec() };
        let builder = self.client.post(self.endpoint("images/batch")?).json(&body);
        let response: BatchLookupResponse = self.send_json(builder).await?;
        Ok(response.images)
    }

    async fn image(&self, id: i64) -> Result<ImageRecord, ExchangeError> {
        let builder = self.client.get(self.endpoint(&format!("images/{id}"))?);
        self.send_json(builder).await
    }

    async fn style_presets(&self) -> Result<Vec<StylePreset>, ExchangeError> {
        let builder = self.client.get(self.endpoint("style-presets")?);
        let response: StylePresetsResponse = self.send_json(builder).await?;
        Ok(response.presets)
    }

    async fn download(&self, locator: &str) -> Result<Bytes, ExchangeError> {
        let builder = self.client.get(self.endpoint(locator)?);
        let response = self.send(builder).await?;
        response.bytes().await.map_err(network_error)
    }
}
