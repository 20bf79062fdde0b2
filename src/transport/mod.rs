//! Exchanges with the remote generation service.
//!
//! [`ServiceTransport`] is the seam the orchestrator and the history pager
//! talk through; [`HttpTransport`] is the reqwest implementation.

pub mod http;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{GenerationRequest, GenerationResult, ImageRecord, StylePreset};
use crate::service::classifier::FailedExchange;
use crate::service::token::VerificationToken;

pub use http::HttpTransport;

/// Header carrying the opaque privilege key.
pub const PRIVILEGE_KEY_HEADER: &str = "X-Privilege-Key";

/// Header carrying the single-use verification token.
pub const TURNSTILE_TOKEN_HEADER: &str = "X-Turnstile-Token";

/// Maximum ids the batch lookup endpoint accepts per call.
pub const MAX_BATCH_IDS: usize = 50;

/// Credentials attached to one generate exchange.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Privilege key, passed through untouched.
    pub privilege_key: Option<String>,
    /// Verification token taken from the holder for this exchange only.
    pub verification_token: Option<VerificationToken>,
}

/// Why an exchange did not produce a usable success body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// The exchange could not be completed (timeout, DNS, connection reset).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("service returned status {}", .0.status)]
    Failed(FailedExchange),

    /// A success status with a body that does not match the contract.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Operations the client performs against the generation service.
#[async_trait]
pub trait ServiceTransport: Send + Sync {
    /// `POST /generate`.
    async fn generate(
        &self,
        request: &GenerationRequest,
        credentials: &Credentials,
    ) -> Result<GenerationResult, ExchangeError>;

    /// `POST /images/batch` for at most [`MAX_BATCH_IDS`] ids.
    async fn batch_lookup(&self, ids: &[i64]) -> Result<Vec<ImageRecord>, ExchangeError>;

    /// `GET /images/{id}`.
    async fn image(&self, id: i64) -> Result<ImageRecord, ExchangeError>;

    /// `GET /style-presets`.
    async fn style_presets(&self) -> Result<Vec<StylePreset>, ExchangeError>;

    /// Fetch artifact bytes from a locator such as `/files/1.png`.
    async fn download(&self, locator: &str) -> Result<Bytes, ExchangeError>;
}
