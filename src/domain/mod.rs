//! Domain models for the image generation client.
//!
//! This module contains the request/result values exchanged with the
//! generation service and the orchestration state types.

pub mod dto;
pub mod request;
pub mod state;

pub use dto::{
    ApiResponse, BatchLookupRequest, BatchLookupResponse, ErrorBody, ErrorCallback,
    GenerationResult, HealthResponse, ImageRecord, StylePreset, StylePresetsResponse,
    VerifiedCallback,
};
pub use request::{GenerationRequest, RANDOM_SEED};
pub use state::{OrchestrationState, RateLimitScope};
