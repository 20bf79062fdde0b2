//! Data Transfer Objects exchanged with the generation service and the
//! challenge bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Successful generation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Server-assigned identifier.
    pub id: i64,

    /// Seed actually used (resolves the random-seed sentinel).
    pub seed: i64,

    /// Opaque artifact locator, e.g. `/files/1.png`.
    pub image_url: String,

    /// Optional server message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Failure body returned alongside a 4xx/5xx status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    #[serde(default)]
    pub error: Option<String>,

    /// Service-defined code; authoritative over the status.
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorBody {
    /// Read `error` and `code` independently from a raw body. A field of the
    /// wrong type is dropped without losing the other one; a body that is not
    /// JSON yields neither.
    #[must_use]
    pub fn from_slice_lenient(body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
            return Self::default();
        };
        let field = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };
        Self {
            error: field("error"),
            code: field("code"),
        }
    }
}

/// Full record of a past generation, as returned by lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default)]
    pub seed: i64,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub style_preset_id: Option<u32>,
    pub image_url: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error_message: String,
    /// Generation time in milliseconds.
    #[serde(default)]
    pub generation_time: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ImageRecord {
    /// Case-insensitive substring match on the prompt or negative prompt.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.prompt.to_lowercase().contains(&query)
            || self.negative_prompt.to_lowercase().contains(&query)
    }
}

/// Server-side style preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylePreset {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prefix_prompt: String,
    #[serde(default)]
    pub suffix_prompt: String,
    #[serde(default)]
    pub prefix_negative_prompt: String,
    #[serde(default)]
    pub suffix_negative_prompt: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

/// Batch lookup request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchLookupRequest {
    pub ids: Vec<i64>,
}

/// Batch lookup response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchLookupResponse {
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// Style preset listing response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StylePresetsResponse {
    #[serde(default)]
    pub presets: Vec<StylePreset>,
}

/// Standard challenge bridge response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (0 = success, non-zero = error).
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// Response data (null on error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response with no data.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: None,
        }
    }
}

/// Body of the widget's verified callback.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedCallback {
    #[serde(default)]
    pub token: String,
}

/// Body of the widget's error callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorCallback {
    #[serde(default)]
    pub message: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Bridge status.
    pub status: String,

    /// Crate version.
    pub version: String,

    /// Challenge sessions currently waiting for a callback.
    pub pending_challenges: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_result_parses_server_body() {
        let result: GenerationResult = serde_json::from_str(
            r#"{"id":1,"seed":12345,"image_url":"/files/1.png","message":"Image generated successfully"}"#,
        )
        .unwrap();
        assert_eq!(result.id, 1);
        assert_eq!(result.seed, 12345);
        assert_eq!(result.image_url, "/files/1.png");
    }

    #[test]
    fn test_error_body_tolerates_missing_fields() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.error.is_none());
        assert!(body.code.is_none());

        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"slow down","code":"IP_RATE_LIMIT"}"#).unwrap();
        assert_eq!(body.code.as_deref(), Some("IP_RATE_LIMIT"));
    }

    #[test]
    fn test_error_body_lenient_keeps_code_when_error_is_not_a_string() {
        let body = ErrorBody::from_slice_lenient(
            br#"{"error":{"detail":"slow down"},"code":"IP_RATE_LIMIT"}"#,
        );
        assert!(body.error.is_none());
        assert_eq!(body.code.as_deref(), Some("IP_RATE_LIMIT"));

        let body = ErrorBody::from_slice_lenient(br#"{"error":"busy","code":42}"#);
        assert_eq!(body.error.as_deref(), Some("busy"));
        assert!(body.code.is_none());

        let body = ErrorBody::from_slice_lenient(b"[1,2]");
        assert!(body.error.is_none() && body.code.is_none());
    }

    #[test]
    fn test_image_record_parses_backend_timestamp() {
        let record: ImageRecord = serde_json::from_str(
            r#"{"id":7,"prompt":"A Red Fox","negative_prompt":"blurry","seed":3,"steps":28,
                "width":832,"height":1216,"style_preset_id":null,"image_url":"/files/7.png",
                "status":"success","error_message":"","generation_time":5300,
                "created_at":"2025-06-01T12:30:00.123456+08:00"}"#,
        )
        .unwrap();
        assert_eq!(record.id, 7);
        assert!(record.created_at.is_some());
        assert!(record.matches("red fox"));
        assert!(record.matches("BLUR"));
        assert!(!record.matches("cat"));
    }

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(vec![1, 2, 3]);
        assert_eq!(response.code, 0);
        assert_eq!(response.message, "success");
        assert_eq!(response.data, Some(vec![1, 2, 3]));
    }
}
