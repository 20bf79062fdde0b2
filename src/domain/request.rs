//! Generation request value.

use serde::{Deserialize, Serialize};

/// Seed sentinel asking the service to pick a random seed.
pub const RANDOM_SEED: i64 = -1;

/// Default sampling step count.
pub const DEFAULT_STEPS: u32 = 28;

/// Default image width in pixels.
pub const DEFAULT_WIDTH: u32 = 832;

/// Default image height in pixels.
pub const DEFAULT_HEIGHT: u32 = 1216;

/// Negative prompt applied when the caller does not provide one.
pub const DEFAULT_NEGATIVE_PROMPT: &str = "bad anatomy, bad hands, text, error, missing fingers, \
extra digit, fewer digits, cropped, worst quality, low quality, normal quality, jpeg artifacts, \
signature, watermark, username, blurry";

/// One image-generation request.
///
/// Built fresh for every user action and never mutated once submitted: the
/// orchestrator takes it by value and only ever lends it out, so a retry after
/// a verification challenge resubmits exactly what the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Positive prompt.
    pub prompt: String,

    /// Negative prompt.
    #[serde(default)]
    pub negative_prompt: String,

    /// Seed; [`RANDOM_SEED`] lets the service choose.
    #[serde(default = "default_seed")]
    pub seed: i64,

    /// Sampling steps.
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Optional style preset applied server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_preset_id: Option<u32>,
}

const fn default_seed() -> i64 {
    RANDOM_SEED
}

const fn default_steps() -> u32 {
    DEFAULT_STEPS
}

const fn default_width() -> u32 {
    DEFAULT_WIDTH
}

const fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

impl GenerationRequest {
    /// Create a request with default parameters for the given prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            seed: RANDOM_SEED,
            steps: DEFAULT_STEPS,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            style_preset_id: None,
        }
    }

    #[must_use]
    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub const fn with_style_preset(mut self, style_preset_id: Option<u32>) -> Self {
        self.style_preset_id = style_preset_id;
        self
    }

    /// Whether the service is asked to choose the seed.
    #[must_use]
    pub const fn wants_random_seed(&self) -> bool {
        self.seed == RANDOM_SEED
    }

    /// Validate the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt is required".to_string());
        }
        if self.steps == 0 {
            return Err("steps must be at least 1".to_string());
        }
        if self.width == 0 || self.height == 0 {
            return Err("width and height must be positive".to_string());
        }
        if self.seed < RANDOM_SEED {
            return Err(format!("seed must be {RANDOM_SEED} or non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = GenerationRequest::new("a");
        assert_eq!(req.steps, 28);
        assert_eq!(req.width, 832);
        assert_eq!(req.height, 1216);
        assert!(req.wants_random_seed());
        assert!(req.style_preset_id.is_none());
        assert_eq!(req.negative_prompt, DEFAULT_NEGATIVE_PROMPT);
    }

    #[test]
    fn test_wire_shape() {
        let req = GenerationRequest::new("a").with_negative_prompt("");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "prompt": "a",
                "negative_prompt": "",
                "seed": -1,
                "steps": 28,
                "width": 832,
                "height": 1216
            })
        );

        let with_style = req.with_style_preset(Some(3));
        let value = serde_json::to_value(&with_style).unwrap();
        assert_eq!(value["style_preset_id"], 3);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let req: GenerationRequest = serde_json::from_str(r#"{"prompt":"cat"}"#).unwrap();
        assert_eq!(req.seed, RANDOM_SEED);
        assert_eq!(req.steps, DEFAULT_STEPS);
        assert_eq!(req.negative_prompt, "");
    }

    #[test]
    fn test_validation() {
        assert!(GenerationRequest::new("cat").validate().is_ok());
        assert!(GenerationRequest::new("   ").validate().is_err());
        assert!(GenerationRequest::new("cat").with_steps(0).validate().is_err());
        assert!(GenerationRequest::new("cat").with_size(0, 10).validate().is_err());
        assert!(GenerationRequest::new("cat").with_seed(-2).validate().is_err());
        assert!(GenerationRequest::new("cat").with_seed(0).validate().is_ok());
    }
}
