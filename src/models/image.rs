use crate::error::{FluxError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width:height tokens accepted by the generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "21:9")]
    UltraWide,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "9:21")]
    UltraTall,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 7] = [
        AspectRatio::UltraWide,
        AspectRatio::Wide,
        AspectRatio::Landscape,
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Tall,
        AspectRatio::UltraTall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::UltraWide => "21:9",
            AspectRatio::Wide => "16:9",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Tall => "9:16",
            AspectRatio::UltraTall => "9:21",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self> {
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s)
            .ok_or_else(|| FluxError::InvalidParameter(format!("unsupported aspect ratio: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = FluxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(FluxError::InvalidParameter(format!(
                "unsupported output format: {}",
                other
            ))),
        }
    }
}

/// One image-generation request. Optional fields that are left unset are
/// omitted from the wire payload entirely; the service distinguishes
/// absent from null for webhooks and sampler overrides.
///
/// A `seed` of 0 means "let the service choose".
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: Option<String>,
    /// Base64-encoded reference image for image-to-image calls.
    pub input_image: Option<String>,
    pub seed: u64,
    pub aspect_ratio: Option<AspectRatio>,
    pub output_format: Option<OutputFormat>,
    pub safety_tolerance: Option<u8>,
    pub prompt_upsampling: Option<bool>,
    pub guidance_scale: Option<f32>,
    pub num_inference_steps: Option<u32>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        GenerationRequest {
            prompt: prompt.into(),
            model: None,
            input_image: None,
            seed: 0,
            aspect_ratio: None,
            output_format: None,
            safety_tolerance: None,
            prompt_upsampling: None,
            guidance_scale: None,
            num_inference_steps: None,
            webhook_url: None,
            webhook_secret: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach an already base64-encoded reference image.
    pub fn with_input_image(mut self, encoded: impl Into<String>) -> Self {
        self.input_image = Some(encoded.into());
        self
    }

    /// Attach a reference image from raw encoded bytes (jpeg/png data).
    pub fn with_input_image_bytes(mut self, bytes: &[u8]) -> Self {
        self.input_image = Some(STANDARD.encode(bytes));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(aspect_ratio);
        self
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.output_format = Some(output_format);
        self
    }

    pub fn with_safety_tolerance(mut self, safety_tolerance: u8) -> Self {
        self.safety_tolerance = Some(safety_tolerance);
        self
    }

    pub fn with_prompt_upsampling(mut self, enabled: bool) -> Self {
        self.prompt_upsampling = Some(enabled);
        self
    }

    pub fn with_guidance_scale(mut self, guidance_scale: f32) -> Self {
        self.guidance_scale = Some(guidance_scale);
        self
    }

    pub fn with_inference_steps(mut self, steps: u32) -> Self {
        self.num_inference_steps = Some(steps);
        self
    }

    pub fn with_webhook(mut self, url: impl Into<String>, secret: Option<String>) -> Self {
        self.webhook_url = Some(url.into());
        self.webhook_secret = secret;
        self
    }

    /// Pre-flight validation. Runs before any network call so that a bad
    /// request never costs a round trip.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(FluxError::InvalidParameter("prompt must not be empty".into()));
        }
        if let Some(tolerance) = self.safety_tolerance {
            if tolerance > 6 {
                return Err(FluxError::InvalidParameter(format!(
                    "safety_tolerance must be between 0 and 6, got {}",
                    tolerance
                )));
            }
        }
        if let Some(scale) = self.guidance_scale {
            if !(0.0..=10.0).contains(&scale) {
                return Err(FluxError::InvalidParameter(format!(
                    "guidance_scale must be between 0.0 and 10.0, got {}",
                    scale
                )));
            }
        }
        if let Some(steps) = self.num_inference_steps {
            if !(1..=100).contains(&steps) {
                return Err(FluxError::InvalidParameter(format!(
                    "num_inference_steps must be between 1 and 100, got {}",
                    steps
                )));
            }
        }
        if self.webhook_secret.is_some() && self.webhook_url.is_none() {
            return Err(FluxError::InvalidParameter(
                "webhook_secret requires webhook_url".into(),
            ));
        }
        Ok(())
    }

    /// Wire payload for the structured generation endpoint. `model` is the
    /// resolved model id (request override or the configured default).
    pub(crate) fn to_payload<'a>(&'a self, model: &'a str) -> GenerationPayload<'a> {
        GenerationPayload {
            model,
            prompt: &self.prompt,
            input_image: self.input_image.as_deref(),
            seed: (self.seed != 0).then_some(self.seed),
            aspect_ratio: self.aspect_ratio,
            output_format: self.output_format,
            safety_tolerance: self.safety_tolerance,
            prompt_upsampling: self.prompt_upsampling,
            guidance_scale: self.guidance_scale,
            num_inference_steps: self.num_inference_steps,
            webhook_url: self.webhook_url.as_deref(),
            webhook_secret: self.webhook_secret.as_deref(),
        }
    }
}

/// Serialized request body for `/v1/images/generations`. Every optional
/// field is skipped when unset rather than sent as null.
#[derive(Debug, Serialize)]
pub(crate) struct GenerationPayload<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_tolerance: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_upsampling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_inference_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<&'a str>,
}

/// A finished generation: the canonical image URL reported by the service
/// plus the downloaded encoded bytes.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub url: String,
    pub bytes: Vec<u8>,
}
