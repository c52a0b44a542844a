use crate::models::{AspectRatio, OutputFormat};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.tu-zi.com";
pub const DEFAULT_MODEL: &str = "flux-kontext-pro";

/// Client configuration, constructed once by the host and shared by
/// reference. All `with_*` setters are chainable.
#[derive(Debug, Clone)]
pub struct FluxConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Timeout for one generation call.
    pub timeout: Duration,
    /// Timeout for fetching the finished image, independent of `timeout`.
    pub download_timeout: Duration,
    /// Total attempt budget per executor call.
    pub max_retries: u32,
    pub default_aspect_ratio: AspectRatio,
    pub default_output_format: OutputFormat,
    pub default_safety_tolerance: u8,
    pub default_prompt_upsampling: bool,
}

impl Default for FluxConfig {
    fn default() -> Self {
        FluxConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(300),
            download_timeout: Duration::from_secs(60),
            max_retries: 3,
            default_aspect_ratio: AspectRatio::Square,
            default_output_format: OutputFormat::Jpeg,
            default_safety_tolerance: 2,
            default_prompt_upsampling: false,
        }
    }
}

impl FluxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the environment. `TUZI_API_KEY` carries the
    /// credential; `TUZI_API_BASE_URL` and `TUZI_MODEL` override the
    /// defaults when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.api_key = env::var("TUZI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        if let Ok(base_url) = env::var("TUZI_API_BASE_URL") {
            config.api_base_url = base_url;
        }
        if let Ok(model) = env::var("TUZI_MODEL") {
            config.model = model;
        }

        config
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn is_api_key_set(&self) -> bool {
        self.api_key.as_deref().map_or(false, |key| !key.is_empty())
    }

    /// Build a request prefilled with this configuration's generation
    /// defaults. Useful for hosts that expose the defaults in a UI.
    pub fn default_request(&self, prompt: impl Into<String>) -> crate::models::GenerationRequest {
        crate::models::GenerationRequest::new(prompt)
            .with_aspect_ratio(self.default_aspect_ratio)
            .with_output_format(self.default_output_format)
            .with_safety_tolerance(self.default_safety_tolerance)
            .with_prompt_upsampling(self.default_prompt_upsampling)
    }

    /// Instructions shown when no credential is configured.
    pub fn api_key_help() -> String {
        format!(
            "No API key found. Set the TUZI_API_KEY environment variable \
             (or add it to a .env file) with a key from {}",
            DEFAULT_API_BASE_URL.replace("api.", "")
        )
    }
}
