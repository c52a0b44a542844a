pub mod batch_client;
pub mod executor;
pub mod image_client;

pub use batch_client::{BatchClient, MAX_CONCURRENT_JOBS};
pub use executor::RequestExecutor;
pub use image_client::ImageClient;

use crate::config::FluxConfig;
use crate::download::{HttpDownloader, ImageDownloader};
use crate::error::{FluxError, Result};
use crate::models::GenerationRequest;
use serde::Serialize;
use std::sync::Arc;

/// Top-level client. Owns the shared configuration and hands out the
/// single-generation and batch sub-clients.
#[derive(Clone)]
pub struct FluxKontextClient {
    config: Arc<FluxConfig>,
    image_client: ImageClient,
    batch_client: BatchClient,
}

/// Configuration/credential snapshot for host status displays.
#[derive(Debug, Clone, Serialize)]
pub struct ApiStatus {
    pub api_key_set: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl std::fmt::Debug for FluxKontextClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluxKontextClient").finish_non_exhaustive()
    }
}

impl FluxKontextClient {
    /// Build a client with the default HTTP downloader.
    pub fn new(config: FluxConfig) -> Result<Self> {
        let downloader: Arc<dyn ImageDownloader> = Arc::new(HttpDownloader::new()?);
        Self::with_downloader(config, downloader)
    }

    /// Build a client with a custom downloader (e.g. a caching one).
    pub fn with_downloader(
        config: FluxConfig,
        downloader: Arc<dyn ImageDownloader>,
    ) -> Result<Self> {
        if !config.is_api_key_set() {
            return Err(FluxError::ConfigError(FluxConfig::api_key_help()));
        }

        let config = Arc::new(config);
        let executor = RequestExecutor::new(config.clone())?;
        let image_client = ImageClient::new(executor, downloader, config.clone());
        let batch_client = BatchClient::new(image_client.clone());

        Ok(Self {
            config,
            image_client,
            batch_client,
        })
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn batch(&self) -> &BatchClient {
        &self.batch_client
    }

    pub fn config(&self) -> &FluxConfig {
        &self.config
    }

    pub fn api_status(&self) -> ApiStatus {
        ApiStatus {
            api_key_set: self.config.is_api_key_set(),
            base_url: self.config.api_base_url.clone(),
            model: self.config.model.clone(),
            timeout_secs: self.config.timeout.as_secs(),
            max_retries: self.config.max_retries,
        }
    }

    /// Fire a minimal generation request to probe connectivity and the
    /// credential. Spends one (tiny) paid call.
    pub async fn test_connection(&self) -> bool {
        let request = GenerationRequest::new("test").with_seed(1);
        match self.image_client.generate(&request).await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Connection test failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_config_error() {
        let err = FluxKontextClient::new(FluxConfig::new()).unwrap_err();
        match err {
            FluxError::ConfigError(message) => assert!(message.contains("TUZI_API_KEY")),
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn api_status_reflects_config() {
        let client = FluxKontextClient::new(
            FluxConfig::new()
                .with_api_key("sk-test")
                .with_model("flux-kontext-max"),
        )
        .unwrap();

        let status = client.api_status();
        assert!(status.api_key_set);
        assert_eq!(status.model, "flux-kontext-max");
        assert_eq!(status.base_url, "https://api.tu-zi.com");
        assert_eq!(status.timeout_secs, 300);
        assert_eq!(status.max_retries, 3);
    }
}
