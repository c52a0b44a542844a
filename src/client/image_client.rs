use crate::config::FluxConfig;
use crate::download::ImageDownloader;
use crate::error::{FluxError, Result};
use crate::models::{ChatMessage, GeneratedImage, GenerationRequest};
use crate::parser;
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

use super::executor::RequestExecutor;

pub const GENERATION_ENDPOINT: &str = "/v1/images/generations";
pub const CHAT_ENDPOINT: &str = "/v1/chat/completions";

/// Client for single image generations.
///
/// Validates requests before any network I/O, sends them through the
/// executor, normalizes the response to an image URL, and fetches the
/// bytes through the downloader collaborator under its own (shorter)
/// timeout.
#[derive(Clone)]
pub struct ImageClient {
    executor: RequestExecutor,
    downloader: Arc<dyn ImageDownloader>,
    config: Arc<FluxConfig>,
}

impl ImageClient {
    pub fn new(
        executor: RequestExecutor,
        downloader: Arc<dyn ImageDownloader>,
        config: Arc<FluxConfig>,
    ) -> Self {
        Self {
            executor,
            downloader,
            config,
        }
    }

    pub fn supported_models() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("flux-kontext-pro", "Flux Kontext Pro", "Black Forest Labs"),
            ("flux-kontext-max", "Flux Kontext Max", "Black Forest Labs"),
        ]
    }

    /// Generate one image via the structured endpoint and download it.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        request.validate()?;

        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let payload = serde_json::to_value(request.to_payload(model))
            .map_err(|e| FluxError::SerializationError(e.to_string()))?;

        let mode = if request.input_image.is_some() {
            "image-to-image"
        } else {
            "text-to-image"
        };
        log::info!("Generating image with model: {} ({})", model, mode);

        let response = self
            .executor
            .execute(Method::POST, GENERATION_ENDPOINT, Some(&payload), None)
            .await?;

        let url = parser::first_image_url(&response)?;
        log::debug!("Image ready at {}", url);

        // The generation already succeeded server-side; a failed fetch is
        // reported as DownloadFailed, never as a generation failure.
        let bytes = self
            .downloader
            .download(&url, self.config.download_timeout)
            .await?;

        Ok(GeneratedImage { url, bytes })
    }

    /// Generate via the chat-style endpoint and return the extracted
    /// image URL. This endpoint returns free text rather than JSON, so
    /// only the link is recoverable here.
    pub async fn generate_chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let payload = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": false,
        });

        log::info!("Generating image via chat endpoint with model: {}", self.config.model);

        let text = self
            .executor
            .execute_text(Method::POST, CHAT_ENDPOINT, Some(&payload), None)
            .await?;

        parser::extract_image_url(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::HttpDownloader;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ImageClient {
        let config = Arc::new(
            FluxConfig::new()
                .with_api_key("sk-test")
                .with_base_url(server.uri())
                .with_max_retries(1),
        );
        let executor = RequestExecutor::new(config.clone()).unwrap();
        ImageClient::new(executor, Arc::new(HttpDownloader::new().unwrap()), config)
    }

    #[tokio::test]
    async fn generates_and_downloads_image() {
        let server = MockServer::start().await;
        let image_url = format!("{}/files/out.png", server.uri());

        Mock::given(method("POST"))
            .and(path(GENERATION_ENDPOINT))
            .and(body_partial_json(json!({"model": "flux-kontext-pro", "prompt": "a fox"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"url": image_url}]})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/out.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegdata".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let image = client
            .generate(&GenerationRequest::new("a fox"))
            .await
            .unwrap();

        assert_eq!(image.url, format!("{}/files/out.png", server.uri()));
        assert_eq!(image.bytes, b"jpegdata");
    }

    #[tokio::test]
    async fn invalid_parameter_makes_no_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .generate(&GenerationRequest::new("a fox").with_safety_tolerance(9))
            .await
            .unwrap_err();

        assert!(matches!(err, FluxError::InvalidParameter(_)));
        // MockServer verifies the zero-call expectation on drop.
    }

    #[tokio::test]
    async fn request_model_overrides_config_default() {
        let server = MockServer::start().await;
        let image_url = format!("{}/files/out.png", server.uri());

        Mock::given(method("POST"))
            .and(path(GENERATION_ENDPOINT))
            .and(body_partial_json(json!({"model": "flux-kontext-max"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"url": image_url}]})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/out.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1]))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = GenerationRequest::new("a fox").with_model("flux-kontext-max");
        assert!(client.generate(&request).await.is_ok());
    }

    #[tokio::test]
    async fn failed_fetch_is_download_failed() {
        let server = MockServer::start().await;
        let image_url = format!("{}/files/gone.png", server.uri());

        Mock::given(method("POST"))
            .and(path(GENERATION_ENDPOINT))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"url": image_url}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .generate(&GenerationRequest::new("a fox"))
            .await
            .unwrap_err();

        assert!(matches!(err, FluxError::DownloadFailed(_)));
    }

    #[tokio::test]
    async fn empty_data_is_no_image_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATION_ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .generate(&GenerationRequest::new("a fox"))
            .await
            .unwrap_err();

        assert!(matches!(err, FluxError::NoImageFound));
    }

    #[tokio::test]
    async fn chat_endpoint_extracts_markdown_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_ENDPOINT))
            .and(body_partial_json(json!({"stream": false})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("Here it is: ![result](https://x/y.png) enjoy"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client
            .generate_chat(&[ChatMessage::user("draw a fox")])
            .await
            .unwrap();

        assert_eq!(url, "https://x/y.png");
    }

    #[tokio::test]
    async fn chat_endpoint_without_link_is_no_image_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT_ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("I cannot draw that"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .generate_chat(&[ChatMessage::user("draw a fox")])
            .await
            .unwrap_err();

        assert!(matches!(err, FluxError::NoImageFound));
    }
}
