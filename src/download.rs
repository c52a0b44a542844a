use crate::error::{FluxError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Fetches finished images by URL. The generation clients only depend on
/// this trait, so hosts that already own an HTTP stack (or a cache) can
/// substitute their own implementation.
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}

/// Default downloader over reqwest.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| FluxError::ClientError(format!("failed to build downloader: {}", e)))?;

        Ok(HttpDownloader { client })
    }
}

#[async_trait]
impl ImageDownloader for HttpDownloader {
    async fn download(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        log::debug!("Downloading image from {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FluxError::DownloadFailed(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(FluxError::DownloadFailed(format!(
                "{}: HTTP {}",
                url,
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FluxError::DownloadFailed(format!("{}: {}", url, e)))?;

        log::debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn downloads_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
            .mount(&server)
            .await;

        let downloader = HttpDownloader::new().unwrap();
        let bytes = downloader
            .download(&format!("{}/img.png", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[tokio::test]
    async fn http_error_is_download_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let downloader = HttpDownloader::new().unwrap();
        let err = downloader
            .download(
                &format!("{}/missing.png", server.uri()),
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, FluxError::DownloadFailed(_)));
    }
}
