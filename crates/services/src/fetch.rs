//! Raw image download.

use async_trait::async_trait;
use deckgen_core::Result;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

use crate::http::{build_client, ensure_success, transport_error, IMAGE_FETCH_TIMEOUT};

/// Downloaded bytes and their declared content type.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchedImage {
    /// True when the server declared an `image/*` payload.
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("image"))
    }
}

#[async_trait]
pub trait ImageFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage>;
}

pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(IMAGE_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ImageFetch for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage> {
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let response = ensure_success(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(transport_error)?;

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckgen_core::Error;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_bytes_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/leaf.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "image/png"))
            .mount(&server)
            .await;

        let fetched = HttpImageFetcher::new()
            .unwrap()
            .fetch(&format!("{}/leaf.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(fetched.bytes, vec![1, 2, 3]);
        assert_eq!(fetched.content_type.as_deref(), Some("image/png"));
        assert!(fetched.is_image());
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0u8], "image/png")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let fetcher = HttpImageFetcher::with_timeout(Duration::from_millis(50)).unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, Error::HttpError(_)));
    }

    #[test]
    fn test_is_image() {
        let html = FetchedImage {
            bytes: Vec::new(),
            content_type: Some("text/html; charset=utf-8".into()),
        };
        assert!(!html.is_image());
        let missing = FetchedImage {
            bytes: Vec::new(),
            content_type: None,
        };
        assert!(!missing.is_image());
    }
}
