//! Image-search service (Google Custom Search JSON API).

use async_trait::async_trait;
use deckgen_core::{Error, Result, ServiceConfig};
use serde::Deserialize;

use crate::http::{build_client, ensure_success, transport_error, API_TIMEOUT};

/// The Custom Search API caps `num` at 10.
const MAX_RESULTS: u8 = 10;

/// Looks up candidate image URLs for a query.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Up to `count` image URLs, best match first.
    async fn search(&self, query: &str, count: u8) -> Result<Vec<String>>;
}

pub struct CustomSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
}

impl CustomSearchClient {
    /// Fails with [`Error::ConfigError`] unless both the key and engine id are set.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let (Some(api_key), Some(engine_id)) = (&config.search_api_key, &config.search_engine_id)
        else {
            return Err(Error::ConfigError(
                "GOOGLE_SEARCH_API_KEY and GOOGLE_SEARCH_ENGINE_ID are required for image search"
                    .to_string(),
            ));
        };
        Ok(Self {
            client: build_client(API_TIMEOUT)?,
            base_url: config.search_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.clone(),
            engine_id: engine_id.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
}

#[async_trait]
impl ImageSearch for CustomSearchClient {
    async fn search(&self, query: &str, count: u8) -> Result<Vec<String>> {
        let num = count.clamp(1, MAX_RESULTS).to_string();
        let url = format!("{}/customsearch/v1", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("searchType", "image"),
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;
        let response = ensure_success(response).await?;

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::ResponseError(format!("Search response did not parse: {}", e)))?;

        let links: Vec<String> = data
            .items
            .into_iter()
            .filter_map(|item| item.link)
            .filter(|link| !link.is_empty())
            .take(usize::from(count))
            .collect();
        log::debug!("Search '{}' returned {} candidate(s)", query, links.len());
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ServiceConfig {
        let mut config = ServiceConfig::new("g-key");
        config.search_api_key = Some("s-key".into());
        config.search_engine_id = Some("engine".into());
        config.search_base_url = server.uri();
        config
    }

    #[tokio::test]
    async fn test_search_returns_links_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .and(query_param("q", "Photosynthesis chloroplast"))
            .and(query_param("searchType", "image"))
            .and(query_param("key", "s-key"))
            .and(query_param("cx", "engine"))
            .and(query_param("num", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"link": "https://img.example/a.png", "mime": "image/png"},
                    {"title": "no link"},
                    {"link": "https://img.example/b.jpg"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CustomSearchClient::new(&config(&server)).unwrap();
        let links = client.search("Photosynthesis chloroplast", 2).await.unwrap();
        assert_eq!(links, vec!["https://img.example/a.png", "https://img.example/b.jpg"]);
    }

    #[tokio::test]
    async fn test_search_without_items_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "customsearch#search"})))
            .mount(&server)
            .await;

        let client = CustomSearchClient::new(&config(&server)).unwrap();
        assert!(client.search("nothing", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_quota_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = CustomSearchClient::new(&config(&server)).unwrap();
        let err = client.search("x", 1).await.unwrap_err();
        assert!(matches!(err, Error::ApiError { status: 429, .. }));
    }

    #[test]
    fn test_requires_credentials() {
        let config = ServiceConfig::new("g-key");
        assert!(matches!(
            CustomSearchClient::new(&config),
            Err(Error::ConfigError(_))
        ));
    }
}
