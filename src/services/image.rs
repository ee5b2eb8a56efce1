use serde::Deserialize;

use super::ProviderError;

const PROVIDER: &str = "pixabay";
const RESULTS_PER_PAGE: &str = "3";

#[axum::async_trait]
pub trait ImageLookup: Send + Sync {
    async fn image_url(&self, word: &str) -> Result<Option<String>, ProviderError>;
}

#[derive(Clone)]
pub struct PixabayClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl std::fmt::Debug for PixabayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixabayClient")
            .field("api_url", &self.api_url)
            .field("api_key", &"***REDACTED***")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "webformatURL")]
    webformat_url: Option<String>,
}

impl PixabayClient {
    pub fn new(client: reqwest::Client, api_url: &str, api_key: &str) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("PIXABAY_API_KEY not set, image lookups disabled");
        }
        Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.trim().to_string(),
        }
    }
}

#[axum::async_trait]
impl ImageLookup for PixabayClient {
    async fn image_url(&self, word: &str) -> Result<Option<String>, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("PIXABAY_API_KEY"));
        }
        if word.is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", word),
                ("lang", "pt"),
                ("image_type", "photo"),
                ("safesearch", "true"),
                ("order", "popular"),
                ("per_page", RESULTS_PER_PAGE),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status().as_u16(),
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| ProviderError::Decode {
            provider: PROVIDER,
            message: e.to_string(),
        })?;
        let url = body.hits.into_iter().next().and_then(|hit| hit.webformat_url);
        if url.is_none() {
            tracing::debug!(word, "No image found");
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let client = PixabayClient::new(reqwest::Client::new(), "http://127.0.0.1:9/api/", " ");
        let result = client.image_url("casa").await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn debug_hides_key() {
        let client = PixabayClient::new(reqwest::Client::new(), "https://pixabay.com/api/", "k-123");
        assert!(!format!("{client:?}").contains("k-123"));
    }

    #[test]
    fn first_hit_url_is_used() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"total":2,"hits":[{"webformatURL":"https://img/1.jpg"},{"webformatURL":"https://img/2.jpg"}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.hits.into_iter().next().and_then(|h| h.webformat_url).as_deref(),
            Some("https://img/1.jpg")
        );
        let empty: SearchResponse = serde_json::from_str(r#"{"total":0}"#).unwrap();
        assert!(empty.hits.is_empty());
    }
}
