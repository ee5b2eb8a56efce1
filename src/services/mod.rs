pub mod dictionary;
pub mod exercise_data;
pub mod image;
pub mod tts;
pub mod word_info;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ProviderConfig;

pub use dictionary::{DictionaryClient, DictionaryLookup};
pub use image::{ImageLookup, PixabayClient};
pub use tts::{SpeechSynthesis, TtsClient};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },
    #[error("failed to decode {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 所有查询都返回 `Ok(None)`
#[derive(Debug, Clone, Default)]
pub struct OfflineProviders;

#[axum::async_trait]
impl DictionaryLookup for OfflineProviders {
    async fn definition(&self, _word: &str) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }
}

#[axum::async_trait]
impl ImageLookup for OfflineProviders {
    async fn image_url(&self, _word: &str) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }
}

#[axum::async_trait]
impl SpeechSynthesis for OfflineProviders {
    async fn synthesize(&self, _text: &str) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }
}

/// The three external lookups used for word enrichment.
#[derive(Clone)]
pub struct Providers {
    pub dictionary: Arc<dyn DictionaryLookup>,
    pub image: Arc<dyn ImageLookup>,
    pub speech: Arc<dyn SpeechSynthesis>,
}

impl Providers {
    pub fn offline() -> Self {
        let offline = Arc::new(OfflineProviders);
        Self {
            dictionary: offline.clone(),
            image: offline.clone(),
            speech: offline,
        }
    }

    pub fn from_config(config: &ProviderConfig, static_dir: &str) -> Self {
        if config.offline {
            tracing::info!("External providers disabled (offline mode)");
            return Self::offline();
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            dictionary: Arc::new(DictionaryClient::new(
                client.clone(),
                &config.dictionary_api_url,
            )),
            image: Arc::new(PixabayClient::new(
                client.clone(),
                &config.pixabay_api_url,
                &config.pixabay_api_key,
            )),
            speech: Arc::new(TtsClient::new(
                client,
                &config.tts_api_url,
                &config.tts_lang,
                Path::new(static_dir).join("audio"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_providers_return_nothing() {
        let providers = Providers::offline();
        assert!(providers.dictionary.definition("casa").await.unwrap().is_none());
        assert!(providers.image.image_url("casa").await.unwrap().is_none());
        assert!(providers.speech.synthesize("casa").await.unwrap().is_none());
    }

    #[test]
    fn offline_flag_selects_offline_providers() {
        let providers = Providers::from_config(&ProviderConfig::offline(), "./static");
        // 离线模式下不会构造 HTTP 客户端
        assert_eq!(Arc::strong_count(&providers.dictionary), 3);
    }
}
