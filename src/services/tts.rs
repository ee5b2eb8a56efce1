use std::path::PathBuf;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use super::ProviderError;

const PROVIDER: &str = "tts";
const MAX_AUDIO_BYTES: usize = 2 * 1024 * 1024;

/// URL path under which synthesized files are served.
pub const AUDIO_URL_PREFIX: &str = "/static/audio";

#[axum::async_trait]
pub trait SpeechSynthesis: Send + Sync {
    /// Relative URL of the audio file for `text`, creating it when missing.
    async fn synthesize(&self, text: &str) -> Result<Option<String>, ProviderError>;
}

/// Lowercased text with every non-alphanumeric char replaced by `_`.
pub fn safe_filename(text: &str) -> String {
    let stem: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{stem}.mp3")
}

#[derive(Debug, Clone)]
pub struct TtsClient {
    client: reqwest::Client,
    api_url: String,
    lang: String,
    audio_dir: PathBuf,
}

impl TtsClient {
    pub fn new(client: reqwest::Client, api_url: &str, lang: &str, audio_dir: PathBuf) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            lang: lang.to_string(),
            audio_dir,
        }
    }

    async fn download(&self, text: &str, target: &PathBuf) -> Result<(), ProviderError> {
        if self.api_url.trim().is_empty() {
            return Err(ProviderError::NotConfigured("TTS_API_URL"));
        }
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("ie", "UTF-8"),
                ("q", text),
                ("tl", self.lang.as_str()),
                ("client", "tw-ob"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status().as_u16(),
            });
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            bytes.extend_from_slice(&chunk?);
            if bytes.len() > MAX_AUDIO_BYTES {
                return Err(ProviderError::Decode {
                    provider: PROVIDER,
                    message: "audio response too large".to_string(),
                });
            }
        }
        if bytes.is_empty() {
            return Err(ProviderError::Decode {
                provider: PROVIDER,
                message: "empty audio response".to_string(),
            });
        }

        // 先写临时文件再 rename，避免并发请求读到半个文件
        let tmp = target.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, target).await?;
        Ok(())
    }
}

#[axum::async_trait]
impl SpeechSynthesis for TtsClient {
    async fn synthesize(&self, text: &str) -> Result<Option<String>, ProviderError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let filename = safe_filename(text);
        let target = self.audio_dir.join(&filename);

        if tokio::fs::try_exists(&target).await? {
            tracing::debug!(file = %filename, "Audio already exists");
        } else {
            tokio::fs::create_dir_all(&self.audio_dir).await?;
            self.download(text, &target).await?;
            tracing::info!(file = %filename, "Audio synthesized");
        }
        Ok(Some(format!("{AUDIO_URL_PREFIX}/{filename}")))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(safe_filename("Coração"), "coração.mp3");
        assert_eq!(safe_filename("guarda chuva/x"), "guarda_chuva_x.mp3");
    }

    #[tokio::test]
    async fn existing_file_is_reused_without_network() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("casa.mp3"), b"ID3").unwrap();
        // 无效地址：若发起请求必然失败
        let client = TtsClient::new(reqwest::Client::new(), "", "pt", dir.path().to_path_buf());

        let url = client.synthesize("Casa").await.unwrap();
        assert_eq!(url.as_deref(), Some("/static/audio/casa.mp3"));
    }

    #[tokio::test]
    async fn missing_url_is_not_configured() {
        let dir = tempdir().unwrap();
        let client = TtsClient::new(reqwest::Client::new(), "", "pt", dir.path().join("audio"));
        let result = client.synthesize("sol").await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
