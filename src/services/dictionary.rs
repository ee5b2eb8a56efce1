use serde_json::Value;

use super::ProviderError;

const PROVIDER: &str = "dictionary";

#[axum::async_trait]
pub trait DictionaryLookup: Send + Sync {
    /// First definition of `word`, if the dictionary knows it.
    async fn definition(&self, word: &str) -> Result<Option<String>, ProviderError>;
}

/// Client for the dicionario-aberto.net REST API.
#[derive(Debug, Clone)]
pub struct DictionaryClient {
    client: reqwest::Client,
    base_url: String,
}

impl DictionaryClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_entries(&self, path: &str, word: &str) -> Result<Vec<Value>, ProviderError> {
        let url = format!("{}/{}/{}", self.base_url, path, word);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: response.status().as_u16(),
            });
        }
        let body: Value = response.json().await.map_err(|e| ProviderError::Decode {
            provider: PROVIDER,
            message: e.to_string(),
        })?;
        match body {
            Value::Array(entries) => Ok(entries),
            _ => Ok(Vec::new()),
        }
    }
}

#[axum::async_trait]
impl DictionaryLookup for DictionaryClient {
    async fn definition(&self, word: &str) -> Result<Option<String>, ProviderError> {
        if word.is_empty() {
            return Ok(None);
        }

        let entries = self.fetch_entries("word", word).await?;
        if let Some(definition) = entries
            .first()
            .and_then(|entry| entry.get("xml"))
            .and_then(Value::as_str)
            .and_then(extract_definition)
        {
            tracing::debug!(word, "Definition found");
            return Ok(Some(definition));
        }

        // 屈折形式可能只在 /near 中出现
        let near = self.fetch_entries("near", word).await?;
        let definition = near.iter().find_map(|entry| {
            let entry_word = entry.get("word").and_then(Value::as_str)?;
            if entry_word.to_lowercase() != word.to_lowercase() {
                return None;
            }
            entry
                .get("xml")
                .and_then(Value::as_str)
                .and_then(extract_definition)
        });

        if definition.is_none() {
            tracing::info!(word, "No usable definition found");
        }
        Ok(definition)
    }
}

/// Text of the first `<def>` element, tags stripped and whitespace collapsed.
pub fn extract_definition(xml: &str) -> Option<String> {
    let open = xml.find("<def")?;
    let after_open = &xml[open..];
    let body_start = after_open.find('>')? + 1;
    let body = &after_open[body_start..];
    let body_end = body.find("</def>")?;
    let raw = &body[..body_end];

    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let text = unescape(&text);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
