use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use std::fmt;

use crate::constants::COMPLEXITY_CACHE_CAPACITY;

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub jwt_secret: String,
    pub jwt_expires_in_hours: u64,
    pub cors_origin: String,
    pub static_dir: String,
    /// 生成音频 URL 时使用；未设置则取请求的 Host
    pub public_base_url: Option<String>,
    pub engine: EngineEnvConfig,
    pub providers: ProviderConfig,
}

#[derive(Debug, Clone)]
pub struct EngineEnvConfig {
    pub epsilon: f64,
    pub pool_target: usize,
    pub complexity_cache_capacity: usize,
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub offline: bool,
    pub dictionary_api_url: String,
    pub pixabay_api_key: String,
    pub pixabay_api_url: String,
    pub tts_api_url: String,
    pub tts_lang: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("sled_path", &self.sled_path)
            .field("jwt_secret", &"***REDACTED***")
            .field("jwt_expires_in_hours", &self.jwt_expires_in_hours)
            .field("cors_origin", &self.cors_origin)
            .field("static_dir", &self.static_dir)
            .field("public_base_url", &self.public_base_url)
            .field("engine", &self.engine)
            .field("providers", &self.providers)
            .finish()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("offline", &self.offline)
            .field("dictionary_api_url", &self.dictionary_api_url)
            .field("pixabay_api_key", &"***REDACTED***")
            .field("pixabay_api_url", &self.pixabay_api_url)
            .field("tts_api_url", &self.tts_api_url)
            .field("tts_lang", &self.tts_lang)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for EngineEnvConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            pool_target: 5,
            complexity_cache_capacity: COMPLEXITY_CACHE_CAPACITY,
        }
    }
}

impl ProviderConfig {
    /// 所有外部查询均返回空结果，用于测试和离线开发
    pub fn offline() -> Self {
        Self {
            offline: true,
            dictionary_api_url: String::new(),
            pixabay_api_key: String::new(),
            pixabay_api_url: String::new(),
            tts_api_url: String::new(),
            tts_lang: "pt".to_string(),
            timeout_secs: 1,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let public_base_url = env_or("PUBLIC_BASE_URL", "");
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/exercise-engine.sled"),
            jwt_secret: env_or(
                "JWT_SECRET",
                "change_me_to_random_64_chars_change_me_to_random_64_chars",
            ),
            jwt_expires_in_hours: env_or_parse("JWT_EXPIRES_IN_HOURS", 24_u64),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            static_dir: env_or("STATIC_DIR", "./static"),
            public_base_url: if public_base_url.trim().is_empty() {
                None
            } else {
                Some(public_base_url.trim().trim_end_matches('/').to_string())
            },
            engine: EngineEnvConfig {
                epsilon: env_or_parse("ENGINE_EPSILON", 0.1_f64),
                pool_target: env_or_parse("ENGINE_POOL_TARGET", 5_usize),
                complexity_cache_capacity: env_or_parse(
                    "COMPLEXITY_CACHE_CAPACITY",
                    COMPLEXITY_CACHE_CAPACITY,
                ),
            },
            providers: ProviderConfig {
                offline: env_or_bool("PROVIDERS_OFFLINE", false),
                dictionary_api_url: env_or(
                    "DICTIONARY_API_URL",
                    "https://api.dicionario-aberto.net",
                ),
                pixabay_api_key: env_or("PIXABAY_API_KEY", ""),
                pixabay_api_url: env_or("PIXABAY_API_URL", "https://pixabay.com/api/"),
                tts_api_url: env_or(
                    "TTS_API_URL",
                    "https://translate.google.com/translate_tts",
                ),
                tts_lang: env_or("TTS_LANG", "pt"),
                timeout_secs: env_or_parse("PROVIDER_TIMEOUT_SECS", 10_u64),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
