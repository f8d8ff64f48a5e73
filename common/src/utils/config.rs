use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    /// Absent key is a valid steady state: the generation path reports
    /// itself unavailable and the service runs template-only.
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Directory for the on-disk embedding cache; no directory disables
    /// caching.
    #[serde(default)]
    pub embedding_cache_dir: Option<String>,
    /// Fixed seed for the region-variety fallback; unset draws from
    /// entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_owned()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_owned()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_owned()
}

const fn default_embedding_dimensions() -> u32 {
    1536
}

const fn default_temperature() -> f32 {
    0.1
}

const fn default_max_tokens() -> u32 {
    1000
}

const fn default_top_k() -> usize {
    5
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_max_retries() -> usize {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_k: default_top_k(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            embedding_cache_dir: None,
            rng_seed: None,
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
