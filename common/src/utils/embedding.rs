use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use async_openai::{types::CreateEmbeddingRequestArgs, Client};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::utils::config::AppConfig;

/// Deterministic embedding source with an optional on-disk cache.
///
/// The cache key is a pure function of (model, text), so concurrent
/// misses racing to write the same key are safe: every writer produces
/// the same bytes and the rename is atomic. Last writer wins.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: EmbeddingInner,
    cache_dir: Option<PathBuf>,
}

#[derive(Clone)]
enum EmbeddingInner {
    OpenAI {
        client: Arc<Client<async_openai::config::OpenAIConfig>>,
        model: String,
        dimensions: u32,
    },
    Hashed {
        dimension: usize,
    },
}

impl EmbeddingProvider {
    pub fn new_openai(
        client: Arc<Client<async_openai::config::OpenAIConfig>>,
        model: String,
        dimensions: u32,
    ) -> Self {
        Self {
            inner: EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            },
            cache_dir: None,
        }
    }

    pub fn new_hashed(dimension: usize) -> Self {
        Self {
            inner: EmbeddingInner::Hashed {
                dimension: dimension.max(1),
            },
            cache_dir: None,
        }
    }

    /// Builds a provider from application config: OpenAI-backed when an
    /// API key is configured, hashed otherwise.
    pub fn from_config(config: &AppConfig) -> Self {
        let provider = match &config.openai_api_key {
            Some(key) => {
                let client = Arc::new(async_openai::Client::with_config(
                    async_openai::config::OpenAIConfig::new()
                        .with_api_key(key)
                        .with_api_base(&config.openai_base_url),
                ));
                Self::new_openai(
                    client,
                    config.embedding_model.clone(),
                    config.embedding_dimensions,
                )
            }
            None => Self::new_hashed(config.embedding_dimensions as usize),
        };

        match &config.embedding_cache_dir {
            Some(dir) => provider.with_cache_dir(dir),
            None => provider,
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn backend_label(&self) -> &'static str {
        match self.inner {
            EmbeddingInner::Hashed { .. } => "hashed",
            EmbeddingInner::OpenAI { .. } => "openai",
        }
    }

    fn model_code(&self) -> &str {
        match &self.inner {
            EmbeddingInner::Hashed { .. } => "hashed",
            EmbeddingInner::OpenAI { model, .. } => model,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.read_cached(text) {
            debug!(backend = self.backend_label(), "embedding cache hit");
            return Ok(cached);
        }

        let embedding = match &self.inner {
            EmbeddingInner::Hashed { dimension } => hashed_embedding(text, *dimension),
            EmbeddingInner::OpenAI {
                client,
                model,
                dimensions,
            } => {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.clone())
                    .input([text])
                    .dimensions(*dimensions)
                    .build()?;

                let response = client.embeddings().create(request).await?;

                response
                    .data
                    .first()
                    .ok_or_else(|| anyhow!("No embedding data received from OpenAI API"))?
                    .embedding
                    .clone()
            }
        };

        self.write_cached(text, &embedding);
        Ok(embedding)
    }

    fn cache_path(&self, text: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let mut hasher = Sha256::new();
        hasher.update(self.model_code().as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        let key = hasher.finalize();
        Some(dir.join(format!("{key:x}.json")))
    }

    fn read_cached(&self, text: &str) -> Option<Vec<f32>> {
        let path = self.cache_path(text)?;
        let raw = std::fs::read(&path).ok()?;
        serde_json::from_slice(&raw).ok()
    }

    fn write_cached(&self, text: &str, embedding: &[f32]) {
        let Some(path) = self.cache_path(text) else {
            return;
        };
        if let Err(err) = write_atomic(&path, embedding) {
            warn!(error = %err, "failed to persist embedding cache entry");
        }
    }
}

/// Write via a temp file in the target directory followed by a rename,
/// so partially-written entries are never observable.
fn write_atomic(path: &Path, embedding: &[f32]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("cache path has no parent directory"))?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).context("creating cache temp file")?;
    let payload = serde_json::to_vec(embedding)?;
    tmp.write_all(&payload)?;
    tmp.persist(path).context("renaming cache entry")?;
    Ok(())
}

// Bag-of-tokens embedding over hashed buckets. Deterministic, so it
// doubles as the offline/test backend.
fn hashed_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let dim = dimension.max(1);
    let mut vector = vec![0.0f32; dim];
    if text.is_empty() {
        return vector;
    }

    for token in tokens(text) {
        let idx = bucket(&token, dim);
        vector[idx] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }

    vector
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
}

fn bucket(token: &str, dimension: usize) -> usize {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    let mut value = 0usize;
    for byte in digest.iter().take(8) {
        value = (value << 8) | usize::from(*byte);
    }
    value % dimension
}
