//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_OLLAMA__BASE_URL`).
//! Provides a helper to expand `~` and `${VAR}` in configured paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Load `config.toml` and the env-specific overlay from `dir`.
    pub fn load_from(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    /// Wrap an already-assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        match env {
            "prod" | "production" => {
                if settings.embedding.use_fake {
                    return Err(Error::InvalidConfig("embedding.use_fake must be false in production".into()).into());
                }
            }
            "dev" | "development" => {}
            "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index: IndexSettings,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalSettings,
    pub ollama: OllamaSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub vector: VectorSettings,
    pub extract: ExtractSettings,
    pub mirror: MirrorSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be at least 1".into()));
        }
        if self.server.max_concurrent_jobs == 0 {
            return Err(Error::InvalidConfig("server.max_concurrent_jobs must be at least 1".into()));
        }
        if self.vector.collection.trim().is_empty() {
            return Err(Error::InvalidConfig("vector.collection must not be empty".into()));
        }
        Ok(())
    }

    pub fn index_root(&self) -> PathBuf {
        expand_path(&self.index.root)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        expand_path(&self.index.uploads_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub root: String,
    pub uploads_dir: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { root: "indexes".to_string(), uploads_dir: "uploads".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    /// Cap on identifiers listed in a not-found response.
    pub max_available: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 4, max_available: 50 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub embed_model: String,
    pub embed_timeout_secs: u64,
    pub chat_timeout_secs: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            embed_timeout_secs: 60,
            chat_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub chat_model: String,
    pub num_predict: u32,
    pub num_ctx: u32,
    pub keep_alive: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            chat_model: "llama3.2:1b".to_string(),
            num_predict: 256,
            num_ctx: 2048,
            keep_alive: "5m".to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Use the deterministic hashing embedder instead of Ollama.
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { use_fake: false, fake_dim: 384 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSettings {
    pub collection: String,
    pub timeout_secs: u64,
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self { collection: "docs".to_string(), timeout_secs: 60 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    pub pdftotext_bin: String,
    pub timeout_secs: u64,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self { pdftotext_bin: "pdftotext".to_string(), timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorSettings {
    /// S3-compatible endpoint, e.g. `https://s3.us-east-1.amazonaws.com`.
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self { endpoint: None, bucket: None, token: None, timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_concurrent_jobs: usize,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_concurrent_jobs: 4,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
