//! Configuration for the embeddings gateway

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub models: ModelConfig,
    pub remote: RemoteConfig,
    pub qdrant: QdrantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub default_model: String,
    /// Allow-list for local inference. Never empty after `from_env`.
    pub available_models: Vec<String>,
    pub models_dir: String,
    pub max_cached_models: usize,
    /// Batches larger than this are delegated to the remote service.
    pub max_local_texts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
    pub default_collection: String,
}

impl QdrantConfig {
    /// Base URL of the Qdrant REST API. A host that already carries a scheme
    /// is used as-is.
    pub fn url(&self) -> String {
        if self.host.starts_with("http") {
            self.host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let default_model = "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2".to_string();
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5005,
            },
            auth: AuthConfig {
                api_keys: vec!["adk_default".to_string()],
            },
            models: ModelConfig {
                available_models: vec![default_model.clone()],
                default_model,
                models_dir: "./models".to_string(),
                max_cached_models: 2,
                max_local_texts: 1,
            },
            remote: RemoteConfig {
                enabled: false,
                url: None,
                api_key: None,
                timeout: Duration::from_secs(600),
            },
            qdrant: QdrantConfig {
                enabled: false,
                host: "qdrant".to_string(),
                port: 6333,
                api_key: None,
                default_collection: "qdrant_default".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> crate::core::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source, falling back to
    /// defaults for anything absent or unparseable.
    pub fn from_vars<F>(var: F) -> crate::core::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = var("EMBEDDINGS_HOST") {
            config.server.host = host;
        }
        if let Some(port) = var("EMBEDDINGS_PORT") {
            config.server.port = port.parse().unwrap_or(config.server.port);
        }

        if let Some(keys) = var("API_KEYS") {
            config.auth.api_keys = split_list(&keys);
        }

        if let Some(default_model) = var("DEFAULT_MODEL") {
            config.models.default_model = default_model;
        }
        let available = var("AVAILABLE_MODELS").map(|v| split_list(&v)).unwrap_or_default();
        config.models.available_models = if available.is_empty() {
            vec![config.models.default_model.clone()]
        } else {
            available
        };
        if let Some(dir) = var("MODEL_PATH") {
            config.models.models_dir = dir;
        }
        if let Some(size) = var("MAX_CACHED_MODELS") {
            config.models.max_cached_models = size.parse().unwrap_or(config.models.max_cached_models);
        }
        if let Some(max) = var("MAX_LOCAL_TEXTS") {
            config.models.max_local_texts = max.parse().unwrap_or(config.models.max_local_texts);
        }

        if let Some(enabled) = var("RUNPOD_ENABLED") {
            config.remote.enabled = parse_flag(&enabled);
        }
        config.remote.url = var("RUNPOD_URL").filter(|v| !v.trim().is_empty());
        config.remote.api_key = var("RUNPOD_API_KEY").filter(|v| !v.trim().is_empty());
        if let Some(secs) = var("REQUEST_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            config.remote.timeout = Duration::from_secs(secs);
        }

        if let Some(enabled) = var("QDRANT_ENABLE") {
            config.qdrant.enabled = parse_flag(&enabled);
        }
        if let Some(host) = var("QDRANT_HOST") {
            config.qdrant.host = host;
        }
        if let Some(port) = var("QDRANT_PORT") {
            config.qdrant.port = port.parse().unwrap_or(config.qdrant.port);
        }
        config.qdrant.api_key = var("QDRANT_API_KEY").filter(|v| !v.is_empty());
        if let Some(collection) = var("DEFAULT_COLLECTION") {
            config.qdrant.default_collection = collection;
        }

        Ok(config)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}
