//! Local-vs-remote routing for embedding batches

use crate::core::config::RemoteConfig;
use crate::core::{EmbeddingError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Resolve the model through the cache and run inference in-process.
    Local,
    /// Forward the whole batch to the remote inference endpoint.
    Remote { url: String, api_key: String },
}

/// Decide where a batch of `text_count` texts is processed.
///
/// Batches up to `max_local_texts` stay local. Larger batches require remote
/// delegation to be enabled and fully configured.
pub fn plan_route(text_count: usize, max_local_texts: usize, remote: &RemoteConfig) -> Result<Route> {
    if text_count <= max_local_texts {
        return Ok(Route::Local);
    }

    if !remote.enabled {
        return Err(EmbeddingError::RemoteDisabled);
    }

    match (&remote.url, &remote.api_key) {
        (Some(url), Some(api_key)) => Ok(Route::Remote {
            url: url.clone(),
            api_key: api_key.clone(),
        }),
        _ => Err(EmbeddingError::ConfigError(
            "RUNPOD_URL and RUNPOD_API_KEY must be set when RunPod is enabled".to_string(),
        )),
    }
}
