//! Remote inference delegation (RunPod-style `runsync` endpoints)
//!
//! A batch is posted as `{"input": {"model": .., "input": [..]}}` and the
//! first item of the reply's `output` array is handed back untouched,
//! together with the upstream status code.

use axum::http::StatusCode;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use crate::core::{EmbeddingError, Result};

#[derive(Serialize)]
struct RemoteRequest<'a> {
    input: RemoteInput<'a>,
}

#[derive(Serialize)]
struct RemoteInput<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReply {
    pub status: StatusCode,
    pub body: Value,
}

pub struct RemoteClient {
    client: Client,
}

impl RemoteClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub async fn forward(
        &self,
        url: &str,
        api_key: &str,
        model: &str,
        texts: &[String],
    ) -> Result<RemoteReply> {
        info!("Forwarding {} texts to RunPod for model {}", texts.len(), model);

        let request = RemoteRequest {
            input: RemoteInput { model, input: texts },
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("RunPod request failed: {}", e);
                EmbeddingError::Upstream(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Upstream(e.to_string()))?;

        let body: Value = serde_json::from_str(&text).map_err(|_| {
            EmbeddingError::UpstreamProtocol(format!("RunPod returned {} with a non-JSON body", status))
        })?;

        let first = body
            .get("output")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .cloned()
            .ok_or_else(|| {
                error!("RunPod response missing 'output': {}", body);
                EmbeddingError::UpstreamProtocol("RunPod response missing 'output' array".to_string())
            })?;

        Ok(RemoteReply { status, body: first })
    }
}
