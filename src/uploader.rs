//! Vector-index uploader.
//!
//! [`VectorStoreUploader`] pushes article content to a managed
//! vector-store API (files + vector-stores endpoints, bearer auth) and
//! returns the opaque file id the index assigned. Each article is
//! uploaded as a JSONL file carrying its ordered, overlapping segments
//! so the index receives pre-chunked content. Retiring a file detaches
//! it from the vector store and deletes the underlying file.
//!
//! # Retry Strategy
//!
//! Transient errors use exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::multipart;

use crate::chunk::Segment;
use crate::config::IndexConfig;

/// External index the engine pushes changed content to.
#[async_trait]
pub trait IndexUploader: Send + Sync {
    /// Upload one article's segments; returns the index's file id.
    async fn upload(&self, article_id: i64, title: &str, segments: &[Segment]) -> Result<String>;

    /// Remove a superseded file from the index.
    async fn retire(&self, file_id: &str) -> Result<()>;
}

/// HTTP client against an OpenAI-style files + vector-stores API.
///
/// Requires the `OPENAI_API_KEY` environment variable. The vector
/// store is resolved by name at connect time and created if absent.
pub struct VectorStoreUploader {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    vector_store_id: String,
}

impl VectorStoreUploader {
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut uploader = Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
            vector_store_id: String::new(),
        };

        uploader.vector_store_id = uploader
            .ensure_vector_store(&config.store_name)
            .await
            .with_context(|| format!("Failed to resolve vector store '{}'", config.store_name))?;

        Ok(uploader)
    }

    /// Find the vector store by name, creating it if it does not exist.
    async fn ensure_vector_store(&self, name: &str) -> Result<String> {
        let listing = self
            .request_json(
                || {
                    self.client
                        .get(format!("{}/vector_stores", self.base_url))
                        .bearer_auth(&self.api_key)
                        .header("OpenAI-Beta", "assistants=v2")
                },
                "vector store listing",
            )
            .await?;

        if let Some(stores) = listing.get("data").and_then(|d| d.as_array()) {
            for store in stores {
                if store.get("name").and_then(|n| n.as_str()) == Some(name) {
                    if let Some(id) = store.get("id").and_then(|i| i.as_str()) {
                        return Ok(id.to_string());
                    }
                }
            }
        }

        let body = serde_json::json!({ "name": name });
        let created = self
            .request_json(
                || {
                    self.client
                        .post(format!("{}/vector_stores", self.base_url))
                        .bearer_auth(&self.api_key)
                        .header("OpenAI-Beta", "assistants=v2")
                        .json(&body)
                },
                "vector store creation",
            )
            .await?;

        created
            .get("id")
            .and_then(|i| i.as_str())
            .map(|i| i.to_string())
            .ok_or_else(|| anyhow!("Vector store creation response missing id"))
    }

    /// Send a request, retrying transient failures, and decode the JSON
    /// response. The builder closure is invoked once per attempt.
    async fn request_json<F>(&self, build: F, what: &str) -> Result<serde_json::Value>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            match build().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.json().await?);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow!("{} error {}: {}", what, status, body_text));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("{} error {}: {}", what, status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("{} failed after retries", what)))
    }
}

/// Serialize segments as JSONL, one `{index, text}` object per line.
fn segments_to_jsonl(segments: &[Segment]) -> String {
    let mut payload = String::new();
    for segment in segments {
        payload.push_str(
            &serde_json::json!({ "index": segment.index, "text": segment.text }).to_string(),
        );
        payload.push('\n');
    }
    payload
}

#[async_trait]
impl IndexUploader for VectorStoreUploader {
    async fn upload(&self, article_id: i64, title: &str, segments: &[Segment]) -> Result<String> {
        let payload = segments_to_jsonl(segments).into_bytes();
        let file_name = format!("article-{}.jsonl", article_id);

        let uploaded = self
            .request_json(
                || {
                    let part = multipart::Part::bytes(payload.clone())
                        .file_name(file_name.clone());
                    let form = multipart::Form::new()
                        .text("purpose", "assistants")
                        .part("file", part);
                    self.client
                        .post(format!("{}/files", self.base_url))
                        .bearer_auth(&self.api_key)
                        .multipart(form)
                },
                "file upload",
            )
            .await
            .with_context(|| format!("Failed to upload '{}'", title))?;

        let file_id = uploaded
            .get("id")
            .and_then(|i| i.as_str())
            .map(|i| i.to_string())
            .ok_or_else(|| anyhow!("File upload response missing id"))?;

        let attach_body = serde_json::json!({ "file_id": file_id });
        self.request_json(
            || {
                self.client
                    .post(format!(
                        "{}/vector_stores/{}/files",
                        self.base_url, self.vector_store_id
                    ))
                    .bearer_auth(&self.api_key)
                    .header("OpenAI-Beta", "assistants=v2")
                    .json(&attach_body)
            },
            "vector store attach",
        )
        .await
        .with_context(|| format!("Failed to attach '{}' to vector store", title))?;

        Ok(file_id)
    }

    async fn retire(&self, file_id: &str) -> Result<()> {
        // Attempt both operations even if the first fails, so a flaky
        // detach does not leave the underlying file behind too.
        let detached = self
            .request_json(
                || {
                    self.client
                        .delete(format!(
                            "{}/vector_stores/{}/files/{}",
                            self.base_url, self.vector_store_id, file_id
                        ))
                        .bearer_auth(&self.api_key)
                        .header("OpenAI-Beta", "assistants=v2")
                },
                "vector store detach",
            )
            .await;

        let deleted = self
            .request_json(
                || {
                    self.client
                        .delete(format!("{}/files/{}", self.base_url, file_id))
                        .bearer_auth(&self.api_key)
                },
                "file delete",
            )
            .await;

        detached?;
        deleted?;
        Ok(())
    }
}
