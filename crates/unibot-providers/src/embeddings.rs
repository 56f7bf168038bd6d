//! Embedding backends.
//!
//! Mistral and OpenAI share the `/embeddings` request shape; Gemini uses
//! `batchEmbedContents`. Every backend checks the returned vector length
//! against the configured dimensions so a model mismatch fails loudly
//! instead of corrupting the vector table.

use crate::gemini::{GeminiContent, GeminiPart};
use crate::retry::with_retries;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use unibot_core::{error::UnibotError, traits::Embedder};

/// Embedder for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    /// Send `dimensions` in the request (OpenAI v3 models support truncation; Mistral rejects it).
    request_dimensions: bool,
    max_retries: u32,
}

impl OpenAiEmbedder {
    pub fn from_config(
        name: &str,
        base_url: String,
        api_key: String,
        model: String,
        dimensions: usize,
        max_retries: u32,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            request_dimensions: name == "openai",
            name: name.to_string(),
            base_url,
            api_key,
            model,
            dimensions,
            max_retries,
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UnibotError> {
        let name = &self.name;
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.request_dimensions.then_some(self.dimensions),
        };
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| UnibotError::Provider(format!("{name} request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(UnibotError::Provider(format!(
                "{name} returned {status}: {text}"
            )));
        }

        let parsed: EmbeddingResponse = resp.json().await.map_err(|e| {
            UnibotError::Provider(format!("{name}: failed to parse embeddings: {e}"))
        })?;

        collect_ordered(parsed, texts.len(), self.dimensions, name)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Reorder by `index` and validate count and dimensions.
fn collect_ordered(
    mut parsed: EmbeddingResponse,
    expected: usize,
    dimensions: usize,
    name: &str,
) -> Result<Vec<Vec<f32>>, UnibotError> {
    parsed.data.sort_by_key(|d| d.index);
    let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
    validate(&vectors, expected, dimensions, name)?;
    Ok(vectors)
}

fn validate(
    vectors: &[Vec<f32>],
    expected: usize,
    dimensions: usize,
    name: &str,
) -> Result<(), UnibotError> {
    if vectors.len() != expected {
        return Err(UnibotError::Provider(format!(
            "{name}: expected {expected} embeddings, got {}",
            vectors.len()
        )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(UnibotError::Provider(format!(
            "{name}: embedding has {} dimensions, configured {dimensions}",
            bad.len()
        )));
    }
    Ok(())
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UnibotError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("{}: embedding {} texts with {}", self.name, texts.len(), self.model);
        with_retries(&self.name, self.max_retries, || self.request(texts)).await
    }
}

/// Embedder for Gemini `batchEmbedContents`.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
}

impl GeminiEmbedder {
    pub fn from_config(
        base_url: String,
        api_key: String,
        model: String,
        dimensions: usize,
        max_retries: u32,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            dimensions,
            max_retries,
        }
    }

    fn build_request(&self, texts: &[String]) -> GeminiBatchRequest {
        GeminiBatchRequest {
            requests: texts
                .iter()
                .map(|t| GeminiEmbedRequest {
                    model: format!("models/{}", self.model),
                    content: GeminiContent {
                        role: None,
                        parts: vec![GeminiPart { text: t.clone() }],
                    },
                    output_dimensionality: self.dimensions,
                })
                .collect(),
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UnibotError> {
        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        );

        let resp = self
            .client
            .post(&url)
            .json(&self.build_request(texts))
            .send()
            .await
            .map_err(|e| UnibotError::Provider(format!("gemini request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(UnibotError::Provider(format!(
                "gemini returned {status}: {text}"
            )));
        }

        let parsed: GeminiBatchResponse = resp.json().await.map_err(|e| {
            UnibotError::Provider(format!("gemini: failed to parse embeddings: {e}"))
        })?;

        let vectors: Vec<Vec<f32>> = parsed.embeddings.into_iter().map(|e| e.values).collect();
        validate(&vectors, texts.len(), self.dimensions, "gemini")?;
        Ok(vectors)
    }
}

#[derive(Serialize)]
struct GeminiBatchRequest {
    requests: Vec<GeminiEmbedRequest>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiEmbedRequest {
    model: String,
    content: GeminiContent,
    output_dimensionality: usize,
}

#[derive(Deserialize)]
struct GeminiBatchResponse {
    #[serde(default)]
    embeddings: Vec<GeminiEmbedding>,
}

#[derive(Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn name(&self) -> &str {
        "gemini"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UnibotError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("gemini: embedding {} texts with {}", texts.len(), self.model);
        with_retries("gemini", self.max_retries, || self.request(texts)).await
    }
}
