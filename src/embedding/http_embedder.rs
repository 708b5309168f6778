// SPDX-License-Identifier: Apache-2.0

//! HTTP-backed embedder speaking the OpenAI/Jina/Voyage-shaped embeddings
//! API: `POST {endpoint}` with `{"input": [...], "model": ...}`, response
//! `{"data": [{"embedding": [...]}, ...]}`. One concrete provider covers all
//! three since they share this wire shape; only the endpoint, auth header
//! and model string vary.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::embedding::Embedder;
use crate::error::CoreError;
use crate::error::CoreResult;

pub struct HttpEmbedder {
	client: Client,
	endpoint: String,
	api_key: String,
	model: String,
	dimension: usize,
}

impl HttpEmbedder {
	pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
		Self {
			client: Client::new(),
			endpoint: endpoint.into(),
			api_key: api_key.into(),
			model: model.into(),
			dimension,
		}
	}
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
	data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
	embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
	fn name(&self) -> &str {
		&self.model
	}

	fn dimension(&self) -> usize {
		self.dimension
	}

	async fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let response = self
			.client
			.post(&self.endpoint)
			.header("Authorization", format!("Bearer {}", self.api_key))
			.json(&json!({
				"input": texts,
				"model": self.model,
			}))
			.send()
			.await
			.map_err(|e| CoreError::Embed(format!("request to {} failed: {e}", self.endpoint)))?;

		if !response.status().is_success() {
			let status = response.status();
			let body = response.text().await.unwrap_or_default();
			return Err(CoreError::Embed(format!("{} returned {status}: {body}", self.endpoint)));
		}

		let parsed: EmbeddingsResponse = response
			.json()
			.await
			.map_err(|e| CoreError::Embed(format!("malformed embeddings response: {e}")))?;

		if parsed.data.len() != texts.len() {
			return Err(CoreError::Embed(format!(
				"expected {} embeddings, got {}",
				texts.len(),
				parsed.data.len()
			)));
		}

		for datum in &parsed.data {
			if datum.embedding.len() != self.dimension {
				return Err(CoreError::DimensionMismatch {
					collection: self.model.clone(),
					existing: self.dimension,
					requested: datum.embedding.len(),
				});
			}
		}

		Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
	}

	async fn available(&self) -> bool {
		!self.api_key.is_empty()
	}
}
