// SPDX-License-Identifier: Apache-2.0

//! Embedding Client (§4.5): the capability interface for turning a batch of
//! chunk texts into fixed-dimension vectors, plus the two implementations
//! chosen at process start — a deterministic local embedder for tests and
//! offline use, and an HTTP-backed embedder for real providers.

mod hash_embedder;
mod http_embedder;

pub use hash_embedder::HashEmbedder;
pub use http_embedder::HttpEmbedder;

use async_trait::async_trait;

use crate::error::CoreResult;

/// A capability interface chosen once at process start (§9: "capability
/// interfaces, not hot-swappable"). Implementations must be deterministic
/// for identical input batches within a single process lifetime and must
/// always return vectors of `dimension()` length.
#[async_trait]
pub trait Embedder: Send + Sync {
	/// Human-readable name, surfaced in collection metadata and diagnostics.
	fn name(&self) -> &str;

	/// Fixed output dimension this embedder always produces.
	fn dimension(&self) -> usize;

	/// Embed a batch of texts, preserving order: `result[i]` corresponds to
	/// `texts[i]`. An empty batch returns an empty vector without making a
	/// request.
	async fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>>;

	/// Cheap readiness probe used before starting a run (§4.8 step 1).
	async fn available(&self) -> bool {
		true
	}
}
